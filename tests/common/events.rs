//! Event payload builders
//!
//! JSON bodies shaped the way the main backend posts them to the intake
//! endpoint. Every builder reports the shared test username for the actor.

use super::constants::SENDER_USERNAME;
use serde_json::{json, Value};

fn actor(id: usize) -> Value {
    json!({ "id": id, "username": SENDER_USERNAME })
}

pub fn post_liked(actor_id: usize, post_id: i64, post_owner_id: usize) -> Value {
    json!({
        "kind": "post_liked",
        "actor": actor(actor_id),
        "post_id": post_id,
        "post_owner_id": post_owner_id,
    })
}

pub fn comment_liked(
    actor_id: usize,
    post_id: i64,
    comment_id: i64,
    comment_owner_id: usize,
) -> Value {
    json!({
        "kind": "comment_liked",
        "actor": actor(actor_id),
        "post_id": post_id,
        "comment_id": comment_id,
        "comment_owner_id": comment_owner_id,
    })
}

pub fn comment_created(
    actor_id: usize,
    post_id: i64,
    comment_id: i64,
    post_owner_id: usize,
) -> Value {
    json!({
        "kind": "comment_created",
        "actor": actor(actor_id),
        "post_id": post_id,
        "comment_id": comment_id,
        "post_owner_id": post_owner_id,
    })
}

pub fn comment_reply(
    actor_id: usize,
    post_id: i64,
    comment_id: i64,
    post_owner_id: usize,
    parent_comment_id: i64,
    parent_owner_id: usize,
) -> Value {
    json!({
        "kind": "comment_created",
        "actor": actor(actor_id),
        "post_id": post_id,
        "comment_id": comment_id,
        "post_owner_id": post_owner_id,
        "reply_to": { "comment_id": parent_comment_id, "owner_id": parent_owner_id },
    })
}

pub fn comment_with_mentions(
    actor_id: usize,
    post_id: i64,
    comment_id: i64,
    post_owner_id: usize,
    mentioned_user_ids: &[usize],
) -> Value {
    json!({
        "kind": "comment_created",
        "actor": actor(actor_id),
        "post_id": post_id,
        "comment_id": comment_id,
        "post_owner_id": post_owner_id,
        "mentioned_user_ids": mentioned_user_ids,
    })
}

pub fn post_collected(actor_id: usize, post_id: i64, post_owner_id: usize) -> Value {
    json!({
        "kind": "post_collected",
        "actor": actor(actor_id),
        "post_id": post_id,
        "post_owner_id": post_owner_id,
    })
}

pub fn user_followed(actor_id: usize, followed_id: usize) -> Value {
    json!({
        "kind": "user_followed",
        "actor": actor(actor_id),
        "followed_id": followed_id,
    })
}
