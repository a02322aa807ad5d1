//! Domain events accepted from the application backend

use serde::{Deserialize, Serialize};

use crate::notifications::NotificationKind;

/// The user whose action produced an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: usize,
    pub username: String,
}

/// The comment a new comment replies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTarget {
    pub comment_id: i64,
    pub owner_id: usize,
}

/// Events the backend reports, tagged by their `kind` field on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    PostLiked {
        actor: Actor,
        post_id: i64,
        post_owner_id: usize,
    },
    CommentLiked {
        actor: Actor,
        post_id: i64,
        comment_id: i64,
        comment_owner_id: usize,
    },
    CommentCreated {
        actor: Actor,
        post_id: i64,
        comment_id: i64,
        post_owner_id: usize,
        #[serde(default)]
        reply_to: Option<ReplyTarget>,
        #[serde(default)]
        mentioned_user_ids: Vec<usize>,
    },
    PostCollected {
        actor: Actor,
        post_id: i64,
        post_owner_id: usize,
    },
    UserFollowed {
        actor: Actor,
        followed_id: usize,
    },
}

/// One notification an event asks for, before suppression and dedup are
/// applied.
#[derive(Clone, Debug)]
pub(crate) struct NotificationDraft {
    pub recipient_id: usize,
    pub kind: NotificationKind,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub message: String,
}

impl DomainEvent {
    pub fn actor(&self) -> &Actor {
        match self {
            DomainEvent::PostLiked { actor, .. }
            | DomainEvent::CommentLiked { actor, .. }
            | DomainEvent::CommentCreated { actor, .. }
            | DomainEvent::PostCollected { actor, .. }
            | DomainEvent::UserFollowed { actor, .. } => actor,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            DomainEvent::PostLiked { .. } => "post_liked",
            DomainEvent::CommentLiked { .. } => "comment_liked",
            DomainEvent::CommentCreated { .. } => "comment_created",
            DomainEvent::PostCollected { .. } => "post_collected",
            DomainEvent::UserFollowed { .. } => "user_followed",
        }
    }

    /// The notifications this event asks for. A reply notifies the parent
    /// comment's owner instead of the post owner, mentions always notify on
    /// top of that.
    pub(crate) fn drafts(&self) -> Vec<NotificationDraft> {
        match self {
            DomainEvent::PostLiked {
                actor,
                post_id,
                post_owner_id,
            } => vec![NotificationDraft {
                recipient_id: *post_owner_id,
                kind: NotificationKind::LikePost,
                post_id: Some(*post_id),
                comment_id: None,
                message: format!("{} liked your post", actor.username),
            }],
            DomainEvent::CommentLiked {
                actor,
                post_id,
                comment_id,
                comment_owner_id,
            } => vec![NotificationDraft {
                recipient_id: *comment_owner_id,
                kind: NotificationKind::LikeComment,
                post_id: Some(*post_id),
                comment_id: Some(*comment_id),
                message: format!("{} liked your comment", actor.username),
            }],
            DomainEvent::CommentCreated {
                actor,
                post_id,
                comment_id,
                post_owner_id,
                reply_to,
                mentioned_user_ids,
            } => {
                let mut drafts = Vec::new();
                match reply_to {
                    Some(target) => drafts.push(NotificationDraft {
                        recipient_id: target.owner_id,
                        kind: NotificationKind::Reply,
                        post_id: Some(*post_id),
                        comment_id: Some(*comment_id),
                        message: format!("{} replied to your comment", actor.username),
                    }),
                    None => drafts.push(NotificationDraft {
                        recipient_id: *post_owner_id,
                        kind: NotificationKind::Comment,
                        post_id: Some(*post_id),
                        comment_id: Some(*comment_id),
                        message: format!("{} commented on your post", actor.username),
                    }),
                }
                for user_id in mentioned_user_ids {
                    drafts.push(NotificationDraft {
                        recipient_id: *user_id,
                        kind: NotificationKind::Mention,
                        post_id: Some(*post_id),
                        comment_id: Some(*comment_id),
                        message: format!("{} mentioned you in a comment", actor.username),
                    });
                }
                drafts
            }
            DomainEvent::PostCollected {
                actor,
                post_id,
                post_owner_id,
            } => vec![NotificationDraft {
                recipient_id: *post_owner_id,
                kind: NotificationKind::Collect,
                post_id: Some(*post_id),
                comment_id: None,
                message: format!("{} collected your post", actor.username),
            }],
            DomainEvent::UserFollowed { actor, followed_id } => vec![NotificationDraft {
                recipient_id: *followed_id,
                kind: NotificationKind::Follow,
                post_id: None,
                comment_id: None,
                message: format!("{} started following you", actor.username),
            }],
        }
    }
}
