//! Notification data models

use serde::{Deserialize, Serialize};

/// Notification type enum, stored as its snake_case string
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LikePost,
    LikeComment,
    Comment,
    Reply,
    Mention,
    Collect,
    Follow,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::LikePost => "like_post",
            NotificationKind::LikeComment => "like_comment",
            NotificationKind::Comment => "comment",
            NotificationKind::Reply => "reply",
            NotificationKind::Mention => "mention",
            NotificationKind::Collect => "collect",
            NotificationKind::Follow => "follow",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like_post" => Some(NotificationKind::LikePost),
            "like_comment" => Some(NotificationKind::LikeComment),
            "comment" => Some(NotificationKind::Comment),
            "reply" => Some(NotificationKind::Reply),
            "mention" => Some(NotificationKind::Mention),
            "collect" => Some(NotificationKind::Collect),
            "follow" => Some(NotificationKind::Follow),
            _ => None,
        }
    }

    /// Title shown on the push banner for this kind of notification.
    pub fn push_title(&self) -> &'static str {
        match self {
            NotificationKind::LikePost | NotificationKind::LikeComment => "New Like",
            NotificationKind::Comment => "New Comment",
            NotificationKind::Reply => "New Reply",
            NotificationKind::Mention => "New Mention",
            NotificationKind::Collect => "New Collection",
            NotificationKind::Follow => "New Follower",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored notification, as returned to the owning recipient
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub recipient_id: usize,
    pub sender_id: usize,
    pub kind: NotificationKind,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub message: String,
    pub is_read: bool,
    pub created_at: i64,
}

/// A notification candidate, before persistence assigns it an id and a
/// creation timestamp
#[derive(Clone, Debug)]
pub struct NewNotification {
    pub recipient_id: usize,
    pub sender_id: usize,
    pub kind: NotificationKind,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub message: String,
}

/// Which notifications a mark-read request targets
#[derive(Clone, Copy, Debug)]
pub enum MarkReadSelection<'a> {
    All,
    Ids(&'a [i64]),
}
