use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity/styling class of a notification. Closed set: anything else is
/// rejected at the serde boundary before it can reach the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

/// Screen bucket a notification renders into. Affects display only, never
/// lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
    TopCenter,
    BottomCenter,
}

impl Position {
    /// All render buckets, in the order the client lays them out.
    pub const ALL: [Position; 6] = [
        Position::TopRight,
        Position::TopLeft,
        Position::BottomRight,
        Position::BottomLeft,
        Position::TopCenter,
        Position::BottomCenter,
    ];
}

/// A transient user-facing message. Immutable once admitted; the center
/// retires it by timer or explicit dismissal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Auto-dismiss delay. `None` means the notification stays until
    /// manually dismissed.
    pub duration_ms: Option<u64>,
    pub position: Position,
    pub created_at: DateTime<Utc>,
}

/// A single comment and its nested replies. Reply order is insertion order,
/// depth is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<Comment>,
}

/// Direction of a vote on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Up,
    Down,
}

/// Aggregated votes for one comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub up: usize,
    pub down: usize,
}

impl VoteTally {
    pub fn score(&self) -> i64 {
        self.up as i64 - self.down as i64
    }
}

/// Signed-in identity supplied by the session tracker. The interaction core
/// treats the username as an opaque author string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
}
