use serde::Deserialize;
use uuid::Uuid;

use crate::models::{NotificationKind, Position, VoteKind};

// -- Notifications --

/// Request to admit a notification. `kind` and `position` fall back to their
/// defaults when omitted; `duration_ms` is kept signed so an out-of-range
/// value is rejected by the center instead of silently coerced.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmitRequest {
    #[serde(default)]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub position: Position,
}

// -- Comments --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostCommentRequest {
    pub text: String,
    pub author: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostReplyRequest {
    pub parent_id: Uuid,
    pub text: String,
    pub author: String,
}

// -- Votes --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleVoteRequest {
    pub comment_id: Uuid,
    pub voter_id: Uuid,
    pub kind: VoteKind,
}
