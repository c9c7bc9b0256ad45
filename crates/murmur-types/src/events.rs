use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Notification;

/// Events published by the notification center. A renderer subscribes and
/// re-displays its position buckets as these arrive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CenterEvent {
    /// A notification entered the live set
    Admitted { notification: Notification },

    /// A notification left the live set
    Retired { id: Uuid, reason: RetireReason },
}

/// How a notification left the live set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetireReason {
    /// The auto-dismiss timer elapsed
    Expired,
    /// A caller dismissed it by id
    Dismissed,
}

impl CenterEvent {
    /// Returns the id of the notification this event concerns.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Admitted { notification } => notification.id,
            Self::Retired { id, .. } => *id,
        }
    }
}
