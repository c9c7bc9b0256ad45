use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

use murmur_types::api::EmitRequest;
use murmur_types::events::{CenterEvent, RetireReason};
use murmur_types::models::{Notification, Position};

/// Capacity of the event stream. A lagged renderer skips to the tail and
/// resynchronizes from `snapshot`.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq)]
pub enum NotifyError {
    #[error("duration_ms must be non-negative, got {0}")]
    InvalidDuration(i64),
}

struct LiveEntry {
    notification: Notification,
    /// Admission sequence number, used to keep snapshots in admission order.
    seq: u64,
    /// Abort handle for the pending auto-dismiss task, if any. At most one
    /// timer exists per notification; dismissal aborts it under the same
    /// write guard that removes the entry.
    timer: Option<AbortHandle>,
}

/// Owns the set of currently visible notifications and broadcasts
/// admissions/retirements to subscribed renderers.
///
/// Cheap to clone; all clones share the same live set. The embedding
/// application constructs one per session and passes it down explicitly.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<CenterInner>,
}

struct CenterInner {
    live: RwLock<HashMap<Uuid, LiveEntry>>,
    events: broadcast::Sender<CenterEvent>,
    next_seq: AtomicU64,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(CenterInner {
                live: RwLock::new(HashMap::new()),
                events,
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Admit a notification. Validates the request, appends to the live set,
    /// publishes `Admitted`, and schedules exactly one auto-dismiss task if a
    /// duration is present. A zero duration still goes through the full
    /// admit-then-retire sequence.
    ///
    /// Returns the admitted notification; callers can pre-emptively dismiss
    /// it by id.
    pub async fn emit(&self, req: EmitRequest) -> Result<Notification, NotifyError> {
        let duration = match req.duration_ms {
            Some(ms) if ms < 0 => return Err(NotifyError::InvalidDuration(ms)),
            Some(ms) => Some(Duration::from_millis(ms as u64)),
            None => None,
        };

        let notification = Notification {
            id: Uuid::new_v4(),
            kind: req.kind,
            title: req.title,
            message: req.message,
            duration_ms: duration.map(|d| d.as_millis() as u64),
            position: req.position,
            created_at: Utc::now(),
        };
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);

        // The entry is inserted and `Admitted` published under the write
        // guard, so the timer task (which needs the same guard to retire)
        // cannot observe or report the notification before admission.
        let mut live = self.inner.live.write().await;
        let timer = duration.map(|after| {
            let center = self.clone();
            let id = notification.id;
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                center.expire(id).await;
            })
            .abort_handle()
        });
        live.insert(
            notification.id,
            LiveEntry {
                notification: notification.clone(),
                seq,
                timer,
            },
        );
        let _ = self.inner.events.send(CenterEvent::Admitted {
            notification: notification.clone(),
        });
        drop(live);

        debug!(id = %notification.id, kind = ?notification.kind, "notification admitted");
        Ok(notification)
    }

    /// Dismiss a notification by id, cancelling its pending timer. Returns
    /// whether anything was removed; an absent id is a no-op, which covers
    /// the race between a firing timer and a manual close.
    pub async fn dismiss(&self, id: Uuid) -> bool {
        let mut live = self.inner.live.write().await;
        match live.remove(&id) {
            Some(entry) => {
                if let Some(timer) = entry.timer {
                    timer.abort();
                }
                let _ = self.inner.events.send(CenterEvent::Retired {
                    id,
                    reason: RetireReason::Dismissed,
                });
                drop(live);
                debug!(%id, "notification dismissed");
                true
            }
            None => false,
        }
    }

    /// Timer path: retire an expired notification. Removal is idempotent, so
    /// a timer that lost the race against `dismiss` finds nothing and
    /// publishes nothing.
    async fn expire(&self, id: Uuid) {
        let mut live = self.inner.live.write().await;
        if live.remove(&id).is_some() {
            let _ = self.inner.events.send(CenterEvent::Retired {
                id,
                reason: RetireReason::Expired,
            });
            drop(live);
            debug!(%id, "notification expired");
        }
    }

    /// Live notifications in admission order, as read-only copies.
    pub async fn snapshot(&self) -> Vec<Notification> {
        let live = self.inner.live.read().await;
        let mut entries: Vec<_> = live
            .values()
            .map(|e| (e.seq, e.notification.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, n)| n).collect()
    }

    /// Live notifications for one render bucket, in admission order.
    pub async fn bucket(&self, position: Position) -> Vec<Notification> {
        let live = self.inner.live.read().await;
        let mut entries: Vec<_> = live
            .values()
            .filter(|e| e.notification.position == position)
            .map(|e| (e.seq, e.notification.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, n)| n).collect()
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.inner.live.read().await.contains_key(&id)
    }

    /// Subscribe to admission/retirement events. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<CenterEvent> {
        self.inner.events.subscribe()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}
