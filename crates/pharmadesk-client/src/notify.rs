//! # Notifications
//!
//! Fire-and-forget toasts. Each toast stays up for the configured TTL
//! (4 s by default) unless closed early; several may be visible at once.
//!
//! ```text
//! notify(msg, Warning) ──► live list ──► ToastEvent::Shown ──► subscribers
//!                               │
//!                    TTL elapsed or dismiss(id)
//!                               │
//!                               ▼
//!                        ToastEvent::Dismissed
//! ```
//!
//! `active()` prunes expired toasts itself, so it is correct even when no
//! runtime is around to run the expiry timers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn title(&self) -> &'static str {
        match self {
            Severity::Success => "Success",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(Uuid);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A toast as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Toast {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToastEvent {
    Shown(Toast),
    Dismissed(String),
}

struct LiveToast {
    id: NotificationId,
    toast: Toast,
    expires_at: Instant,
}

struct Inner {
    ttl: Duration,
    live: Mutex<Vec<LiveToast>>,
    events: broadcast::Sender<ToastEvent>,
}

impl Inner {
    fn live(&self) -> std::sync::MutexGuard<'_, Vec<LiveToast>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: NotificationId) -> bool {
        let removed = {
            let mut live = self.live();
            let before = live.len();
            live.retain(|t| t.id != id);
            live.len() != before
        };
        if removed {
            let _ = self.events.send(ToastEvent::Dismissed(id.to_string()));
        }
        removed
    }
}

/// Toast queue shared by every component.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        NotificationCenter {
            inner: Arc::new(Inner {
                ttl,
                live: Mutex::new(Vec::new()),
                events,
            }),
        }
    }

    /// Shows a toast; it dismisses itself after the TTL.
    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> NotificationId {
        let id = NotificationId(Uuid::new_v4());
        let toast = Toast {
            id: id.to_string(),
            severity,
            title: severity.title().to_string(),
            message: message.into(),
        };
        debug!(severity = ?severity, message = %toast.message, "Toast");

        self.inner.live().push(LiveToast {
            id,
            toast: toast.clone(),
            expires_at: Instant::now() + self.inner.ttl,
        });
        let _ = self.inner.events.send(ToastEvent::Shown(toast));

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let weak: Weak<Inner> = Arc::downgrade(&self.inner);
            let ttl = self.inner.ttl;
            handle.spawn(async move {
                tokio::time::sleep(ttl).await;
                if let Some(inner) = weak.upgrade() {
                    inner.remove(id);
                }
            });
        }

        id
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Info)
    }

    /// Closes a toast early. Returns false if it was already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.inner.remove(id)
    }

    /// Toasts still within their TTL, oldest first.
    pub fn active(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut live = self.inner.live();
        live.retain(|t| t.expires_at > now);
        live.iter().map(|t| t.toast.clone()).collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.inner.events.subscribe()
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("ttl", &self.inner.ttl)
            .field("live", &self.inner.live().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_toasts_stack_and_expire() {
        let center = NotificationCenter::new(Duration::from_millis(4000));

        center.success("Medicine added successfully");
        tokio::time::advance(Duration::from_millis(1000)).await;
        center.warning("Maximum stock limit reached in cart");

        let active = center.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].title, "Success");
        assert_eq!(active[1].severity, Severity::Warning);

        tokio::time::advance(Duration::from_millis(3001)).await;
        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "Maximum stock limit reached in cart");

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(center.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_early() {
        let center = NotificationCenter::new(Duration::from_secs(4));
        let id = center.info("Syncing catalog");

        assert!(center.dismiss(id));
        assert!(center.active().is_empty());
        assert!(!center.dismiss(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_include_expiry() {
        let center = NotificationCenter::new(Duration::from_secs(4));
        let mut events = center.subscribe();

        let id = center.error("Billing Error: Something went wrong");
        match events.recv().await.unwrap() {
            ToastEvent::Shown(toast) => assert_eq!(toast.id, id.to_string()),
            other => panic!("unexpected event {:?}", other),
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            events.recv().await.unwrap(),
            ToastEvent::Dismissed(id.to_string())
        );
    }

    #[test]
    fn test_works_without_runtime() {
        let center = NotificationCenter::new(Duration::from_secs(4));
        center.info("offline");
        assert_eq!(center.active().len(), 1);
    }
}
