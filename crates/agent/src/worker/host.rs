//! The host runtime seam: client control and notification display.

use offcache_core::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Icon shown with push notifications.
pub const NOTIFICATION_ICON: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMTkyIiBoZWlnaHQ9IjE5MiIgdmlld0JveD0iMCAwIDE5MiAxOTIiIGZpbGw9Im5vbmUiIHhtbG5zPSJodHRwOi8vd3d3LnczLm9yZy8yMDAwL3N2ZyI+CjxyZWN0IHdpZHRoPSIxOTIiIGhlaWdodD0iMTkyIiBmaWxsPSIjMGIwZjE0Ii8+Cjx0ZXh0IHg9IjUwJSIgeT0iNTAlIiBmb250LXNpemU9IjExMiIgZm9udC13ZWlnaHQ9ImJvbGQiIGZpbGw9IiNmMGE2MWYiIHRleHQtYW5jaG9yPSJtaWRkbGUiIGR5PSIuM2VtIj7igYrCsOKBkjwvdGV4dD4KPC9zdmc+";

/// Monochrome badge shown with push notifications.
pub const NOTIFICATION_BADGE: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iOTYiIGhlaWdodD0iOTYiIHZpZXdCb3g9IjAgMCA5NiA5NiIgZmlsbD0ibm9uZSIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj4KPGN0eWxlPmJhY2tncm91bmQtY29sb3I6IHdoaXRlOyB3aWR0aD0iOTYiIGhlaWdodD0iOTYiLz4KPHR0eHQgeD0iNDgiIHk9IjQ4IiBmb250LXNpemU9IjU0IiBmb250LXdlaWdodD0iYm9sZCIgZmlsbD0iIzBiMGYxNCIgdGV4dC1hbmNob3I9Im1pZGRsZSIgZHk9Ii4zZW0iPuKBisKw4oGSPC90ZXh0Pgo8L3N2Zz4=";

/// Body used when a push arrives without a payload.
pub const DEFAULT_NOTIFICATION_BODY: &str = "New notification";

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
}

impl Notification {
    /// Build the notification for a push payload.
    pub fn from_push(title: &str, payload: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            body: payload.unwrap_or(DEFAULT_NOTIFICATION_BODY).to_string(),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_BADGE.to_string(),
        }
    }
}

/// Operations the manager asks of the runtime hosting it.
#[async_trait::async_trait]
pub trait Host: Send + Sync {
    /// Become active without waiting for older instances to finish.
    async fn skip_waiting(&self);

    /// Take control of every open client page now.
    async fn claim_clients(&self);

    /// Display a notification to the user.
    async fn show_notification(&self, notification: &Notification) -> Result<(), Error>;
}

/// Snapshot of what a [`RecordingHost`] has been asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HostRecord {
    pub skip_waiting: bool,
    pub clients_claimed: bool,
    pub notifications: Vec<Notification>,
}

/// Host that records each request and logs it.
///
/// The stdio agent has no browser to drive, so client control and
/// notifications are surfaced to the caller through tool output and logs.
#[derive(Debug, Default)]
pub struct RecordingHost {
    record: RwLock<HostRecord>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self) -> HostRecord {
        self.record.read().await.clone()
    }
}

#[async_trait::async_trait]
impl Host for RecordingHost {
    async fn skip_waiting(&self) {
        tracing::info!("skip waiting requested");
        self.record.write().await.skip_waiting = true;
    }

    async fn claim_clients(&self) {
        tracing::info!("claiming open clients");
        self.record.write().await.clients_claimed = true;
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        tracing::info!(title = %notification.title, body = %notification.body, "showing notification");
        self.record.write().await.notifications.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_with_payload() {
        let n = Notification::from_push("Coffee Counter", Some("Time for a refill"));
        assert_eq!(n.title, "Coffee Counter");
        assert_eq!(n.body, "Time for a refill");
        assert!(n.icon.starts_with("data:image/svg+xml;base64,"));
        assert!(n.badge.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_notification_default_body() {
        let n = Notification::from_push("Coffee Counter", None);
        assert_eq!(n.body, "New notification");
    }

    #[tokio::test]
    async fn test_recording_host() {
        let host = RecordingHost::new();
        assert_eq!(host.record().await, HostRecord::default());

        host.skip_waiting().await;
        host.claim_clients().await;
        host.show_notification(&Notification::from_push("t", None)).await.unwrap();

        let record = host.record().await;
        assert!(record.skip_waiting);
        assert!(record.clients_claimed);
        assert_eq!(record.notifications.len(), 1);
    }
}
