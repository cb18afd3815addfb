use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::event::{BookingEvent, Notification, Severity};

/// Transient user-facing alerts (toasts in the web client).
pub trait Notifier: Send + Sync {
    fn notify(&self, booking_id: Uuid, title: &str, message: &str, severity: Severity);
}

/// Logs each notification and publishes it on the booking event stream.
pub struct EventNotifier {
    events_tx: broadcast::Sender<BookingEvent>,
}

impl EventNotifier {
    pub fn new(events_tx: broadcast::Sender<BookingEvent>) -> Self {
        Self { events_tx }
    }
}

impl Notifier for EventNotifier {
    fn notify(&self, booking_id: Uuid, title: &str, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!(booking_id = %booking_id, title, "notification"),
            Severity::Warning | Severity::Destructive => {
                warn!(booking_id = %booking_id, title, severity = severity.as_str(), "notification")
            }
        }

        let notification = Notification {
            title: title.to_string(),
            message: message.to_string(),
            severity,
            sent_at: Utc::now(),
        };
        let _ = self.events_tx.send(BookingEvent::Notification {
            booking_id,
            notification,
        });
    }
}
