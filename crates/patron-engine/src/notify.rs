//! Notifier implementations.
//!
//! The engine only depends on the fire-and-forget
//! [`Notifier`](patron_core::traits::Notifier) trait; the host application
//! bridges to push/email delivery. [`ChannelNotifier`] hands notifications
//! to an unbounded channel so a delivery worker can drain them without
//! ever blocking a submission. [`NullNotifier`] discards everything.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use patron_core::traits::Notifier;

/// An outbound notification request.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    /// Recipient user.
    pub user: Uuid,
    /// Short title line.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Structured payload for the client.
    pub data: Value,
}

/// Notifier that forwards requests to an unbounded channel.
///
/// Sending never blocks. If the receiving side is gone the notification
/// is dropped with a warning — delivery failure must never affect the
/// review transaction.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver a delivery worker drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify_user(&self, user: Uuid, title: &str, body: &str, data: Value) {
        let notification = Notification {
            user,
            title: title.to_string(),
            body: body.to_string(),
            data,
        };
        if self.tx.send(notification).is_err() {
            warn!(%user, title, "notify: receiver gone, notification dropped");
        } else {
            debug!(%user, title, "notify: queued");
        }
    }
}

/// Notifier that silently discards everything. Useful in tests and batch
/// tooling.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify_user(&self, _user: Uuid, _title: &str, _body: &str, _data: Value) {}
}
