//! User-facing notifications emitted during a submission.
//!
//! The submission flow only produces [`Notification`]s; where they end up is
//! the [`Notifier`]'s business. [`LogNotifier`] writes them as log events,
//! [`ChannelNotifier`] hands them to another task.

use tokio::sync::mpsc;

use crate::blockchain::types::TxId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: Option<NotificationKind>,
    pub txid: Option<TxId>,
}

impl Notification {
    /// A message with no kind.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            txid: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(NotificationKind::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(NotificationKind::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(NotificationKind::Error)
    }

    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_txid(mut self, txid: TxId) -> Self {
        self.txid = Some(txid);
        self
    }
}

/// Sink for notifications. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        let txid = notification
            .txid
            .map(|txid| txid.to_string())
            .unwrap_or_default();
        match notification.kind {
            Some(NotificationKind::Error) => {
                tracing::error!(txid = %txid, "{}", notification.message)
            }
            Some(NotificationKind::Success) => {
                tracing::info!(txid = %txid, kind = "success", "{}", notification.message)
            }
            _ => tracing::info!(txid = %txid, "{}", notification.message),
        }
    }
}

/// Forwards notifications over an unbounded channel.
///
/// Notifications sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}
