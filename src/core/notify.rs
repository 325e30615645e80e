//! User-facing notifications.
//!
//! The launcher has one notification surface: a single slot holding the
//! current message. Publishing replaces whatever was there.

use std::sync::Mutex;

use log::info;

/// Anything that can surface a message to the user.
pub trait Notifier: Send + Sync {
    fn publish(&self, message: String);
}

/// Single current-notification slot, last write wins.
#[derive(Debug, Default)]
pub struct NotificationSlot {
    current: Mutex<Option<String>>,
}

impl NotificationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The message currently shown, if any.
    pub fn current(&self) -> Option<String> {
        self.current.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Consume the current message, leaving the slot empty.
    pub fn take(&self) -> Option<String> {
        self.current.lock().unwrap_or_else(|p| p.into_inner()).take()
    }
}

impl Notifier for NotificationSlot {
    fn publish(&self, message: String) {
        info!("Notification: {}", message);
        *self.current.lock().unwrap_or_else(|p| p.into_inner()) = Some(message);
    }
}
