//! User-facing notifications for status transitions.
//!
//! The client core only decides *when* a notification fires; delivery is
//! behind the [`Notifier`] trait so a mobile shell, a desktop toast
//! daemon, or a test recorder can plug in.

use std::sync::Mutex;

use tracing::info;

/// Sink for queued notifications.
pub trait Notifier: Send + Sync {
    /// Queue one notification.
    fn notify(&self, title: &str, body: &str);
}

/// Default sink: writes notifications to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(title, body, "notification");
    }
}

/// Records notifications for assertions in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    /// Fresh recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(title, body)` pairs queued so far, oldest first.
    pub fn events(&self) -> Vec<(String, String)> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.events
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}
