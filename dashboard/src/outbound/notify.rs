//! Notification sinks.
//!
//! [`TracingNotifier`] writes each notice as a structured log line, which is
//! what the reporting binary uses. [`ChannelNotifier`] fans notices out to
//! any number of subscribers, e.g. a UI layer rendering toasts.

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::ports::{Notice, NoticeLevel, Notifier};

/// Notifier that emits every notice through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(notice = %notice.message, "success"),
            NoticeLevel::Error => warn!(notice = %notice.message, "error"),
        }
    }
}

/// Notifier that broadcasts notices to subscribers.
///
/// Slow subscribers lose the oldest notices once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: broadcast::Sender<Notice>,
}

impl ChannelNotifier {
    /// Create a notifier and its first subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<Notice>) {
        let (sender, receiver) = broadcast::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Attach another subscriber; it sees notices sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if let Err(error) = self.sender.send(notice) {
            debug!(notice = %error.0.message, "no notice subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn every_subscriber_receives_notices_in_order() {
        let (notifier, mut first) = ChannelNotifier::new(8);
        let mut second = notifier.subscribe();

        notifier.notify(Notice::success("Expense added successfully"));
        notifier.notify(Notice::error("Failed to fetch events"));

        for receiver in [&mut first, &mut second] {
            let a = receiver.recv().await.expect("first notice");
            let b = receiver.recv().await.expect("second notice");
            assert_eq!(a, Notice::success("Expense added successfully"));
            assert_eq!(b.level, NoticeLevel::Error);
        }
    }

    #[rstest]
    fn sending_without_subscribers_is_silent() {
        let (notifier, receiver) = ChannelNotifier::new(1);
        drop(receiver);
        notifier.notify(Notice::error("nobody listening"));
    }

    #[rstest]
    fn tracing_notifier_accepts_both_levels() {
        TracingNotifier.notify(Notice::success("ok"));
        TracingNotifier.notify(Notice::error("failed"));
    }
}
