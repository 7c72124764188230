//! In-process notification queue.
//!
//! Producers (API handlers) enqueue without awaiting delivery; the
//! worker drains the channel and persists rows. A full queue drops the
//! job with a warning rather than backpressuring the request path.

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One queued notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationJob {
    pub user_id: i64,
    pub message: String,
}

/// Producer handle. Cheap to clone; one per app state.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<NotificationJob>,
}

/// Create a bounded queue, returning the producer handle and the
/// receiver the worker drains.
pub fn channel(capacity: usize) -> (NotificationQueue, mpsc::Receiver<NotificationJob>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (NotificationQueue { sender }, receiver)
}

impl NotificationQueue {
    /// Fire-and-forget enqueue. Never blocks and never fails the caller.
    pub fn enqueue(&self, user_id: i64, message: impl Into<String>) {
        let job = NotificationJob {
            user_id,
            message: message.into(),
        };
        match self.sender.try_send(job) {
            Ok(()) => {
                debug!(
                    subsystem = "jobs",
                    component = "queue",
                    op = "enqueue",
                    user_id,
                    "Notification enqueued"
                );
            }
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(
                    subsystem = "jobs",
                    component = "queue",
                    user_id = job.user_id,
                    "Notification queue full, dropping job"
                );
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(
                    subsystem = "jobs",
                    component = "queue",
                    user_id = job.user_id,
                    "Notification worker gone, dropping job"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_delivers_to_receiver() {
        let (queue, mut rx) = channel(4);
        queue.enqueue(7, "hello");

        let job = rx.recv().await.unwrap();
        assert_eq!(job.user_id, 7);
        assert_eq!(job.message, "hello");
    }

    #[tokio::test]
    async fn test_enqueue_on_full_queue_drops_silently() {
        let (queue, mut rx) = channel(1);
        queue.enqueue(1, "first");
        queue.enqueue(2, "second");

        assert_eq!(rx.recv().await.unwrap().user_id, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_enqueue_after_receiver_dropped_does_not_panic() {
        let (queue, rx) = channel(1);
        drop(rx);
        queue.enqueue(1, "into the void");
    }
}
