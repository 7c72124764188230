//! Background worker draining the notification queue.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use curricula_core::NotificationSink;

use crate::queue::NotificationJob;

/// Worker that persists queued notifications through a sink.
///
/// Delivery failures are logged and the job is dropped; notifications
/// are best-effort and never retried.
pub struct NotificationWorker {
    receiver: mpsc::Receiver<NotificationJob>,
    sink: Arc<dyn NotificationSink>,
    shutdown: watch::Receiver<bool>,
}

/// Handle to a spawned worker.
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal shutdown and wait for the worker to drain in-flight work.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            warn!(
                subsystem = "jobs",
                component = "worker",
                error_msg = %e,
                "Notification worker task panicked"
            );
        }
    }
}

impl NotificationWorker {
    pub fn new(
        receiver: mpsc::Receiver<NotificationJob>,
        sink: Arc<dyn NotificationSink>,
    ) -> (Self, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                receiver,
                sink,
                shutdown: rx,
            },
            tx,
        )
    }

    /// Spawn the worker onto the runtime.
    pub fn spawn(
        receiver: mpsc::Receiver<NotificationJob>,
        sink: Arc<dyn NotificationSink>,
    ) -> WorkerHandle {
        let (worker, shutdown) = Self::new(receiver, sink);
        let join = tokio::spawn(worker.run());
        WorkerHandle { shutdown, join }
    }

    /// Drain the queue until shutdown is signalled and the channel is
    /// empty, or every producer is dropped.
    pub async fn run(mut self) {
        info!(
            subsystem = "jobs",
            component = "worker",
            op = "start",
            "Notification worker started"
        );

        loop {
            tokio::select! {
                job = self.receiver.recv() => {
                    match job {
                        Some(job) => self.process(job).await,
                        None => break,
                    }
                }
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        // Drain whatever is already queued before exiting.
                        while let Ok(job) = self.receiver.try_recv() {
                            self.process(job).await;
                        }
                        break;
                    }
                }
            }
        }

        info!(
            subsystem = "jobs",
            component = "worker",
            op = "stop",
            "Notification worker stopped"
        );
    }

    async fn process(&self, job: NotificationJob) {
        match self.sink.deliver(job.user_id, &job.message).await {
            Ok(notification_id) => {
                info!(
                    subsystem = "jobs",
                    component = "worker",
                    op = "deliver",
                    user_id = job.user_id,
                    notification_id,
                    "Notification delivered"
                );
            }
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "worker",
                    user_id = job.user_id,
                    error_msg = %e,
                    "Notification delivery failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;
    use async_trait::async_trait;
    use curricula_core::Result;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, user_id: i64, message: &str) -> Result<i64> {
            let mut delivered = self.delivered.lock().unwrap();
            delivered.push((user_id, message.to_string()));
            Ok(delivered.len() as i64)
        }
    }

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn deliver(&self, _user_id: i64, _message: &str) -> Result<i64> {
            Err(curricula_core::Error::Internal("sink down".into()))
        }
    }

    #[tokio::test]
    async fn test_worker_delivers_queued_jobs() {
        let sink = Arc::new(RecordingSink::default());
        let (producer, receiver) = queue::channel(8);
        let handle = NotificationWorker::spawn(receiver, sink.clone());

        producer.enqueue(1, "first");
        producer.enqueue(2, "second");
        drop(producer);

        handle.shutdown().await;

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(
            *delivered,
            vec![(1, "first".to_string()), (2, "second".to_string())]
        );
    }

    #[tokio::test]
    async fn test_worker_survives_sink_failures() {
        let (producer, receiver) = queue::channel(8);
        let handle = NotificationWorker::spawn(receiver, Arc::new(FailingSink));

        producer.enqueue(1, "doomed");
        drop(producer);

        // Must exit cleanly despite the failed delivery.
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_worker_exits_when_producers_drop() {
        let sink = Arc::new(RecordingSink::default());
        let (producer, receiver) = queue::channel(8);
        let (worker, _shutdown) = NotificationWorker::new(receiver, sink.clone());
        let join = tokio::spawn(worker.run());

        producer.enqueue(9, "last words");
        drop(producer);

        join.await.unwrap();
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }
}
