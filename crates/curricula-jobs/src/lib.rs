//! # curricula-jobs
//!
//! Background notification delivery.
//!
//! API handlers enqueue notification jobs without blocking on the
//! database write; a single worker task drains the queue and persists
//! rows through a [`curricula_core::NotificationSink`].

pub mod queue;
pub mod worker;

pub use queue::{channel, NotificationJob, NotificationQueue};
pub use worker::{NotificationWorker, WorkerHandle};
