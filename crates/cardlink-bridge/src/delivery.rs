//! Designated delivery context.
//!
//! Command completions may fire on any thread. Before a result reaches the
//! caller it is posted here and executed by a single tokio task, in posting
//! order, so caller-visible completions never run concurrently.
//!
//! ```text
//! worker thread A ──post──┐
//! worker thread B ──post──┼──► unbounded queue ──► delivery task ──► caller
//! bridge (sync)   ──post──┘
//! ```
//!
//! The task ends once every [`DeliveryContext`] clone is dropped. Posting
//! after that point runs the job inline on the posting thread.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Sender side of the delivery queue.
#[derive(Debug, Clone)]
pub struct DeliveryContext {
    tx: mpsc::UnboundedSender<Job>,
}

impl DeliveryContext {
    /// Spawn the delivery task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let task = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
            debug!("Delivery context closed");
        });

        (Self { tx }, task)
    }

    /// Queue `job` for execution on the delivery task.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) {
        if let Err(mpsc::error::SendError(job)) = self.tx.send(Box::new(job)) {
            trace!("Delivery task gone, running job inline");
            job();
        }
    }

    /// Whether the delivery task is still accepting jobs.
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_jobs_run_in_posting_order() {
        let (delivery, _task) = DeliveryContext::spawn();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..20 {
            let seen = Arc::clone(&seen);
            delivery.post(move || seen.lock().unwrap().push(i));
        }

        let (tx, rx) = oneshot::channel();
        delivery.post(move || tx.send(()).unwrap());
        rx.await.unwrap();

        assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_post_from_foreign_thread() {
        let (delivery, _task) = DeliveryContext::spawn();
        let (tx, rx) = oneshot::channel();

        let poster = delivery.clone();
        std::thread::spawn(move || poster.post(move || tx.send(7).unwrap()))
            .join()
            .unwrap();

        assert_eq!(rx.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_post_after_shutdown_runs_inline() {
        let (delivery, task) = DeliveryContext::spawn();
        task.abort();
        let _ = task.await;
        assert!(!delivery.is_running());

        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        delivery.post(move || *flag.lock().unwrap() = true);

        assert!(*ran.lock().unwrap());
    }
}
