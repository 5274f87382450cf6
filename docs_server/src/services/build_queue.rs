//! Enqueue/complete contract between the orchestrator and the build workers.
//!
//! Jobs flow one way over the build channel; terminal outcomes flow back
//! over the completion channel. Enqueue is at-least-once per creation and
//! per retry; workers tolerate duplicates by skipping revisions that are no
//! longer pending.

use tokio::sync::mpsc;

/// A request to generate documentation for one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    pub revision_id: i64,
}

/// Terminal outcome of one build attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failure {
        code: String,
        description: Option<String>,
    },
}

/// Worker → orchestrator completion message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub revision_id: i64,
    pub outcome: BuildOutcome,
}

pub type ReportSender = mpsc::UnboundedSender<BuildReport>;
pub type ReportReceiver = mpsc::UnboundedReceiver<BuildReport>;

/// Sending half of the build channel, held by the orchestrator.
#[derive(Clone)]
pub struct BuildQueue {
    tx: mpsc::UnboundedSender<BuildJob>,
}

impl BuildQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BuildJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Place a job on the queue. Failure means the worker pool is gone,
    /// which only happens during shutdown; the job is logged and dropped.
    pub fn enqueue(&self, revision_id: i64) {
        if self.tx.send(BuildJob { revision_id }).is_err() {
            tracing::error!(revision_id, "Build queue closed, dropping job");
        }
    }
}

/// Create the completion channel.
pub fn completion_channel() -> (ReportSender, ReportReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_places_exactly_one_job() {
        let (queue, mut rx) = BuildQueue::new();
        queue.enqueue(5);
        assert_eq!(rx.recv().await, Some(BuildJob { revision_id: 5 }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn each_enqueue_is_a_distinct_job() {
        let (queue, mut rx) = BuildQueue::new();
        queue.enqueue(1);
        queue.enqueue(1);
        assert_eq!(rx.recv().await, Some(BuildJob { revision_id: 1 }));
        assert_eq!(rx.recv().await, Some(BuildJob { revision_id: 1 }));
    }

    #[tokio::test]
    async fn reports_round_trip_the_completion_channel() {
        let (tx, mut rx) = completion_channel();
        tx.send(BuildReport {
            revision_id: 9,
            outcome: BuildOutcome::Failure {
                code: "build_failed".into(),
                description: Some("exit status 1".into()),
            },
        })
        .unwrap();

        let report = rx.recv().await.unwrap();
        assert_eq!(report.revision_id, 9);
        assert!(matches!(report.outcome, BuildOutcome::Failure { .. }));
    }

    #[tokio::test]
    async fn enqueue_after_receiver_drop_does_not_panic() {
        let (queue, rx) = BuildQueue::new();
        drop(rx);
        queue.enqueue(3);
    }
}
