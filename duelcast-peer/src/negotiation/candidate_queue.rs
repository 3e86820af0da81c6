use crate::negotiation::CloseListener;
use duelcast_core::{ConnectionError, NetworkCandidate};
use std::collections::VecDeque;
use std::future::Future;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    pub failed: usize,
    /// Left unapplied because the connection closed mid-drain.
    pub dropped: usize,
}

/// Remote candidates that arrived before the remote description.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    entries: VecDeque<NetworkCandidate>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, candidate: NetworkCandidate) {
        self.entries.push_back(candidate);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies every buffered candidate in arrival order.
    ///
    /// A candidate that fails to apply is dropped and logged; the rest are
    /// still applied. Once `close` fires the remaining candidates are
    /// discarded without being attempted.
    pub async fn drain_into<F, Fut>(&mut self, close: &CloseListener, mut apply: F) -> DrainReport
    where
        F: FnMut(NetworkCandidate) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let mut report = DrainReport::default();

        while let Some(candidate) = self.entries.pop_front() {
            let outcome = tokio::select! {
                biased;
                _ = close.closed() => None,
                res = apply(candidate) => Some(res),
            };

            match outcome {
                Some(Ok(())) => report.applied += 1,
                Some(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        "{}",
                        ConnectionError::CandidateApplyFailed(format!("{e:#}"))
                    );
                }
                None => {
                    report.dropped = 1 + self.entries.len();
                    self.entries.clear();
                    debug!("Connection closed, {} queued candidates discarded", report.dropped);
                    break;
                }
            }
        }

        report
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
