//! Concurrent batch onboarding pipeline.
//!
//! The coordinator splits a batch of registration requests into contiguous
//! sub-ranges, runs one worker per range, and fans tagged per-request
//! outcomes back in over a shared channel. Every submitted request yields
//! exactly one outcome, success or typed failure, regardless of worker
//! timing or an elapsed deadline.

use std::ops::Range;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::directory::UserDirectory;
use super::error::Error;
use super::user::{RegistrationRequest, UserSummary};

/// Coordinator configuration controlling fan-out width and the batch
/// deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRegistrationConfig {
    /// Number of concurrent workers; clamped to the batch size at dispatch.
    pub worker_count: usize,
    /// Overall batch deadline. `None` waits for every worker to finish.
    pub deadline: Option<Duration>,
}

impl Default for BatchRegistrationConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            deadline: None,
        }
    }
}

/// Tagged outcome for one submitted registration request.
#[derive(Debug)]
pub struct RegistrationOutcome {
    /// Position of the request in the submitted batch.
    pub index: usize,
    /// Email of the request, identifying the item on failure.
    pub email: String,
    /// Registered summary, or the typed failure for this item.
    pub result: Result<UserSummary, Error>,
}

impl RegistrationOutcome {
    fn cancelled(index: usize, email: String) -> Self {
        Self {
            index,
            email,
            result: Err(Error::Cancelled),
        }
    }
}

/// Fans a registration batch out across workers and merges their outcomes.
///
/// Output arrives in channel order, which across partitions depends on
/// relative worker speed; within one partition items complete in submission
/// order.
pub struct BatchRegistrationCoordinator {
    directory: UserDirectory,
    config: BatchRegistrationConfig,
}

impl BatchRegistrationCoordinator {
    /// Build a coordinator that registers through `directory`.
    pub fn new(directory: UserDirectory, config: BatchRegistrationConfig) -> Self {
        Self { directory, config }
    }

    /// Register every request in the batch concurrently.
    ///
    /// Returns exactly one [`RegistrationOutcome`] per submitted request, in
    /// arrival order. When the configured deadline elapses the remaining
    /// workers are cancelled and every not-yet-reported item comes back with
    /// [`Error::Cancelled`].
    pub async fn register_batch(
        &self,
        requests: Vec<RegistrationRequest>,
    ) -> Vec<RegistrationOutcome> {
        let total = requests.len();
        if total == 0 {
            return Vec::new();
        }

        let workers = self.config.worker_count.clamp(1, total);
        let ranges = partition_ranges(total, workers);
        debug!(total, workers, "dispatching registration batch");

        let emails: Vec<String> = requests.iter().map(|r| r.email().to_owned()).collect();
        let mut items: Vec<(usize, RegistrationRequest)> =
            requests.into_iter().enumerate().collect();

        let (outcomes_tx, mut outcomes_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        // Splitting off the tail first keeps each worker's chunk contiguous
        // and in submission order.
        for range in ranges.iter().rev() {
            let chunk = items.split_off(range.start);
            let worker = Worker {
                directory: self.directory.clone(),
                outcomes: outcomes_tx.clone(),
                cancel: cancel.clone(),
            };
            tokio::spawn(worker.run(chunk));
        }
        drop(outcomes_tx);

        let deadline = self.config.deadline.map(|limit| Instant::now() + limit);
        let mut outcomes = Vec::with_capacity(total);
        let mut reported = vec![false; total];
        while outcomes.len() < total {
            let received = match deadline {
                Some(at) => match timeout_at(at, outcomes_rx.recv()).await {
                    Ok(received) => received,
                    Err(_elapsed) => {
                        warn!(
                            collected = outcomes.len(),
                            total, "batch deadline elapsed; cancelling remaining workers"
                        );
                        cancel.cancel();
                        break;
                    }
                },
                None => outcomes_rx.recv().await,
            };
            let Some(outcome) = received else {
                // All senders gone before `total` outcomes arrived; the
                // remaining items are marked below.
                break;
            };
            if let Some(slot) = reported.get_mut(outcome.index) {
                if !*slot {
                    *slot = true;
                    outcomes.push(outcome);
                }
            }
        }

        // Cardinality: every submitted request yields an outcome even when
        // its worker never reported back.
        for (index, email) in emails.into_iter().enumerate() {
            if !reported.get(index).copied().unwrap_or(true) {
                outcomes.push(RegistrationOutcome::cancelled(index, email));
            }
        }
        outcomes
    }
}

/// Contiguous, disjoint sub-ranges covering `[0, total)`.
///
/// Boundaries sit at `piece * total / pieces`, so when the batch does not
/// divide evenly the later ranges take the extra elements: a two-way split
/// of five yields `[0, 2)` and `[2, 5)`.
fn partition_ranges(total: usize, pieces: usize) -> Vec<Range<usize>> {
    (0..pieces)
        .map(|piece| (piece * total / pieces)..((piece + 1) * total / pieces))
        .collect()
}

/// Processes one contiguous sub-range sequentially, emitting one tagged
/// outcome per request.
struct Worker {
    directory: UserDirectory,
    outcomes: mpsc::UnboundedSender<RegistrationOutcome>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self, items: Vec<(usize, RegistrationRequest)>) {
        for (index, request) in items {
            let email = request.email().to_owned();
            let result = if self.cancel.is_cancelled() {
                Err(Error::Cancelled)
            } else {
                tokio::select! {
                    () = self.cancel.cancelled() => Err(Error::Cancelled),
                    result = self.directory.register(request) => result,
                }
            };
            // A closed channel means the coordinator already gave up on this
            // batch; the remaining items are marked cancelled on its side.
            if self
                .outcomes
                .send(RegistrationOutcome {
                    index,
                    email,
                    result,
                })
                .is_err()
            {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests;
