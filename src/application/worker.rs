//! Background batch scoring.
//!
//! Scores a list of profiles on a worker thread and streams progress back
//! over a channel, so a caller can render results as they arrive. A profile
//! that fails validation is reported and skipped; the batch continues.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::domain::RawCustomerProfile;
use crate::{ChurnError, ChurnScorer, ScoredProfile};

/// Progress updates from the batch worker.
#[derive(Debug, Clone)]
pub enum BatchProgress {
    /// Batch accepted
    Started { total: usize },
    /// One profile scored
    Scored { index: usize, scored: ScoredProfile },
    /// One profile could not be scored
    Rejected { index: usize, error: String },
    /// All profiles processed
    Finished { scored: usize, rejected: usize },
    /// The batch stopped early (scorer not ready or predictor fault)
    Aborted { index: usize, error: String },
}

/// Handle to a running batch.
pub struct BatchWorkerHandle {
    /// Receiver for progress updates
    pub progress_rx: Receiver<BatchProgress>,
    handle: JoinHandle<()>,
}

impl BatchWorkerHandle {
    /// Block until the worker finishes, collecting every update.
    #[must_use]
    pub fn wait(self) -> Vec<BatchProgress> {
        let updates: Vec<BatchProgress> = self.progress_rx.iter().collect();
        if self.handle.join().is_err() {
            tracing::error!("Batch scoring thread panicked");
        }
        updates
    }
}

/// Worker that scores a batch in the background.
pub struct BatchScoringWorker;

impl BatchScoringWorker {
    /// Spawn a background batch.
    ///
    /// Returns a handle to receive progress updates.
    pub fn spawn(scorer: Arc<ChurnScorer>, profiles: Vec<RawCustomerProfile>) -> BatchWorkerHandle {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run(&scorer, profiles, &tx);
        });

        BatchWorkerHandle {
            progress_rx: rx,
            handle,
        }
    }

    fn run(scorer: &ChurnScorer, profiles: Vec<RawCustomerProfile>, tx: &Sender<BatchProgress>) {
        let total = profiles.len();
        let _ = tx.send(BatchProgress::Started { total });
        tracing::info!("Scoring batch of {} profiles", total);

        let mut scored = 0;
        let mut rejected = 0;

        for (index, raw) in profiles.iter().enumerate() {
            let update = match scorer.score_raw(raw) {
                Ok(result) => {
                    scored += 1;
                    BatchProgress::Scored {
                        index,
                        scored: result,
                    }
                }
                Err(e @ ChurnError::InvalidProfile(_)) => {
                    rejected += 1;
                    tracing::warn!("Batch item {} rejected: {}", index, e);
                    BatchProgress::Rejected {
                        index,
                        error: e.to_string(),
                    }
                }
                Err(e) => {
                    // Not a per-item problem: every later item would fail the same way.
                    tracing::error!("Batch aborted at item {}: {}", index, e);
                    let _ = tx.send(BatchProgress::Aborted {
                        index,
                        error: e.to_string(),
                    });
                    return;
                }
            };

            if tx.send(update).is_err() {
                tracing::debug!("Batch receiver dropped; stopping at item {}", index);
                return;
            }
        }

        tracing::info!("Batch complete: {} scored, {} rejected", scored, rejected);
        let _ = tx.send(BatchProgress::Finished { scored, rejected });
    }
}
