//! Fixed-cadence job status polling

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ApiResult, StoryService};
use crate::config::PollingConfig;
use texo_core::{Job, JobId, JobStatus};

/// Latest snapshot published by the poller; `None` until the first successful fetch
pub type SnapshotReceiver = watch::Receiver<Option<Arc<Job>>>;

/// Why a poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    Cancelled,
}

/// Requests job snapshots on a fixed interval until the job reaches a terminal state
#[derive(Clone)]
pub struct JobPoller {
    service: Arc<dyn StoryService>,
    interval: Duration,
}

/// Control side of a running poll loop. Snapshots go to the receivers returned
/// by [`JobPoller::spawn`]; the loop also ends once every receiver is dropped.
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    /// Stop polling and wait for the loop to exit
    pub async fn shutdown(self) -> PollOutcome {
        self.cancel.cancel();
        self.task.await.unwrap_or(PollOutcome::Cancelled)
    }

    /// Wait for the loop to end on its own (terminal status, external cancel or no subscribers)
    pub async fn finished(self) -> PollOutcome {
        self.task.await.unwrap_or(PollOutcome::Cancelled)
    }
}

impl JobPoller {
    pub fn new(service: Arc<dyn StoryService>, config: &PollingConfig) -> Self {
        Self {
            service,
            interval: config.interval(),
        }
    }

    /// Start polling `job_id`. Cancelling `cancel` stops the loop and aborts in-flight requests.
    pub fn spawn(&self, job_id: JobId, cancel: CancellationToken) -> (SnapshotReceiver, PollHandle) {
        let (tx, rx) = watch::channel(None);
        let poller = self.clone();
        let loop_cancel = cancel.clone();
        let task = tokio::spawn(async move { poller.run(job_id, tx, loop_cancel).await });

        (rx, PollHandle { cancel, task })
    }

    async fn run(
        self,
        job_id: JobId,
        tx: watch::Sender<Option<Arc<Job>>>,
        cancel: CancellationToken,
    ) -> PollOutcome {
        info!("🔄 Polling story {} every {:?}", job_id, self.interval);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight: JoinSet<(u64, ApiResult<Job>)> = JoinSet::new();
        let mut next_seq: u64 = 0;
        let mut applied: Option<(u64, JobStatus)> = None;

        let outcome = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break PollOutcome::Cancelled,

                _ = tx.closed() => {
                    debug!("No snapshot subscribers left for {}", job_id);
                    break PollOutcome::Cancelled;
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    let (seq, result) = match joined {
                        Ok(response) => response,
                        Err(e) => {
                            warn!("Poll request task for {} ended abnormally: {}", job_id, e);
                            continue;
                        }
                    };

                    let job = match result {
                        Ok(job) => job,
                        Err(e) => {
                            warn!("Failed to fetch story {}: {}", job_id, e);
                            continue;
                        }
                    };

                    if let Some((applied_seq, applied_status)) = applied {
                        if seq <= applied_seq {
                            debug!("Discarding stale response #{} for {} (already applied #{})", seq, job_id, applied_seq);
                            continue;
                        }
                        if job.status.is_regression_from(applied_status) {
                            warn!("Discarding response #{} for {}: status {} after {}", seq, job_id, job.status, applied_status);
                            continue;
                        }
                    }

                    let status = job.status;
                    debug!("Story {} is {} ({}%)", job_id, status, job.progress);
                    applied = Some((seq, status));
                    tx.send_replace(Some(Arc::new(job)));

                    match status {
                        JobStatus::Completed => break PollOutcome::Completed,
                        JobStatus::Failed => break PollOutcome::Failed,
                        _ => {}
                    }
                }

                _ = ticker.tick() => {
                    let seq = next_seq;
                    next_seq += 1;
                    let service = Arc::clone(&self.service);
                    let id = job_id.clone();
                    in_flight.spawn(async move { (seq, service.fetch_job(&id).await) });
                }
            }
        };

        in_flight.abort_all();
        match outcome {
            PollOutcome::Completed => info!("✅ Story {} completed, polling stopped", job_id),
            PollOutcome::Failed => warn!("❌ Story {} failed, polling stopped", job_id),
            PollOutcome::Cancelled => debug!("Polling for {} cancelled", job_id),
        }
        outcome
    }
}
