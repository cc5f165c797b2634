use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Semaphore};

use super::event_bus::{EventBus, SplitEvent};
use crate::pipeline::split_audio_use_case::{SplitRequest, SplitResult, SplitRunner};
use crate::pipeline::split_error::SplitError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Scheduled,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// Handle to a submitted background job.
#[derive(Clone, Debug)]
pub struct JobTicket {
    job_id: u64,
    item_id: String,
    state: watch::Receiver<JobState>,
}

impl JobTicket {
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn state(&self) -> JobState {
        *self.state.borrow()
    }

    /// Resolves once the job has succeeded or failed. Its event, if any
    /// subscriber was connected, has been published by then.
    pub async fn wait(&mut self) -> JobState {
        match self.state.wait_for(|s| s.is_terminal()).await {
            Ok(state) => *state,
            // The job task ended without reporting; treat it as failed
            Err(_) => JobState::Failed,
        }
    }
}

/// Runs split jobs in the background with at most `concurrency` running at
/// once.
///
/// Bookkeeping happens on the tokio runtime; the split itself runs on the
/// blocking pool. Waiting jobs have no depth limit and no ordering guarantee.
#[derive(Clone)]
pub struct JobScheduler {
    runner: Arc<dyn SplitRunner>,
    bus: EventBus,
    slots: Arc<Semaphore>,
    concurrency: usize,
    next_job_id: Arc<AtomicU64>,
}

impl JobScheduler {
    pub fn new(runner: Arc<dyn SplitRunner>, bus: EventBus, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            runner,
            bus,
            slots: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            next_job_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Schedules an automatic split and returns immediately. The outcome is
    /// published as `split_finished` or `split_failed`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, item_id: &str) -> JobTicket {
        let job_id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let (state_tx, state_rx) = watch::channel(JobState::Scheduled);
        let request = SplitRequest::automatic(item_id);
        let scheduler = self.clone();

        log::info!("Scheduled job {job_id} for {item_id}");
        tokio::spawn(async move {
            let outcome = scheduler.run_in_slot(request.clone(), Some(&state_tx)).await;
            let final_state = match outcome {
                Ok(result) => {
                    log::info!(
                        "Job {job_id} ({}) finished: split at {:.3}s, WER {:.3}",
                        request.item_id,
                        result.split_time_seconds,
                        result.word_error_rate
                    );
                    scheduler
                        .bus
                        .publish(SplitEvent::finished(&request.item_id, result));
                    JobState::Succeeded
                }
                Err(e) => {
                    log::error!("Job {job_id} ({}) failed: {e}", request.item_id);
                    scheduler.bus.publish(SplitEvent::failed(&request.item_id, &e));
                    JobState::Failed
                }
            };
            state_tx.send_replace(final_state);
        });

        JobTicket {
            job_id,
            item_id: item_id.to_string(),
            state: state_rx,
        }
    }

    /// Splits at `cut_ms` inside a job slot and hands the outcome straight
    /// back. Nothing is published.
    pub async fn split_at(&self, item_id: &str, cut_ms: f64) -> Result<SplitResult, SplitError> {
        self.run_in_slot(SplitRequest::manual(item_id, cut_ms), None)
            .await
    }

    async fn run_in_slot(
        &self,
        request: SplitRequest,
        state: Option<&watch::Sender<JobState>>,
    ) -> Result<SplitResult, SplitError> {
        let _permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| SplitError::SlotsClosed)?;
        if let Some(state) = state {
            state.send_replace(JobState::Running);
        }

        let runner = Arc::clone(&self.runner);
        match tokio::task::spawn_blocking(move || runner.run(&request)).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => Err(SplitError::WorkerPanicked(panic_message(e.into_panic()))),
            Err(e) => Err(SplitError::WorkerPanicked(e.to_string())),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
