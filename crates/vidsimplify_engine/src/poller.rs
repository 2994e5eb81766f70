//! Fixed-interval status polling for one job at a time.
//!
//! Every tick spawns its own fetch, so a slow response never postpones the
//! next tick and overlapping fetches complete independently. All results go
//! through an [`Attachment`] gate: once the gate is closed (cancel or terminal
//! status) nothing more is emitted for that attachment, including results of
//! fetches that were already in flight.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn, short_job_id};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, EventSink, JobService, PollId, RemoteJob, RemoteStatus};

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    /// Consecutive failed fetches after which the attachment gives up with an
    /// error. `None` retries forever.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_consecutive_failures: None,
        }
    }
}

pub struct StatusPoller {
    service: Arc<dyn JobService>,
    settings: PollSettings,
}

impl StatusPoller {
    pub fn new(service: Arc<dyn JobService>, settings: PollSettings) -> Self {
        Self { service, settings }
    }

    /// Starts polling `job_id`. The first fetch happens one interval from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(
        &self,
        poll_id: PollId,
        job_id: impl Into<String>,
        sink: Arc<dyn EventSink>,
    ) -> PollHandle {
        let attachment = Arc::new(Attachment {
            poll_id,
            job_id: job_id.into(),
            sink,
            closed: Mutex::new(false),
            stop: CancellationToken::new(),
            failures: AtomicU32::new(0),
            max_failures: self.settings.max_consecutive_failures,
        });
        engine_info!(
            "Polling job {} every {:?} (poll {})",
            short_job_id(&attachment.job_id),
            self.settings.interval,
            poll_id
        );

        tokio::spawn(run_ticker(
            self.service.clone(),
            self.settings.interval,
            attachment.clone(),
        ));
        PollHandle { attachment }
    }
}

/// Owner of one attachment. Cancels it when dropped.
pub struct PollHandle {
    attachment: Arc<Attachment>,
}

impl PollHandle {
    pub fn poll_id(&self) -> PollId {
        self.attachment.poll_id
    }

    pub fn job_id(&self) -> &str {
        &self.attachment.job_id
    }

    /// False once cancelled or finished.
    pub fn is_active(&self) -> bool {
        !self.attachment.is_closed()
    }

    /// Stops the timer. Once this returns no further events are emitted for
    /// this attachment. Calling it again has no effect.
    pub fn cancel(&self) {
        if self.attachment.close() {
            engine_debug!(
                "Cancelled polling of job {} (poll {})",
                short_job_id(&self.attachment.job_id),
                self.attachment.poll_id
            );
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct Attachment {
    poll_id: PollId,
    job_id: String,
    sink: Arc<dyn EventSink>,
    /// Held while emitting, so closing waits for an emission in progress.
    closed: Mutex<bool>,
    stop: CancellationToken,
    failures: AtomicU32,
    max_failures: Option<u32>,
}

impl Attachment {
    fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true if this call closed the gate.
    fn close(&self) -> bool {
        let mut closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        self.stop.cancel();
        !std::mem::replace(&mut *closed, true)
    }

    fn deliver(&self, job: RemoteJob) {
        let mut closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            engine_debug!(
                "Dropping late status for job {} (poll {})",
                short_job_id(&self.job_id),
                self.poll_id
            );
            return;
        }

        let terminal = match job.status {
            RemoteStatus::Completed => Some(None),
            RemoteStatus::Failed => Some(Some(job.failure_message())),
            RemoteStatus::Pending | RemoteStatus::GeneratingCode | RemoteStatus::Rendering => None,
        };
        self.sink.emit(EngineEvent::StatusUpdated {
            poll_id: self.poll_id,
            job,
        });

        if let Some(error) = terminal {
            *closed = true;
            self.stop.cancel();
            engine_info!(
                "Job {} finished{} (poll {})",
                short_job_id(&self.job_id),
                error
                    .as_deref()
                    .map(|e| format!(" with error: {e}"))
                    .unwrap_or_default(),
                self.poll_id
            );
            self.sink.emit(EngineEvent::PollingFinished {
                poll_id: self.poll_id,
                error,
            });
        }
    }

    fn give_up(&self, error: String) {
        let mut closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return;
        }
        *closed = true;
        self.stop.cancel();
        self.sink.emit(EngineEvent::PollingFinished {
            poll_id: self.poll_id,
            error: Some(error),
        });
    }
}

async fn run_ticker(service: Arc<dyn JobService>, period: Duration, attachment: Arc<Attachment>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = attachment.stop.cancelled() => break,
            _ = ticker.tick() => {
                let service = service.clone();
                let attachment = attachment.clone();
                tokio::spawn(async move {
                    fetch_once(service.as_ref(), &attachment).await;
                });
            }
        }
    }
    engine_debug!(
        "Timer stopped for job {} (poll {})",
        short_job_id(&attachment.job_id),
        attachment.poll_id
    );
}

async fn fetch_once(service: &dyn JobService, attachment: &Attachment) {
    if attachment.stop.is_cancelled() {
        return;
    }
    engine_debug!(
        "Fetching status of job {} (poll {})",
        short_job_id(&attachment.job_id),
        attachment.poll_id
    );

    match service.job_status(&attachment.job_id).await {
        Ok(job) => {
            attachment.failures.store(0, Ordering::Relaxed);
            attachment.deliver(job);
        }
        Err(err) => {
            let failures = attachment.failures.fetch_add(1, Ordering::Relaxed) + 1;
            engine_warn!(
                "Status check for job {} failed ({} in a row): {}",
                short_job_id(&attachment.job_id),
                failures,
                err
            );
            if let Some(max) = attachment.max_failures {
                if failures >= max {
                    attachment.give_up(format!(
                        "Lost contact with the job service after {failures} failed status checks: {err}"
                    ));
                }
            }
        }
    }
}
