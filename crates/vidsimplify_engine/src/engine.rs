use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use thiserror::Error;

use crate::document::read_document;
use crate::poller::{PollHandle, PollSettings, StatusPoller};
use crate::service::{JobService, ReqwestJobService, ServiceSettings};
use crate::{EngineEvent, EventSink, FailureKind, NewJob, PollId, ServiceError, SubmissionId};

enum EngineCommand {
    Submit {
        submission_id: SubmissionId,
        job: NewJob,
    },
    StartPolling {
        poll_id: PollId,
        job_id: String,
    },
    StopPolling {
        poll_id: PollId,
    },
    CheckHealth,
    LoadDocument {
        path: PathBuf,
    },
    DownloadVideo {
        job_id: String,
        dest: PathBuf,
    },
    ListJobs {
        limit: u32,
    },
    DeleteJob {
        job_id: String,
    },
}

/// The engine thread exited and no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine thread has stopped")]
pub struct EngineStopped;

/// Forwards events to the UI thread.
pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Runs service calls on a background runtime. At most one status poll is
/// attached at any time: starting a new one cancels the previous attachment.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(service: ServiceSettings, polling: PollSettings) -> Result<Self, ServiceError> {
        let service = ReqwestJobService::new(service)?;
        Self::with_service(Arc::new(service), polling)
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))
    }

    pub fn with_service(service: Arc<dyn JobService>, polling: PollSettings) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let poller = StatusPoller::new(service.clone(), polling);
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        thread::spawn(move || {
            let _guard = runtime.enter();
            let mut active: Option<PollHandle> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { poll_id, job_id } => {
                        if let Some(previous) = active.take() {
                            previous.cancel();
                        }
                        active = Some(poller.attach(poll_id, job_id, sink.clone()));
                    }
                    EngineCommand::StopPolling { poll_id } => match active.take() {
                        Some(handle) if handle.poll_id() == poll_id => handle.cancel(),
                        Some(handle) => {
                            engine_debug!(
                                "Ignoring stop for poll {}; {} is active",
                                poll_id,
                                handle.poll_id()
                            );
                            active = Some(handle);
                        }
                        None => {}
                    },
                    other => {
                        let service = service.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            handle_command(service.as_ref(), other, sink.as_ref()).await;
                        });
                    }
                }
            }
            // UI side is gone; dropping the handle cancels any active poll.
            drop(active);
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn submit(&self, submission_id: SubmissionId, job: NewJob) {
        self.send(EngineCommand::Submit { submission_id, job });
    }

    pub fn start_polling(&self, poll_id: PollId, job_id: impl Into<String>) {
        self.send(EngineCommand::StartPolling {
            poll_id,
            job_id: job_id.into(),
        });
    }

    pub fn stop_polling(&self, poll_id: PollId) {
        self.send(EngineCommand::StopPolling { poll_id });
    }

    pub fn check_health(&self) {
        self.send(EngineCommand::CheckHealth);
    }

    pub fn load_document(&self, path: impl Into<PathBuf>) {
        self.send(EngineCommand::LoadDocument { path: path.into() });
    }

    pub fn download_video(&self, job_id: impl Into<String>, dest: impl Into<PathBuf>) {
        self.send(EngineCommand::DownloadVideo {
            job_id: job_id.into(),
            dest: dest.into(),
        });
    }

    pub fn list_jobs(&self, limit: u32) {
        self.send(EngineCommand::ListJobs { limit });
    }

    pub fn delete_job(&self, job_id: impl Into<String>) {
        self.send(EngineCommand::DeleteJob {
            job_id: job_id.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. `Ok(None)` means nothing
    /// arrived in time.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("Engine thread has stopped; command dropped");
        }
    }
}

async fn handle_command(service: &dyn JobService, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::Submit { submission_id, job } => {
            let event = match service.create_job(&job).await {
                Ok(job_id) => EngineEvent::JobCreated {
                    submission_id,
                    job_id,
                },
                Err(error) => {
                    engine_warn!("Submission {} rejected: {}", submission_id, error);
                    EngineEvent::SubmitFailed {
                        submission_id,
                        error,
                    }
                }
            };
            sink.emit(event);
        }
        EngineCommand::CheckHealth => {
            let result = service.health().await;
            sink.emit(EngineEvent::HealthChecked { result });
        }
        EngineCommand::LoadDocument { path } => {
            let event = match read_document(&path).await {
                Ok(document) => EngineEvent::DocumentLoaded {
                    name: document.name,
                    bytes: document.bytes,
                },
                Err(err) => EngineEvent::DocumentFailed {
                    path,
                    message: err.to_string(),
                },
            };
            sink.emit(event);
        }
        EngineCommand::DownloadVideo { job_id, dest } => {
            let event = match service.download_video(&job_id, &dest).await {
                Ok(path) => EngineEvent::VideoDownloaded { job_id, path },
                Err(err) => {
                    engine_warn!("Download of {} failed: {}", job_id, err);
                    EngineEvent::DownloadFailed {
                        job_id,
                        message: err.to_string(),
                    }
                }
            };
            sink.emit(event);
        }
        EngineCommand::ListJobs { limit } => {
            let result = service.list_jobs(limit).await;
            sink.emit(EngineEvent::JobsListed { result });
        }
        EngineCommand::DeleteJob { job_id } => {
            let result = service.delete_job(&job_id).await;
            if let Err(err) = &result {
                engine_warn!("Delete of {} failed: {}", job_id, err);
            }
            sink.emit(EngineEvent::JobDeleted { job_id, result });
        }
        EngineCommand::StartPolling { .. } | EngineCommand::StopPolling { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached_handle() -> (EngineHandle, mpsc::Sender<EngineEvent>) {
        let (cmd_tx, _cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        (EngineHandle { cmd_tx, event_rx }, event_tx)
    }

    #[test]
    fn quiet_engine_times_out_without_error() {
        let (handle, _event_tx) = detached_handle();
        assert_eq!(handle.recv_timeout(Duration::from_millis(5)).ok(), Some(None));
    }

    #[test]
    fn stopped_engine_is_reported() {
        let (handle, event_tx) = detached_handle();
        drop(event_tx);
        assert_eq!(
            handle.recv_timeout(Duration::from_millis(5)).err(),
            Some(EngineStopped)
        );
    }

    #[test]
    fn queued_events_drain_before_stop_is_reported() {
        let (handle, event_tx) = detached_handle();
        event_tx
            .send(EngineEvent::JobDeleted {
                job_id: "abc123".into(),
                result: Ok(()),
            })
            .unwrap();
        drop(event_tx);
        assert!(matches!(
            handle.recv_timeout(Duration::from_millis(5)),
            Ok(Some(EngineEvent::JobDeleted { .. }))
        ));
        assert!(handle.recv_timeout(Duration::from_millis(5)).is_err());
    }
}
