use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use engine_logging::{engine_info, engine_warn, short_job_id};
use vidsimplify_core::{
    CategoryKind, Effect, InputKind, JobProgress, JobSnapshot, JobStatusKind, Msg,
};
use vidsimplify_engine::{
    Category, EngineEvent, EngineHandle, EngineStopped, HealthStatus, InputType, JobList, NewJob,
    PollSettings, RemoteJob, RemoteStatus, ServiceError, ServiceSettings,
};

/// What the run loop receives from the engine.
#[derive(Debug)]
pub enum Incoming {
    Msg(Msg),
    Health(Result<HealthStatus, ServiceError>),
    Downloaded(Result<PathBuf, String>),
    JobsListed(Result<JobList, ServiceError>),
    JobDeleted(Result<(), ServiceError>),
}

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(service: ServiceSettings, polling: PollSettings) -> Result<Self, ServiceError> {
        Ok(Self {
            engine: EngineHandle::new(service, polling)?,
        })
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadDocument { path } => {
                    engine_info!("LoadDocument path={}", path);
                    self.engine.load_document(path);
                }
                Effect::SubmitJob {
                    submission_id,
                    payload,
                } => {
                    engine_info!(
                        "SubmitJob submission_id={} kind={} category={} content_len={}",
                        submission_id,
                        payload.kind,
                        payload.category,
                        payload.content.len()
                    );
                    self.engine.submit(
                        submission_id,
                        NewJob {
                            content: payload.content,
                            input_type: map_input_kind(payload.kind),
                            category: map_category(payload.category),
                        },
                    );
                }
                Effect::StartPolling { poll_id, job_id } => {
                    engine_info!(
                        "StartPolling poll_id={} job={}",
                        poll_id,
                        short_job_id(&job_id)
                    );
                    self.engine.start_polling(poll_id, job_id);
                }
                Effect::StopPolling { poll_id } => {
                    self.engine.stop_polling(poll_id);
                }
            }
        }
    }

    pub fn check_health(&self) {
        self.engine.check_health();
    }

    pub fn download(&self, job_id: &str, dest: PathBuf) {
        engine_info!("Downloading video of job {} to {:?}", short_job_id(job_id), dest);
        self.engine.download_video(job_id, dest);
    }

    pub fn list_jobs(&self, limit: u32) {
        self.engine.list_jobs(limit);
    }

    pub fn delete_job(&self, job_id: &str) {
        engine_info!("Deleting job {}", short_job_id(job_id));
        self.engine.delete_job(job_id);
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next(&self, timeout: Duration) -> Result<Option<Incoming>, EngineStopped> {
        Ok(self.engine.recv_timeout(timeout)?.map(map_event))
    }
}

fn map_event(event: EngineEvent) -> Incoming {
    match event {
        EngineEvent::JobCreated {
            submission_id,
            job_id,
        } => Incoming::Msg(Msg::JobCreated {
            submission_id,
            job_id,
            created_at: Utc::now().to_rfc3339(),
        }),
        EngineEvent::SubmitFailed {
            submission_id,
            error,
        } => Incoming::Msg(Msg::SubmitFailed {
            submission_id,
            message: error.to_string(),
        }),
        EngineEvent::StatusUpdated { poll_id, job } => Incoming::Msg(Msg::JobStatusFetched {
            poll_id,
            job: map_job(job),
        }),
        EngineEvent::PollingFinished { poll_id, error } => {
            Incoming::Msg(Msg::PollingFinished { poll_id, error })
        }
        EngineEvent::HealthChecked { result } => Incoming::Health(result),
        EngineEvent::DocumentLoaded { name, bytes } => {
            Incoming::Msg(Msg::DocumentLoaded { name, bytes })
        }
        EngineEvent::DocumentFailed { path, message } => {
            engine_warn!("Could not load {:?}: {}", path, message);
            Incoming::Msg(Msg::DocumentFailed { message })
        }
        EngineEvent::VideoDownloaded { path, .. } => Incoming::Downloaded(Ok(path)),
        EngineEvent::DownloadFailed { message, .. } => Incoming::Downloaded(Err(message)),
        EngineEvent::JobsListed { result } => Incoming::JobsListed(result),
        EngineEvent::JobDeleted { result, .. } => Incoming::JobDeleted(result),
    }
}

fn map_job(job: RemoteJob) -> JobSnapshot {
    JobSnapshot {
        job_id: job.job_id,
        status: map_status(job.status),
        progress: JobProgress {
            percentage: job.percentage,
            message: job.message,
        },
        created_at: job.created_at,
        error_message: job.error,
    }
}

fn map_status(status: RemoteStatus) -> JobStatusKind {
    match status {
        RemoteStatus::Pending => JobStatusKind::Pending,
        RemoteStatus::GeneratingCode => JobStatusKind::GeneratingCode,
        RemoteStatus::Rendering => JobStatusKind::Rendering,
        RemoteStatus::Completed => JobStatusKind::Completed,
        RemoteStatus::Failed => JobStatusKind::Failed,
    }
}

fn map_input_kind(kind: InputKind) -> InputType {
    match kind {
        InputKind::Text => InputType::Text,
        InputKind::Url => InputType::Url,
        InputKind::PdfDocument => InputType::Pdf,
    }
}

fn map_category(category: CategoryKind) -> Category {
    match category {
        CategoryKind::TechSystem => Category::TechSystem,
        CategoryKind::ProductStartup => Category::ProductStartup,
        CategoryKind::Mathematical => Category::Mathematical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_update_becomes_snapshot() {
        let incoming = map_event(EngineEvent::StatusUpdated {
            poll_id: 3,
            job: RemoteJob {
                job_id: "abc123".into(),
                status: RemoteStatus::Failed,
                percentage: 40,
                message: "Rendering video...".into(),
                created_at: "2026-10-19T08:00:00Z".into(),
                error: Some("render timeout".into()),
            },
        });
        match incoming {
            Incoming::Msg(Msg::JobStatusFetched { poll_id, job }) => {
                assert_eq!(poll_id, 3);
                assert_eq!(job.status, JobStatusKind::Failed);
                assert_eq!(job.progress.percentage, 40);
                assert_eq!(job.error_message.as_deref(), Some("render timeout"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn job_created_is_stamped_with_rfc3339_time() {
        match map_event(EngineEvent::JobCreated {
            submission_id: 1,
            job_id: "abc123".into(),
        }) {
            Incoming::Msg(Msg::JobCreated { created_at, .. }) => {
                assert!(chrono::DateTime::parse_from_rfc3339(&created_at).is_ok());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn job_management_results_pass_through() {
        match map_event(EngineEvent::JobDeleted {
            job_id: "nope".into(),
            result: Err(ServiceError {
                kind: vidsimplify_engine::FailureKind::HttpStatus(404),
                message: "Job not found".into(),
            }),
        }) {
            Incoming::JobDeleted(Err(err)) => assert_eq!(err.message, "Job not found"),
            other => panic!("unexpected {other:?}"),
        }
        match map_event(EngineEvent::JobsListed {
            result: Ok(JobList {
                total: 0,
                jobs: Vec::new(),
            }),
        }) {
            Incoming::JobsListed(Ok(list)) => assert!(list.jobs.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }
}
