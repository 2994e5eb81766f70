use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::PersistError;

pub type PollId = u64;
pub type SubmissionId = u64;

/// Error reported for a failed job that carries no reason of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Job failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Url,
    Pdf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TechSystem,
    ProductStartup,
    Mathematical,
}

/// Body of a job creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewJob {
    pub content: String,
    pub input_type: InputType,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Pending,
    GeneratingCode,
    /// The service also reports a post-render `verifying` phase; it is still
    /// in flight, so it is folded into rendering.
    #[serde(alias = "verifying")]
    Rendering,
    Completed,
    Failed,
}

impl RemoteStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RemoteStatus::Completed | RemoteStatus::Failed)
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RemoteStatus::Pending => "pending",
            RemoteStatus::GeneratingCode => "generating_code",
            RemoteStatus::Rendering => "rendering",
            RemoteStatus::Completed => "completed",
            RemoteStatus::Failed => "failed",
        };
        f.pad(text)
    }
}

/// Job status as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteJob {
    pub job_id: String,
    pub status: RemoteStatus,
    pub percentage: u8,
    pub message: String,
    pub created_at: String,
    pub error: Option<String>,
}

impl RemoteJob {
    /// Error to report when this job ends in failure.
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
    }
}

/// Recent jobs known to the service, newest first. `total` counts the
/// jobs returned, not every job the service holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobList {
    pub total: usize,
    pub jobs: Vec<RemoteJob>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    JobCreated {
        submission_id: SubmissionId,
        job_id: String,
    },
    SubmitFailed {
        submission_id: SubmissionId,
        error: ServiceError,
    },
    StatusUpdated {
        poll_id: PollId,
        job: RemoteJob,
    },
    /// Emitted at most once per attachment: on a terminal status, or when
    /// the consecutive failure limit is reached.
    PollingFinished {
        poll_id: PollId,
        error: Option<String>,
    },
    HealthChecked {
        result: Result<HealthStatus, ServiceError>,
    },
    JobsListed {
        result: Result<JobList, ServiceError>,
    },
    JobDeleted {
        job_id: String,
        result: Result<(), ServiceError>,
    },
    DocumentLoaded {
        name: String,
        bytes: Vec<u8>,
    },
    DocumentFailed {
        path: PathBuf,
        message: String,
    },
    VideoDownloaded {
        job_id: String,
        path: PathBuf,
    },
    DownloadFailed {
        job_id: String,
        message: String,
    },
}

/// Receives engine events. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("video download is not supported by this service")]
    Unsupported,
}
