//! VidSimplify engine: job service client, status polling and effect execution.
mod document;
mod engine;
mod persist;
mod poller;
mod service;
mod types;

pub use document::{read_document, DocumentError, LoadedDocument};
pub use engine::{ChannelEventSink, EngineHandle, EngineStopped};
pub use persist::{ensure_output_dir, AtomicFileWriter, PendingWrite, PersistError};
pub use poller::{PollHandle, PollSettings, StatusPoller};
pub use service::{video_url, JobService, ReqwestJobService, ServiceSettings};
pub use types::{
    Category, DownloadError, EngineEvent, EventSink, FailureKind, HealthStatus, InputType, JobList,
    NewJob, PollId, RemoteJob, RemoteStatus, ServiceError, SubmissionId, GENERIC_FAILURE_MESSAGE,
};
