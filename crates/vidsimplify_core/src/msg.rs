use crate::{CategoryKind, InputKind, JobSnapshot, PollId, SubmissionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User switched between text, URL and PDF input.
    InputKindSelected(InputKind),
    /// User picked a visual category.
    CategorySelected(CategoryKind),
    /// User edited the text/URL input.
    ContentChanged(String),
    /// User picked a document file; reading it is asynchronous.
    DocumentChosen { path: String },
    /// Document bytes finished loading.
    DocumentLoaded { name: String, bytes: Vec<u8> },
    /// Document could not be read.
    DocumentFailed { message: String },
    /// User asked to generate a video from the current input.
    SubmitClicked,
    /// The service accepted the submission.
    JobCreated {
        submission_id: SubmissionId,
        job_id: String,
        /// RFC3339 timestamp taken when the job id arrived.
        created_at: String,
    },
    /// The service (or the network) rejected the submission.
    SubmitFailed {
        submission_id: SubmissionId,
        message: String,
    },
    /// Poller fetched a fresh snapshot.
    JobStatusFetched { poll_id: PollId, job: JobSnapshot },
    /// Poller reached a terminal status and stopped.
    PollingFinished {
        poll_id: PollId,
        error: Option<String>,
    },
    /// User abandoned the current submission or job.
    CancelClicked,
    /// UI/render tick to coalesce rendering.
    Tick,
}
