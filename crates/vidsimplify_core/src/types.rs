use std::fmt;

/// Identifies one attachment of the status poller to a job.
pub type PollId = u64;

/// Identifies one user-initiated submission attempt.
pub type SubmissionId = u64;

/// Progress message shown between job creation and the first status response.
pub const INITIAL_PROGRESS_MESSAGE: &str = "Initializing system...";

/// Error surfaced when the service reports a failure without a reason.
pub const GENERIC_FAILURE_MESSAGE: &str = "Job failed";

/// How the raw user input is interpreted and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    Text,
    Url,
    PdfDocument,
}

impl InputKind {
    /// Name used on the wire by the job service.
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Url => "url",
            InputKind::PdfDocument => "pdf",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual style the service should use for the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryKind {
    #[default]
    TechSystem,
    ProductStartup,
    Mathematical,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::TechSystem => "tech_system",
            CategoryKind::ProductStartup => "product_startup",
            CategoryKind::Mathematical => "mathematical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryKind::TechSystem => "Tech & Systems",
            CategoryKind::ProductStartup => "Product Demo",
            CategoryKind::Mathematical => "Math & Research",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatusKind {
    Pending,
    GeneratingCode,
    Rendering,
    Completed,
    Failed,
}

impl JobStatusKind {
    /// `Completed` and `Failed` end a job; nothing follows them.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatusKind::Completed | JobStatusKind::Failed)
    }
}

impl fmt::Display for JobStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            JobStatusKind::Pending => "pending",
            JobStatusKind::GeneratingCode => "generating code",
            JobStatusKind::Rendering => "rendering",
            JobStatusKind::Completed => "completed",
            JobStatusKind::Failed => "failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    /// 0..=100.
    pub percentage: u8,
    pub message: String,
}

/// Latest known state of a remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatusKind,
    pub progress: JobProgress,
    /// RFC3339 timestamp.
    pub created_at: String,
    pub error_message: Option<String>,
}

impl JobSnapshot {
    /// Snapshot assumed right after the service accepted a job, before any
    /// status response arrived.
    pub fn optimistic(job_id: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatusKind::Pending,
            progress: JobProgress {
                percentage: 0,
                message: INITIAL_PROGRESS_MESSAGE.to_string(),
            },
            created_at: created_at.into(),
            error_message: None,
        }
    }
}

/// Normalized submission sent to the job service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub kind: InputKind,
    pub content: String,
    pub category: CategoryKind,
}

impl SubmissionPayload {
    /// Empty content is never sent.
    pub fn is_submittable(&self) -> bool {
        !self.content.is_empty()
    }
}
