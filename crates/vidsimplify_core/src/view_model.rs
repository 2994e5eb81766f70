use crate::{CategoryKind, InputKind, JobStatusKind, Phase, StepState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub input_kind: InputKind,
    pub category: CategoryKind,
    pub document_name: Option<String>,
    pub can_submit: bool,
    pub is_generating: bool,
    pub job: Option<JobView>,
    /// Empty while there is no job to show.
    pub steps: Vec<StepView>,
    pub error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub job_id: String,
    pub status: JobStatusKind,
    pub percentage: u8,
    pub message: String,
    pub created_at: String,
    pub video_ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepView {
    pub label: &'static str,
    pub state: StepState,
}
