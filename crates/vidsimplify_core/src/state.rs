use crate::normalize::{normalize, RawInput};
use crate::progress::{step_states, PIPELINE_STEPS};
use crate::view_model::{AppViewModel, JobView, StepView};
use crate::{
    CategoryKind, InputKind, JobSnapshot, JobStatusKind, PollId, SubmissionId, SubmissionPayload,
    GENERIC_FAILURE_MESSAGE,
};

/// Coarse controller state, as exposed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Tracking,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Lifecycle {
    #[default]
    Idle,
    Submitting {
        submission_id: SubmissionId,
    },
    Tracking {
        poll_id: PollId,
        job: JobSnapshot,
    },
    /// Completed or failed; the error field is populated on failure.
    Done {
        job: JobSnapshot,
    },
}

/// A document that has been read, ready for submission. Encoding happens
/// when the payload is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    input_kind: InputKind,
    category: CategoryKind,
    text: String,
    document: Option<LoadedDocument>,
    lifecycle: Lifecycle,
    error: Option<String>,
    last_submission_id: SubmissionId,
    last_poll_id: PollId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let job = self.snapshot().map(|job| JobView {
            job_id: job.job_id.clone(),
            status: job.status,
            percentage: job.progress.percentage,
            message: job.progress.message.clone(),
            created_at: job.created_at.clone(),
            video_ready: job.status == JobStatusKind::Completed,
        });
        let steps = match self.snapshot() {
            Some(job) => PIPELINE_STEPS
                .iter()
                .copied()
                .zip(step_states(job.progress.percentage))
                .map(|(label, state)| StepView { label, state })
                .collect(),
            None => Vec::new(),
        };

        AppViewModel {
            phase: self.phase(),
            input_kind: self.input_kind,
            category: self.category,
            document_name: self.document.as_ref().map(|doc| doc.name.clone()),
            can_submit: self.can_submit(),
            is_generating: self.is_generating(),
            job,
            steps,
            error: self.error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn phase(&self) -> Phase {
        match self.lifecycle {
            Lifecycle::Idle => Phase::Idle,
            Lifecycle::Submitting { .. } => Phase::Submitting,
            Lifecycle::Tracking { .. } => Phase::Tracking,
            Lifecycle::Done { .. } => Phase::Done,
        }
    }

    pub fn snapshot(&self) -> Option<&JobSnapshot> {
        match &self.lifecycle {
            Lifecycle::Tracking { job, .. } | Lifecycle::Done { job } => Some(job),
            Lifecycle::Idle | Lifecycle::Submitting { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        matches!(
            self.lifecycle,
            Lifecycle::Submitting { .. } | Lifecycle::Tracking { .. }
        )
    }

    /// Attachment whose results are currently accepted.
    pub fn active_poll(&self) -> Option<PollId> {
        match self.lifecycle {
            Lifecycle::Tracking { poll_id, .. } => Some(poll_id),
            _ => None,
        }
    }

    pub(crate) fn pending_submission(&self) -> Option<SubmissionId> {
        match self.lifecycle {
            Lifecycle::Submitting { submission_id } => Some(submission_id),
            _ => None,
        }
    }

    /// Payload built from the current input selection.
    pub fn payload(&self) -> SubmissionPayload {
        let raw = match self.input_kind {
            InputKind::Text | InputKind::Url => RawInput::Text(self.text.clone()),
            InputKind::PdfDocument => match &self.document {
                Some(doc) => RawInput::Document(doc.bytes.clone()),
                None => RawInput::Text(String::new()),
            },
        };
        normalize(self.input_kind, raw, self.category)
    }

    fn can_submit(&self) -> bool {
        !matches!(self.lifecycle, Lifecycle::Submitting { .. }) && self.payload().is_submittable()
    }

    pub(crate) fn set_input_kind(&mut self, kind: InputKind) {
        if self.input_kind != kind {
            self.input_kind = kind;
            self.dirty = true;
        }
    }

    pub(crate) fn set_category(&mut self, category: CategoryKind) {
        if self.category != category {
            self.category = category;
            self.dirty = true;
        }
    }

    pub(crate) fn set_text(&mut self, text: String) {
        if self.text != text {
            self.text = text;
            self.dirty = true;
        }
    }

    pub(crate) fn set_document(&mut self, name: String, bytes: Vec<u8>) {
        self.document = Some(LoadedDocument { name, bytes });
        self.dirty = true;
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.error = Some(message);
        self.dirty = true;
    }

    /// Clears the previous job and error and enters `Submitting`.
    pub(crate) fn begin_submission(&mut self) -> SubmissionId {
        self.last_submission_id += 1;
        let submission_id = self.last_submission_id;
        self.lifecycle = Lifecycle::Submitting { submission_id };
        self.error = None;
        self.dirty = true;
        submission_id
    }

    pub(crate) fn start_tracking(&mut self, job: JobSnapshot) -> PollId {
        self.last_poll_id += 1;
        let poll_id = self.last_poll_id;
        self.lifecycle = Lifecycle::Tracking { poll_id, job };
        self.dirty = true;
        poll_id
    }

    pub(crate) fn fail_submission(&mut self, message: String) {
        self.lifecycle = Lifecycle::Idle;
        self.error = Some(message);
        self.dirty = true;
    }

    /// Replaces the tracked snapshot wholesale. Results from a stale
    /// attachment are dropped.
    pub(crate) fn apply_status(&mut self, poll_id: PollId, next: JobSnapshot) {
        let Lifecycle::Tracking {
            poll_id: active,
            job,
        } = &mut self.lifecycle
        else {
            return;
        };
        if *active != poll_id {
            return;
        }
        if next.status == JobStatusKind::Failed {
            self.error = Some(
                next.error_message
                    .clone()
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            );
        }
        *job = next;
        self.dirty = true;
    }

    pub(crate) fn finish_tracking(&mut self, poll_id: PollId, error: Option<String>) {
        if self.active_poll() != Some(poll_id) {
            return;
        }
        let Lifecycle::Tracking { job, .. } = std::mem::take(&mut self.lifecycle) else {
            return;
        };
        if let Some(message) = error {
            self.error = Some(message);
        }
        self.lifecycle = Lifecycle::Done { job };
        self.dirty = true;
    }

    pub(crate) fn cancel(&mut self) {
        self.lifecycle = Lifecycle::Idle;
        self.dirty = true;
    }
}
