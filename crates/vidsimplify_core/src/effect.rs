use crate::{PollId, SubmissionId, SubmissionPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadDocument {
        path: String,
    },
    SubmitJob {
        submission_id: SubmissionId,
        payload: SubmissionPayload,
    },
    /// Attach the status poller to `job_id`, replacing any earlier attachment.
    StartPolling {
        poll_id: PollId,
        job_id: String,
    },
    StopPolling {
        poll_id: PollId,
    },
}
