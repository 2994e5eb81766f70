//! VidSimplify core: pure job lifecycle state machine and view-model helpers.
mod effect;
mod msg;
mod normalize;
mod progress;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use normalize::{decode_document, encode_document, normalize, strip_data_url_prefix, RawInput};
pub use progress::{project_step, step_states, StepState, PIPELINE_STEPS};
pub use state::{AppState, LoadedDocument, Phase};
pub use types::{
    CategoryKind, InputKind, JobProgress, JobSnapshot, JobStatusKind, PollId, SubmissionId,
    SubmissionPayload, GENERIC_FAILURE_MESSAGE, INITIAL_PROGRESS_MESSAGE,
};
pub use update::update;
pub use view_model::{AppViewModel, JobView, StepView};
