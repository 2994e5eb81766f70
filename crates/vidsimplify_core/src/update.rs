use crate::{AppState, Effect, JobSnapshot, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputKindSelected(kind) => {
            state.set_input_kind(kind);
            Vec::new()
        }
        Msg::CategorySelected(category) => {
            state.set_category(category);
            Vec::new()
        }
        Msg::ContentChanged(text) => {
            state.set_text(text);
            Vec::new()
        }
        Msg::DocumentChosen { path } => vec![Effect::LoadDocument { path }],
        Msg::DocumentLoaded { name, bytes } => {
            state.set_document(name, bytes);
            Vec::new()
        }
        Msg::DocumentFailed { message } => {
            state.set_error(message);
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::JobCreated {
            submission_id,
            job_id,
            created_at,
        } => {
            if state.pending_submission() != Some(submission_id) {
                return (state, Vec::new());
            }
            let poll_id = state.start_tracking(JobSnapshot::optimistic(job_id.clone(), created_at));
            vec![Effect::StartPolling { poll_id, job_id }]
        }
        Msg::SubmitFailed {
            submission_id,
            message,
        } => {
            if state.pending_submission() == Some(submission_id) {
                state.fail_submission(message);
            }
            Vec::new()
        }
        Msg::JobStatusFetched { poll_id, job } => {
            state.apply_status(poll_id, job);
            Vec::new()
        }
        Msg::PollingFinished { poll_id, error } => {
            state.finish_tracking(poll_id, error);
            Vec::new()
        }
        Msg::CancelClicked => match state.phase() {
            Phase::Tracking => {
                let stop = state
                    .active_poll()
                    .map(|poll_id| Effect::StopPolling { poll_id });
                state.cancel();
                stop.into_iter().collect()
            }
            Phase::Submitting => {
                // The pending result is ignored once it arrives.
                state.cancel();
                Vec::new()
            }
            Phase::Idle | Phase::Done => Vec::new(),
        },
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    // Single flight: a submission already in progress blocks new ones.
    if state.phase() == Phase::Submitting {
        return Vec::new();
    }
    let payload = state.payload();
    if !payload.is_submittable() {
        return Vec::new();
    }

    let mut effects = Vec::with_capacity(2);
    if let Some(poll_id) = state.active_poll() {
        effects.push(Effect::StopPolling { poll_id });
    }
    let submission_id = state.begin_submission();
    effects.push(Effect::SubmitJob {
        submission_id,
        payload,
    });
    effects
}
