use vidsimplify_core::{AppViewModel, JobStatusKind, Phase, StepState};
use vidsimplify_engine::JobList;

/// Renders the view model as terminal lines.
pub fn render(view: &AppViewModel, base_url: &str) -> Vec<String> {
    let mut lines = Vec::new();

    match view.phase {
        Phase::Idle => {
            if let Some(name) = &view.document_name {
                lines.push(format!("Document ready: {name}"));
            }
        }
        Phase::Submitting => lines.push(format!(
            "Submitting {} input ({})...",
            view.input_kind,
            view.category.label()
        )),
        Phase::Tracking | Phase::Done => {}
    }

    if let Some(job) = &view.job {
        lines.push(format!(
            "[{}] {:>3}% {} - {}",
            job.job_id, job.percentage, job.status, job.message
        ));
        let steps = view
            .steps
            .iter()
            .map(|step| format!("{} {}", step_marker(step.state), step.label))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(format!("      {steps}"));
        if job.video_ready {
            lines.push(format!(
                "Video ready: {}",
                vidsimplify_engine::video_url(base_url, &job.job_id)
            ));
        } else if job.status == JobStatusKind::Failed && view.phase == Phase::Done {
            lines.push("Generation failed.".to_string());
        }
    }

    if let Some(error) = &view.error {
        lines.push(format!("Error: {error}"));
    }
    lines
}

/// One line per job, newest first.
pub fn render_job_list(list: &JobList) -> Vec<String> {
    if list.jobs.is_empty() {
        return vec!["No jobs.".to_string()];
    }
    let mut lines = vec![format!("{} job(s):", list.total)];
    lines.extend(list.jobs.iter().map(|job| {
        let mut line = format!(
            "{}  {:<15} {:>3}%  {}",
            job.job_id, job.status, job.percentage, job.created_at
        );
        if let Some(error) = job.error.as_deref().filter(|error| !error.is_empty()) {
            line.push_str(&format!("  ({error})"));
        }
        line
    }));
    lines
}

fn step_marker(state: StepState) -> &'static str {
    match state {
        StepState::Completed => "[x]",
        StepState::Active => "[>]",
        StepState::Pending => "[ ]",
    }
}
