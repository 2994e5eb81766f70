/// Conceptual phases shown while a job runs, in order.
pub const PIPELINE_STEPS: [&str; 4] = [
    "Analyzing Input",
    "Generating Script",
    "Validating Code",
    "Rendering Frames",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Active,
    Pending,
}

/// Maps a percentage onto an index into [`PIPELINE_STEPS`]:
/// `floor(p / 100 * 4)` clamped to the last step.
pub fn project_step(percentage: u8) -> usize {
    let steps = PIPELINE_STEPS.len();
    (usize::from(percentage) * steps / 100).min(steps - 1)
}

pub fn step_states(percentage: u8) -> [StepState; PIPELINE_STEPS.len()] {
    let current = project_step(percentage);
    std::array::from_fn(|i| match i.cmp(&current) {
        std::cmp::Ordering::Less => StepState::Completed,
        std::cmp::Ordering::Equal => StepState::Active,
        std::cmp::Ordering::Greater => StepState::Pending,
    })
}
