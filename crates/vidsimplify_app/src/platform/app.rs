use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use engine_logging::{engine_info, engine_warn};
use log::LevelFilter;
use vidsimplify_core::{update, AppState, JobStatusKind, Msg, Phase};

use super::cli::{Args, Mode};
use super::effects::{EffectRunner, Incoming};
use super::render::{render, render_job_list};

const LOG_FILE: &str = "./vidsimplify.log";
const TICK: Duration = Duration::from_millis(75);

pub fn run_app() -> anyhow::Result<()> {
    let args = Args::parse();
    engine_logging::initialize(args.log.into(), LevelFilter::Info, Path::new(LOG_FILE));

    let runner = EffectRunner::new(args.service_settings(), args.poll_settings())
        .with_context(|| format!("cannot use job service at {}", args.server))?;
    let mut app = App::new(runner, args.server.clone(), args.output.clone());

    match args.mode() {
        Mode::ListJobs { limit } => return app.list_jobs(limit),
        Mode::DeleteJob { job_id } => return app.delete_job(&job_id),
        Mode::Generate => {}
    }

    app.runner.check_health();
    for msg in args.input_messages() {
        app.dispatch(msg);
    }
    if !args.waits_for_document() {
        app.submit()?;
    }
    app.run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitingDocument,
    Running,
}

struct App {
    state: AppState,
    runner: EffectRunner,
    base_url: String,
    output: Option<PathBuf>,
    stage: Stage,
}

impl App {
    fn new(runner: EffectRunner, base_url: String, output: Option<PathBuf>) -> Self {
        Self {
            state: AppState::new(),
            runner,
            base_url,
            output,
            stage: Stage::AwaitingDocument,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.run(effects);
        if state.consume_dirty() {
            for line in render(&state.view(), &self.base_url) {
                println!("{line}");
            }
        }
        self.state = state;
    }

    fn submit(&mut self) -> anyhow::Result<()> {
        self.dispatch(Msg::SubmitClicked);
        if self.state.phase() != Phase::Submitting {
            bail!("nothing to submit: the input is empty");
        }
        self.stage = Stage::Running;
        Ok(())
    }

    /// Drives the lifecycle until the job ends and any download finishes.
    fn run(mut self) -> anyhow::Result<()> {
        loop {
            match self.runner.next(TICK)? {
                Some(Incoming::Msg(msg)) => self.dispatch(msg),
                Some(Incoming::Health(Ok(health))) if !health.is_healthy() => {
                    engine_warn!("Job service reports status {:?}", health.status);
                }
                Some(Incoming::Health(Ok(_))) => {}
                Some(Incoming::Health(Err(err))) => {
                    engine_warn!("Health check failed: {}", err);
                }
                Some(
                    Incoming::Downloaded(_) | Incoming::JobsListed(_) | Incoming::JobDeleted(_),
                ) => {}
                None => self.dispatch(Msg::Tick),
            }

            match self.stage {
                Stage::AwaitingDocument => {
                    if let Some(error) = self.state.error() {
                        bail!("{error}");
                    }
                    if self.state.view().document_name.is_some() {
                        self.submit()?;
                    }
                }
                Stage::Running => match self.state.phase() {
                    Phase::Idle => {
                        let error = self.state.error().unwrap_or("submission cancelled");
                        bail!("{error}");
                    }
                    Phase::Done => return self.finish(),
                    Phase::Submitting | Phase::Tracking => {}
                },
            }
        }
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        let Some(job) = self.state.snapshot() else {
            bail!("job ended without a status");
        };
        let job_id = job.job_id.clone();
        if job.status != JobStatusKind::Completed {
            let error = self
                .state
                .error()
                .unwrap_or(vidsimplify_core::GENERIC_FAILURE_MESSAGE);
            bail!("job {job_id} failed: {error}");
        }
        engine_info!("Job {} completed", job_id);

        match self.output.clone() {
            Some(dest) => {
                self.runner.download(&job_id, dest);
                self.run_download()
            }
            None => Ok(()),
        }
    }

    fn run_download(&mut self) -> anyhow::Result<()> {
        loop {
            match self.runner.next(TICK)? {
                Some(Incoming::Downloaded(result)) => {
                    let path = result.map_err(|message| anyhow!("download failed: {message}"))?;
                    println!("Saved video to {}", path.display());
                    return Ok(());
                }
                Some(Incoming::Msg(msg)) => self.dispatch(msg),
                Some(_) | None => {}
            }
        }
    }

    fn list_jobs(&self, limit: u32) -> anyhow::Result<()> {
        self.runner.list_jobs(limit);
        loop {
            if let Some(Incoming::JobsListed(result)) = self.runner.next(TICK)? {
                let list = result.context("cannot list jobs")?;
                for line in render_job_list(&list) {
                    println!("{line}");
                }
                return Ok(());
            }
        }
    }

    fn delete_job(&self, job_id: &str) -> anyhow::Result<()> {
        self.runner.delete_job(job_id);
        loop {
            if let Some(Incoming::JobDeleted(result)) = self.runner.next(TICK)? {
                result.with_context(|| format!("cannot delete job {job_id}"))?;
                println!("Deleted job {job_id}");
                return Ok(());
            }
        }
    }
}
