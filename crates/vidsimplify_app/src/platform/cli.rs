use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser, ValueEnum};
use engine_logging::LogDestination;
use vidsimplify_core::{CategoryKind, InputKind, Msg};
use vidsimplify_engine::{PollSettings, ServiceSettings};

/// Turn a text, a URL or a PDF into an explainer video.
#[derive(Debug, Parser)]
#[command(name = "vidsimplify", version)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["text", "url", "pdf", "list_jobs", "delete_job"])
))]
pub struct Args {
    /// Job service base URL.
    #[arg(long, env = "VIDSIMPLIFY_API_URL", default_value = "http://localhost:8000")]
    pub server: String,

    /// Visual style of the video.
    #[arg(long, value_enum, default_value_t = CategoryArg::TechSystem)]
    pub category: CategoryArg,

    /// Free text to explain.
    #[arg(long)]
    pub text: Option<String>,

    /// Page or repository URL to explain.
    #[arg(long)]
    pub url: Option<String>,

    /// PDF document to explain.
    #[arg(long)]
    pub pdf: Option<PathBuf>,

    /// Print the most recent jobs on the service and exit.
    #[arg(long, value_name = "LIMIT", num_args = 0..=1, default_missing_value = "50")]
    pub list_jobs: Option<u32>,

    /// Delete a job and its files from the service and exit.
    #[arg(long, value_name = "JOB_ID")]
    pub delete_job: Option<String>,

    /// Where to save the video once the job completes.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[arg(long, env = "VIDSIMPLIFY_POLL_INTERVAL_MS", default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// Give up after this many failed status checks in a row. Unlimited when omitted.
    #[arg(long)]
    pub max_poll_failures: Option<u32>,

    #[arg(long, value_enum, default_value_t = LogArg::File)]
    pub log: LogArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    TechSystem,
    ProductStartup,
    Mathematical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogArg {
    Terminal,
    File,
    Both,
}

impl From<CategoryArg> for CategoryKind {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::TechSystem => CategoryKind::TechSystem,
            CategoryArg::ProductStartup => CategoryKind::ProductStartup,
            CategoryArg::Mathematical => CategoryKind::Mathematical,
        }
    }
}

impl From<LogArg> for LogDestination {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::File => LogDestination::File,
            LogArg::Both => LogDestination::Both,
        }
    }
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Generate,
    ListJobs { limit: u32 },
    DeleteJob { job_id: String },
}

impl Args {
    pub fn mode(&self) -> Mode {
        if let Some(limit) = self.list_jobs {
            Mode::ListJobs { limit }
        } else if let Some(job_id) = &self.delete_job {
            Mode::DeleteJob {
                job_id: job_id.clone(),
            }
        } else {
            Mode::Generate
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            base_url: self.server.clone(),
            ..ServiceSettings::default()
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            max_consecutive_failures: self.max_poll_failures,
        }
    }

    pub fn waits_for_document(&self) -> bool {
        self.pdf.is_some()
    }

    /// Messages that fill in the input form before submitting.
    pub fn input_messages(&self) -> Vec<Msg> {
        let mut msgs = vec![Msg::CategorySelected(self.category.into())];
        if let Some(path) = &self.pdf {
            msgs.push(Msg::InputKindSelected(InputKind::PdfDocument));
            msgs.push(Msg::DocumentChosen {
                path: path.display().to_string(),
            });
        } else if let Some(url) = &self.url {
            msgs.push(Msg::InputKindSelected(InputKind::Url));
            msgs.push(Msg::ContentChanged(url.clone()));
        } else if let Some(text) = &self.text {
            msgs.push(Msg::InputKindSelected(InputKind::Text));
            msgs.push(Msg::ContentChanged(text.clone()));
        }
        msgs
    }
}
