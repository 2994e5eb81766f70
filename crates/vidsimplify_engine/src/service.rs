use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, short_job_id};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::persist::AtomicFileWriter;
use crate::{
    DownloadError, FailureKind, HealthStatus, JobList, NewJob, PersistError, RemoteJob,
    RemoteStatus, ServiceError,
};

const JOBS_PATH: &str = "/api/jobs";
const VIDEOS_PATH: &str = "/api/videos";
const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// `None` leaves the transport default in place. Status polls rely on
    /// this: a hung fetch only delays its own tick.
    pub request_timeout: Option<Duration>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

/// The remote job-processing service.
#[async_trait::async_trait]
pub trait JobService: Send + Sync {
    /// Creates a job and returns its id.
    async fn create_job(&self, job: &NewJob) -> Result<String, ServiceError>;

    async fn job_status(&self, job_id: &str) -> Result<RemoteJob, ServiceError>;

    async fn health(&self) -> Result<HealthStatus, ServiceError>;

    /// Up to `limit` most recent jobs.
    async fn list_jobs(&self, limit: u32) -> Result<JobList, ServiceError>;

    /// Removes a job and its files from the service.
    async fn delete_job(&self, job_id: &str) -> Result<(), ServiceError>;

    /// Optional: stores the rendered video of a completed job at `dest`.
    async fn download_video(&self, _job_id: &str, _dest: &Path) -> Result<PathBuf, DownloadError> {
        Err(DownloadError::Unsupported)
    }
}

/// Playback/download URL of a job's video. Needs no round trip.
pub fn video_url(base_url: &str, job_id: &str) -> String {
    format!("{}{}/{}", base_url.trim_end_matches('/'), VIDEOS_PATH, job_id)
}

#[derive(Debug, Deserialize)]
struct CreatedJobResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct ProgressBody {
    #[serde(default)]
    percentage: f64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    job_id: String,
    status: RemoteStatus,
    progress: ProgressBody,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    error: Option<String>,
}

impl From<JobStatusResponse> for RemoteJob {
    fn from(body: JobStatusResponse) -> Self {
        Self {
            job_id: body.job_id,
            status: body.status,
            percentage: clamp_percentage(body.progress.percentage),
            message: body.progress.message,
            created_at: body.created_at,
            error: body.error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobListResponse {
    total: usize,
    jobs: Vec<JobStatusResponse>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestJobService {
    base_url: String,
    client: reqwest::Client,
}

impl ReqwestJobService {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let parsed = reqwest::Url::parse(&settings.base_url)
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ServiceError::new(
                FailureKind::InvalidUrl,
                format!("unsupported scheme {}", parsed.scheme()),
            ));
        }

        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn video_url(&self, job_id: &str) -> String {
        video_url(&self.base_url, job_id)
    }
}

#[async_trait::async_trait]
impl JobService for ReqwestJobService {
    async fn create_job(&self, job: &NewJob) -> Result<String, ServiceError> {
        let url = format!("{}{}", self.base_url, VIDEOS_PATH);
        engine_debug!(
            "POST {} input_type={:?} category={:?} content_len={}",
            url,
            job.input_type,
            job.category,
            job.content.len()
        );
        let response = self
            .client
            .post(&url)
            .json(job)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let created: CreatedJobResponse = response.json().await.map_err(|err| {
            ServiceError::new(
                FailureKind::MalformedResponse,
                format!("failed to parse job creation response: {err}"),
            )
        })?;
        if created.job_id.is_empty() {
            return Err(ServiceError::new(
                FailureKind::MalformedResponse,
                "service returned an empty job id",
            ));
        }
        engine_info!("Created job {}", short_job_id(&created.job_id));
        Ok(created.job_id)
    }

    async fn job_status(&self, job_id: &str) -> Result<RemoteJob, ServiceError> {
        let url = format!("{}{}/{}", self.base_url, JOBS_PATH, job_id);
        let response = self.client.get(&url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let body: JobStatusResponse = response.json().await.map_err(|err| {
            ServiceError::new(
                FailureKind::MalformedResponse,
                format!("failed to parse job status: {err}"),
            )
        })?;
        Ok(body.into())
    }

    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let response = self.client.get(&url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|err| ServiceError::new(FailureKind::MalformedResponse, err.to_string()))
    }

    async fn list_jobs(&self, limit: u32) -> Result<JobList, ServiceError> {
        let url = format!("{}{}?limit={}", self.base_url, JOBS_PATH, limit);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let body: JobListResponse = response.json().await.map_err(|err| {
            ServiceError::new(
                FailureKind::MalformedResponse,
                format!("failed to parse job list: {err}"),
            )
        })?;
        Ok(JobList {
            total: body.total,
            jobs: body.jobs.into_iter().map(RemoteJob::from).collect(),
        })
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), ServiceError> {
        let url = format!("{}{}/{}", self.base_url, JOBS_PATH, job_id);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        engine_info!("Deleted job {}", short_job_id(job_id));
        Ok(())
    }

    async fn download_video(&self, job_id: &str, dest: &Path) -> Result<PathBuf, DownloadError> {
        let (writer, filename) = AtomicFileWriter::for_path(dest).ok_or_else(|| {
            PersistError::OutputDir(format!("not a file path: {}", dest.display()))
        })?;
        let url = self.video_url(job_id);
        let response = self.client.get(&url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let mut pending = writer.begin(&filename)?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            pending.write_chunk(&chunk)?;
            written += chunk.len() as u64;
        }
        let path = pending.commit()?;
        engine_info!(
            "Downloaded video for job {} ({} bytes) to {:?}",
            short_job_id(job_id),
            written,
            path
        );
        Ok(path)
    }
}

/// Turns a non-2xx response into an error, preferring the service's
/// `{"detail": ...}` message over the raw body.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.detail,
        Err(_) if !text.trim().is_empty() => text,
        Err(_) => status.to_string(),
    };
    Err(ServiceError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

fn clamp_percentage(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).floor() as u8
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}
