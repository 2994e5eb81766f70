#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vidsimplify_engine::{
    EngineEvent, EventSink, FailureKind, HealthStatus, JobList, JobService, NewJob, RemoteJob,
    RemoteStatus, ServiceError,
};

pub fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn job(job_id: &str, status: RemoteStatus, percentage: u8) -> RemoteJob {
    RemoteJob {
        job_id: job_id.to_string(),
        status,
        percentage,
        message: format!("{percentage}%"),
        created_at: "2026-10-19T08:00:00Z".to_string(),
        error: None,
    }
}

pub fn failed(job_id: &str, error: &str) -> RemoteJob {
    RemoteJob {
        error: Some(error.to_string()),
        ..job(job_id, RemoteStatus::Failed, 40)
    }
}

pub fn network_error() -> ServiceError {
    ServiceError {
        kind: FailureKind::Network,
        message: "connection reset".to_string(),
    }
}

struct Step {
    delay: Duration,
    result: Result<RemoteJob, ServiceError>,
}

/// Job service answering status requests from a per-job script. Once a
/// script runs out the job reports `pending`.
#[derive(Default)]
pub struct ScriptedService {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    create: Mutex<Option<Result<String, ServiceError>>>,
    status_calls: AtomicUsize,
    polled: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn then(&self, job_id: &str, result: Result<RemoteJob, ServiceError>) -> &Self {
        self.then_after(job_id, Duration::ZERO, result)
    }

    pub fn then_after(
        &self,
        job_id: &str,
        delay: Duration,
        result: Result<RemoteJob, ServiceError>,
    ) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default()
            .push_back(Step { delay, result });
        self
    }

    pub fn on_create(&self, result: Result<String, ServiceError>) {
        *self.create.lock().unwrap() = Some(result);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn polled_jobs(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }

    pub fn deleted_jobs(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobService for ScriptedService {
    async fn create_job(&self, _job: &NewJob) -> Result<String, ServiceError> {
        self.create
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok("job-1".to_string()))
    }

    async fn job_status(&self, job_id: &str) -> Result<RemoteJob, ServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.polled.lock().unwrap().push(job_id.to_string());
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(VecDeque::pop_front);
        match step {
            Some(step) => {
                if !step.delay.is_zero() {
                    tokio::time::sleep(step.delay).await;
                }
                step.result
            }
            None => Ok(job(job_id, RemoteStatus::Pending, 0)),
        }
    }

    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            timestamp: None,
        })
    }

    /// Every scripted job, reported as pending, in id order.
    async fn list_jobs(&self, limit: u32) -> Result<JobList, ServiceError> {
        let mut ids = self
            .scripts
            .lock()
            .unwrap()
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        ids.sort();
        let jobs = ids
            .iter()
            .take(limit as usize)
            .map(|id| job(id, RemoteStatus::Pending, 0))
            .collect::<Vec<_>>();
        Ok(JobList {
            total: jobs.len(),
            jobs,
        })
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), ServiceError> {
        if self.scripts.lock().unwrap().remove(job_id).is_none() {
            return Err(ServiceError {
                kind: FailureKind::HttpStatus(404),
                message: "Job not found".to_string(),
            });
        }
        self.deleted.lock().unwrap().push(job_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
