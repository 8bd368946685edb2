//! Job Scheduler
//!
//! Admission control plus a bounded-concurrency FIFO queue owning the
//! lifecycle of every training job. A submission runs through the
//! validator and splitter; if admissible it becomes a `Queued` job that
//! is either dispatched immediately (free slot) or appended to the wait
//! queue with a 1-indexed position.
//!
//! All scheduler state lives behind a single mutex, so dispatch and
//! completion are mutually exclusive critical sections. Each dispatched
//! job runs the executor on its own worker thread; the executor boundary
//! is wrapped in `catch_unwind`, so one bad job frees its slot and the
//! queue keeps draining. Status and queue queries are lock-and-clone
//! reads that never wait on running jobs.
//!
//! Legal transitions are exactly `Queued -> Running -> {Completed,
//! Failed}`; there is no cancellation or preemption path.


use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::{AnnotationMap, DatasetInfo, ImageMeta, SplitCategory, TrainConfig};
use crate::executor::{ProgressEvent, TrainingExecutor, TrainingOutcome};
use crate::registry::ModelRegistry;
use crate::split::{split, DatasetSplit, SplitRejection};
use crate::validate::{validate, QualityFlags, ValidationReport};

/// Training job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting for a free execution slot
    Queued,
    /// Executing on a worker thread
    Running,
    /// Finished successfully; metrics and model id recorded
    Completed,
    /// Finished with an error; reason recorded
    Failed,
}

impl JobStatus {
    /// Check if transition to target status is legal
    pub fn can_transition_to(self, target: JobStatus) -> bool {
        matches!(
            (self, target),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }

    /// Whether this status is terminal
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Display name
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A timestamped job log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// A training job owned by the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingJob {
    /// Opaque unique identifier assigned at submission
    pub id: String,
    /// Lifecycle state
    pub status: JobStatus,
    /// Percent complete, monotonically non-decreasing while running
    pub progress: u8,
    /// 1-indexed rank among queued jobs; `None` unless `Queued`
    pub queue_position: Option<usize>,
    /// Hyperparameters (opaque to the scheduler)
    pub config: TrainConfig,
    /// Dataset summary from admission
    pub dataset_info: DatasetInfo,
    /// Append-only event log
    pub logs: Vec<LogEntry>,
    /// Final metric bundle; present only when `Completed`
    pub metrics: Option<HashMap<String, f64>>,
    /// Registry id of the produced model; present only when `Completed`
    pub model_id: Option<String>,
    /// Failure reason; present only when `Failed`
    pub error: Option<String>,
    /// Epoch the executor last reported
    pub current_epoch: u32,
    /// Total epochs configured
    pub total_epochs: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Advisory start hint for queued jobs, not a guarantee
    pub estimated_start: Option<DateTime<Utc>>,
}

impl TrainingJob {
    fn new(id: String, config: TrainConfig, dataset_info: DatasetInfo) -> Self {
        let total_epochs = config.epochs;
        Self {
            id,
            status: JobStatus::Queued,
            progress: 0,
            queue_position: None,
            config,
            dataset_info,
            logs: Vec::new(),
            metrics: None,
            model_id: None,
            error: None,
            current_epoch: 0,
            total_epochs,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            estimated_start: None,
        }
    }

    fn push_log(&mut self, message: impl Into<String>) {
        self.logs.push(LogEntry { timestamp: Utc::now(), message: message.into() });
    }

    /// The most recent `n` log entries
    #[must_use]
    pub fn recent_logs(&self, n: usize) -> Vec<LogEntry> {
        let skip = self.logs.len().saturating_sub(n);
        self.logs[skip..].to_vec()
    }

    /// Advisory seconds-remaining hint extrapolated from elapsed progress
    ///
    /// `None` unless the job is running and has made measurable progress.
    #[must_use]
    pub fn estimated_time_remaining(&self) -> Option<i64> {
        if self.status != JobStatus::Running || self.progress == 0 {
            return None;
        }
        let elapsed = (Utc::now() - self.started_at?).num_seconds();
        if elapsed <= 0 {
            return None;
        }
        Some(elapsed * i64::from(100 - self.progress) / i64::from(self.progress))
    }
}

/// Per-job line in the queue overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub queue_position: Option<usize>,
    pub created_at: DateTime<Utc>,
}

impl From<&TrainingJob> for JobSummary {
    fn from(job: &TrainingJob) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status,
            progress: job.progress,
            queue_position: job.queue_position,
            created_at: job.created_at,
        }
    }
}

/// Snapshot of scheduler occupancy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueOverview {
    /// Jobs currently running
    pub active_jobs: usize,
    /// Configured concurrency bound
    pub max_concurrent: usize,
    /// Jobs waiting in the queue
    pub queued_jobs: usize,
    /// All jobs known to the scheduler, any state
    pub total_jobs: usize,
    /// Per-job summaries, submission order
    pub jobs: Vec<JobSummary>,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum jobs in `Running` at once
    pub max_concurrent: usize,
    /// Fixed per-job duration estimate feeding the advisory start hint
    pub job_duration_estimate_secs: u64,
    /// How many log lines a status query returns
    pub log_tail: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_concurrent: 2, job_duration_estimate_secs: 600, log_tail: 50 }
    }
}

impl SchedulerConfig {
    /// Set the concurrency bound (clamped to at least 1)
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Set the per-job duration estimate
    pub fn with_job_duration_estimate_secs(mut self, secs: u64) -> Self {
        self.job_duration_estimate_secs = secs;
        self
    }

    /// Set the status-query log tail length
    pub fn with_log_tail(mut self, n: usize) -> Self {
        self.log_tail = n;
        self
    }
}

/// A training submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Defined class names
    pub classes: Vec<String>,
    /// Dataset images
    pub images: Vec<ImageMeta>,
    /// Annotations keyed by image id
    pub annotations: AnnotationMap,
    /// Hyperparameters
    pub config: TrainConfig,
    /// Explicit per-image split assignments
    pub categories: HashMap<String, SplitCategory>,
}

/// Errors that reject a submission before a job is created
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Dataset validation produced blocking errors
    #[error("Dataset rejected: {}", .0.errors.join("; "))]
    Rejected(ValidationReport),

    /// The train/val split cannot support training
    #[error(transparent)]
    BadSplit(#[from] SplitRejection),
}

/// Successful submission: job snapshot plus advisory validation output
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    /// The created job as of submission time
    pub job: TrainingJob,
    /// Advisory validation warnings
    pub warnings: Vec<String>,
    /// Informational validation notes
    pub info: Vec<String>,
    /// Derived quality flags
    pub quality: QualityFlags,
    /// Dataset summary
    pub dataset_info: DatasetInfo,
}

/// Mutable scheduler state, guarded by a single mutex
struct SchedulerState {
    /// Every job ever submitted, keyed by id
    jobs: HashMap<String, TrainingJob>,
    /// FIFO wait queue of job ids
    queue: VecDeque<String>,
    /// Ids currently running
    running: HashSet<String>,
    /// Dataset splits held for queued jobs until dispatch
    payloads: HashMap<String, DatasetSplit>,
    next_job_id: u64,
}

impl SchedulerState {
    fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            queue: VecDeque::new(),
            running: HashSet::new(),
            payloads: HashMap::new(),
            next_job_id: 1,
        }
    }
}

/// Bounded-concurrency training-job scheduler
///
/// Cheap to clone; clones share the same state, executor, and registry.
#[derive(Clone)]
pub struct TrainingScheduler {
    state: Arc<Mutex<SchedulerState>>,
    executor: Arc<dyn TrainingExecutor>,
    registry: Arc<ModelRegistry>,
    config: SchedulerConfig,
}

impl TrainingScheduler {
    /// Create a scheduler over the given executor and registry
    pub fn new(
        config: SchedulerConfig,
        executor: Arc<dyn TrainingExecutor>,
        registry: Arc<ModelRegistry>,
    ) -> Self {
        Self { state: Arc::new(Mutex::new(SchedulerState::new())), executor, registry, config }
    }

    /// Scheduler configuration
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The registry this scheduler records completed models in
    #[must_use]
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    // A worker can only panic outside the executor boundary if a log
    // formatter panics; recovering the guard keeps reads available.
    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate, split, and admit a dataset as a training job
    ///
    /// Blocking validation errors and unusable splits reject the
    /// submission synchronously; no job is created. An admitted job is
    /// dispatched immediately when a slot is free, otherwise queued FIFO.
    pub fn submit(&self, request: SubmitRequest) -> Result<SubmitReceipt, SubmitError> {
        let report = validate(&request.classes, &request.images, &request.annotations);
        if !report.is_admissible() {
            return Err(SubmitError::Rejected(report));
        }

        let dataset_split = split(&request.images, &request.annotations, &request.categories);
        dataset_split.admissibility()?;
        let dataset_info = dataset_split.info(&request.classes);

        let mut state = self.lock_state();
        let id = format!("job-{}", state.next_job_id);
        state.next_job_id += 1;

        let mut job = TrainingJob::new(id.clone(), request.config, dataset_info.clone());
        job.push_log("Job accepted");
        let mut payload = Some(dataset_split);

        let dispatch_now = state.running.len() < self.config.max_concurrent;
        if dispatch_now {
            job.status = JobStatus::Running;
            job.started_at = Some(Utc::now());
            job.push_log("Training started");
            state.running.insert(id.clone());
        } else {
            state.queue.push_back(id.clone());
            let position = state.queue.len();
            job.queue_position = Some(position);
            job.estimated_start = Some(
                Utc::now()
                    + Duration::seconds(
                        (self.config.job_duration_estimate_secs * position as u64) as i64,
                    ),
            );
            job.push_log(format!("Queued at position {position}"));
            if let Some(dataset_split) = payload.take() {
                state.payloads.insert(id.clone(), dataset_split);
            }
        }

        state.jobs.insert(id.clone(), job.clone());
        drop(state);

        if dispatch_now {
            if let Some(dataset_split) = payload.take() {
                self.spawn_worker(id, dataset_split);
            }
        }

        Ok(SubmitReceipt {
            job,
            warnings: report.warnings,
            info: report.info,
            quality: report.stats.quality,
            dataset_info,
        })
    }

    /// Snapshot of a job by id
    ///
    /// A pure read: clones from the job table without waiting on any
    /// running job. Terminal jobs return the same metrics/model id on
    /// every call.
    #[must_use]
    pub fn status(&self, job_id: &str) -> Option<TrainingJob> {
        self.lock_state().jobs.get(job_id).cloned()
    }

    /// Occupancy snapshot plus per-job summaries in submission order
    #[must_use]
    pub fn queue_overview(&self) -> QueueOverview {
        let state = self.lock_state();
        let mut jobs: Vec<JobSummary> = state.jobs.values().map(JobSummary::from).collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        QueueOverview {
            active_jobs: state.running.len(),
            max_concurrent: self.config.max_concurrent,
            queued_jobs: state.queue.len(),
            total_jobs: state.jobs.len(),
            jobs,
        }
    }

    fn spawn_worker(&self, job_id: String, dataset_split: DatasetSplit) {
        let scheduler = self.clone();
        thread::spawn(move || scheduler.run_job(&job_id, &dataset_split));
    }

    /// Worker-thread body: drive the executor, then settle the job
    fn run_job(&self, job_id: &str, dataset_split: &DatasetSplit) {
        let config = {
            let state = self.lock_state();
            match state.jobs.get(job_id) {
                Some(job) => job.config.clone(),
                None => return,
            }
        };

        let result = catch_unwind(AssertUnwindSafe(|| {
            self.executor.run(dataset_split, &config, &mut |event| {
                self.record_progress(job_id, event);
            })
        }));

        let outcome = match result {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => Err(e.to_string()),
            Err(panic) => Err(panic_reason(panic.as_ref())),
        };
        self.finish(job_id, outcome);
    }

    /// Forward a progress event into the job record
    ///
    /// Progress is clamped monotonic; events for non-running jobs are
    /// dropped.
    fn record_progress(&self, job_id: &str, event: ProgressEvent) {
        let mut state = self.lock_state();
        if let Some(job) = state.jobs.get_mut(job_id) {
            if job.status != JobStatus::Running {
                return;
            }
            job.progress = job.progress.max(event.progress.min(99));
            job.current_epoch = event.epoch;
            job.total_epochs = event.total_epochs;
            job.push_log(event.message);
        }
    }

    /// Settle a finished job, free its slot, and drain the queue
    fn finish(&self, job_id: &str, outcome: Result<TrainingOutcome, String>) {
        // Registry write happens outside the scheduler lock.
        let settled = match outcome {
            Ok(training_outcome) => {
                let job_context = {
                    let state = self.lock_state();
                    state
                        .jobs
                        .get(job_id)
                        .map(|job| (job.config.clone(), job.dataset_info.classes.clone()))
                };
                match job_context {
                    Some((config, classes)) => self
                        .registry
                        .register(job_id, config, classes, training_outcome)
                        .map_err(|e| format!("model registration failed: {e}")),
                    None => Err("job record disappeared".to_string()),
                }
            }
            Err(reason) => Err(reason),
        };

        let mut state = self.lock_state();
        if let Some(job) = state.jobs.get_mut(job_id) {
            match &settled {
                Ok(record) => {
                    if job.status.can_transition_to(JobStatus::Completed) {
                        job.status = JobStatus::Completed;
                        job.progress = 100;
                        job.metrics = Some(record.metrics.clone());
                        job.model_id = Some(record.id.clone());
                        job.completed_at = Some(Utc::now());
                        job.push_log(format!("Training complete, model {} registered", record.id));
                    }
                }
                Err(reason) => {
                    if job.status.can_transition_to(JobStatus::Failed) {
                        job.status = JobStatus::Failed;
                        job.error = Some(reason.clone());
                        job.completed_at = Some(Utc::now());
                        job.push_log(format!("Training failed: {reason}"));
                    }
                }
            }
        }
        state.running.remove(job_id);

        let next = Self::advance_queue(&mut state, self.config.max_concurrent);
        drop(state);

        if let Some((id, dataset_split)) = next {
            self.spawn_worker(id, dataset_split);
        }
    }

    /// Pop the queue head into a free slot and renumber the rest
    fn advance_queue(
        state: &mut SchedulerState,
        max_concurrent: usize,
    ) -> Option<(String, DatasetSplit)> {
        loop {
            if state.running.len() >= max_concurrent {
                return None;
            }
            let next_id = state.queue.pop_front()?;

            let waiting: Vec<String> = state.queue.iter().cloned().collect();
            for (i, id) in waiting.iter().enumerate() {
                if let Some(job) = state.jobs.get_mut(id) {
                    job.queue_position = Some(i + 1);
                }
            }

            let Some(dataset_split) = state.payloads.remove(&next_id) else {
                // Queued without a payload is an internal inconsistency;
                // settle the job and keep draining.
                if let Some(job) = state.jobs.get_mut(&next_id) {
                    job.status = JobStatus::Failed;
                    job.error = Some("internal: dataset payload missing".to_string());
                    job.completed_at = Some(Utc::now());
                    job.queue_position = None;
                }
                continue;
            };

            if let Some(job) = state.jobs.get_mut(&next_id) {
                if job.status.can_transition_to(JobStatus::Running) {
                    job.status = JobStatus::Running;
                    job.queue_position = None;
                    job.estimated_start = None;
                    job.started_at = Some(Utc::now());
                    job.push_log("Training started");
                }
            }
            state.running.insert(next_id.clone());
            return Some((next_id, dataset_split));
        }
    }
}

fn panic_reason(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "executor panicked".to_string()
    }
}
