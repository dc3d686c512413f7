//! Background playback jobs with a single "current playback" slot.
//!
//! ## Design
//!
//! - Jobs are identified by UUIDs
//! - At most one playback runs at a time; the configured [`OverlapPolicy`]
//!   decides whether a new request is rejected or preempts the running one
//! - Each job runs on its own tokio task and is stopped through a
//!   [`CancelHandle`]
//! - Failures inside a playback are logged and stored on the job; they never
//!   reach the caller that started it
//! - Finished jobs are kept for inspection, up to [`MAX_JOB_HISTORY`]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{OverlapPolicy, PlaybackConfig};
use crate::morse::MorseString;

use super::{
    prepare, CancelHandle, CancelToken, PlaybackDriver, PlaybackError, PlaybackOutcome,
    PlaybackTiming, VibrationDevice,
};

/// Maximum number of jobs remembered.
pub const MAX_JOB_HISTORY: usize = 50;

/// Playback job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is created, task not yet running.
    Pending,
    /// Job is currently vibrating.
    Running,
    /// Every pulse was played.
    Completed,
    /// The device failed mid-playback.
    Failed,
    /// Job was cancelled or preempted.
    Cancelled,
}

impl JobStatus {
    /// True once the job can no longer change.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Playback job information.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackJob {
    /// Unique job identifier.
    pub id: String,
    /// Current job status.
    pub status: JobStatus,
    /// Text as entered.
    pub text: String,
    /// Encoded message.
    pub morse: MorseString,
    /// Speed slider value used.
    pub speed: f32,
    /// Pulses the message consists of.
    pub total_pulses: usize,
    /// Pulses actually played (set when the job finishes).
    pub pulses_played: usize,
    /// Time when the job was created.
    pub created_at: DateTime<Utc>,
    /// Time when playback started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Time when the job finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Error message if the job failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlaybackJob {
    fn new(text: &str, morse: MorseString, speed: f32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Pending,
            text: text.to_string(),
            total_pulses: morse.pulse_count(),
            morse,
            speed,
            pulses_played: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }
}

/// Result of a cancel request.
#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    /// Whether a job was cancelled.
    pub success: bool,
    /// Message describing result.
    pub message: String,
}

/// The job currently holding the slot.
struct ActivePlayback {
    job_id: String,
    cancel: CancelHandle,
}

/// Coordinates playbacks on one vibration device.
pub struct PlaybackManager {
    device: Arc<dyn VibrationDevice>,
    settings: PlaybackConfig,
    /// All jobs indexed by ID.
    jobs: RwLock<HashMap<String, PlaybackJob>>,
    /// The single playback slot. Lock before `jobs` when taking both.
    active: Mutex<Option<ActivePlayback>>,
    /// Task of the most recently started job. The next job's task waits for
    /// it, so a preempted playback has stopped the device before new pulses.
    last_task: Mutex<Option<JoinHandle<()>>>,
    /// Bumped on every status change, for `wait`.
    changes: watch::Sender<u64>,
}

impl PlaybackManager {
    /// Creates a manager owning `device`.
    pub fn new(device: Arc<dyn VibrationDevice>, settings: PlaybackConfig) -> Arc<Self> {
        let (changes, _) = watch::channel(0);
        Arc::new(Self {
            device,
            settings,
            jobs: RwLock::new(HashMap::new()),
            active: Mutex::new(None),
            last_task: Mutex::new(None),
            changes,
        })
    }

    /// Name of the device being driven.
    #[must_use]
    pub fn device_name(&self) -> &'static str {
        self.device.name()
    }

    /// Starts playing `text` at `speed`.
    ///
    /// Validation happens before anything is queued: empty text, text with no
    /// encodable character and out-of-range speeds are rejected. If another
    /// playback is running the overlap policy applies; a preempting job stays
    /// pending until the preempted one has stopped the device. Must be called
    /// from within a tokio runtime.
    pub fn start(self: &Arc<Self>, text: &str, speed: f32) -> Result<PlaybackJob, PlaybackError> {
        let morse = prepare(text)?;
        let timing = PlaybackTiming::for_speed(&self.settings, speed)?;

        let job = PlaybackJob::new(text, morse.clone(), speed);
        let job_id = job.id.clone();
        let (handle, token) = CancelToken::pair();

        {
            let mut active = self.active();
            if let Some(current) = active.take() {
                match self.settings.overlap {
                    OverlapPolicy::Reject => {
                        let active_id = current.job_id.clone();
                        *active = Some(current);
                        return Err(PlaybackError::Busy { active: active_id });
                    }
                    OverlapPolicy::Preempt => {
                        info!(job_id = %current.job_id, "Preempting running playback");
                        current.cancel.cancel();
                        self.finish_job(&current.job_id, JobStatus::Cancelled, None, None);
                    }
                }
            }

            let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
            jobs.insert(job_id.clone(), job.clone());
            prune_history(&mut jobs);

            *active = Some(ActivePlayback {
                job_id: job_id.clone(),
                cancel: handle,
            });

            info!(%job_id, morse = %morse, speed, "Queued playback");

            let mut last_task = self.last_task.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = last_task.take();
            let manager = Arc::clone(self);
            *last_task = Some(tokio::spawn(async move {
                if let Some(previous) = previous {
                    let _ = previous.await;
                }
                manager.run(job_id, morse, timing, token).await;
            }));
        }
        self.notify();

        Ok(job)
    }

    /// Body of the playback task.
    async fn run(&self, job_id: String, morse: MorseString, timing: PlaybackTiming, token: CancelToken) {
        self.mark_running(&job_id);

        let driver = PlaybackDriver::new(Arc::clone(&self.device), timing);
        let result = driver.play(&morse, token).await;

        let mut active = self.active();
        if active.as_ref().is_some_and(|a| a.job_id == job_id) {
            *active = None;
        }

        match result {
            Ok(report) if report.outcome == PlaybackOutcome::Completed => {
                self.finish_job(&job_id, JobStatus::Completed, Some(report.pulses), None);
            }
            Ok(report) => {
                self.finish_job(&job_id, JobStatus::Cancelled, Some(report.pulses), None);
            }
            Err(err) => {
                error!(%job_id, error = %err, "Error during vibration");
                let pulses = match &err {
                    PlaybackError::Device { pulses_played, .. } => Some(*pulses_played),
                    _ => None,
                };
                self.finish_job(&job_id, JobStatus::Failed, pulses, Some(err.to_string()));
            }
        }
        drop(active);
        self.notify();
    }

    /// Cancels a pending or running job.
    pub fn cancel(&self, job_id: &str) -> CancelOutcome {
        let mut active = self.active();

        let Some(status) = self.get_job(job_id).map(|job| job.status) else {
            return CancelOutcome {
                success: false,
                message: "Playback not found".to_string(),
            };
        };

        if status.is_finished() {
            return CancelOutcome {
                success: false,
                message: format!("Cannot cancel playback with status: {status}"),
            };
        }

        if active.as_ref().is_some_and(|a| a.job_id == job_id) {
            if let Some(current) = active.take() {
                current.cancel.cancel();
            }
        }
        self.finish_job(job_id, JobStatus::Cancelled, None, None);
        drop(active);
        self.notify();

        info!(%job_id, "Playback cancelled");
        CancelOutcome {
            success: true,
            message: "Playback cancelled".to_string(),
        }
    }

    /// Cancels whatever is running, if anything.
    pub fn cancel_current(&self) -> CancelOutcome {
        let current = self.active().as_ref().map(|a| a.job_id.clone());
        match current {
            Some(job_id) => self.cancel(&job_id),
            None => CancelOutcome {
                success: false,
                message: "No playback is running".to_string(),
            },
        }
    }

    /// The job holding the slot, if any.
    pub fn current(&self) -> Option<PlaybackJob> {
        let job_id = self.active().as_ref().map(|a| a.job_id.clone())?;
        self.get_job(&job_id)
    }

    /// Gets a job by id.
    pub fn get_job(&self, job_id: &str) -> Option<PlaybackJob> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .cloned()
    }

    /// Lists all remembered jobs, newest first.
    pub fn list_jobs(&self) -> Vec<PlaybackJob> {
        let mut list: Vec<_> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// Waits until a job has finished and returns its final state.
    ///
    /// Returns `None` if the job is unknown.
    pub async fn wait(&self, job_id: &str) -> Option<PlaybackJob> {
        let mut changes = self.changes.subscribe();
        loop {
            let job = self.get_job(job_id)?;
            if job.status.is_finished() {
                return Some(job);
            }
            if changes.changed().await.is_err() {
                return self.get_job(job_id);
            }
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ActivePlayback>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }

    fn mark_running(&self, job_id: &str) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(job) = jobs.get_mut(job_id) {
            if job.status == JobStatus::Pending {
                job.status = JobStatus::Running;
                job.started_at = Some(Utc::now());
            }
        }
        drop(jobs);
        self.notify();
    }

    /// Moves a job to a final status. A job that already finished keeps its
    /// first final status.
    fn finish_job(
        &self,
        job_id: &str,
        status: JobStatus,
        pulses_played: Option<usize>,
        error: Option<String>,
    ) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let Some(job) = jobs.get_mut(job_id) else {
            warn!(%job_id, "Finished playback is no longer tracked");
            return;
        };
        if let Some(pulses) = pulses_played {
            job.pulses_played = pulses;
        }
        if job.status.is_finished() {
            return;
        }
        job.status = status;
        job.completed_at = Some(Utc::now());
        job.error = error;
    }
}

/// Drops the oldest finished jobs beyond [`MAX_JOB_HISTORY`].
fn prune_history(jobs: &mut HashMap<String, PlaybackJob>) {
    if jobs.len() <= MAX_JOB_HISTORY {
        return;
    }

    let mut finished: Vec<(DateTime<Utc>, String)> = jobs
        .values()
        .filter(|job| job.status.is_finished())
        .map(|job| (job.created_at, job.id.clone()))
        .collect();
    finished.sort();

    let excess = jobs.len() - MAX_JOB_HISTORY;
    for (_, job_id) in finished.into_iter().take(excess) {
        jobs.remove(&job_id);
    }
}
