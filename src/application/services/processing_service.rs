use std::sync::Arc;

use crate::application::ports::{JobPatch, JobRepository, RepositoryError};
use crate::application::services::JobScheduler;
use crate::domain::{Job, JobId, JobInput, JobStatus, StageStatus};

/// Public face of the pipeline: create a job, read its state, ask for a
/// retry. Never blocks on pipeline completion.
pub struct ProcessingService {
    job_repository: Arc<dyn JobRepository>,
    scheduler: Arc<JobScheduler>,
    max_retries: u32,
}

impl ProcessingService {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        scheduler: Arc<JobScheduler>,
        max_retries: u32,
    ) -> Self {
        Self {
            job_repository,
            scheduler,
            max_retries,
        }
    }

    /// Persists the initial record and fires the run; returns as soon as the
    /// record exists.
    #[tracing::instrument(skip_all)]
    pub async fn create_job(&self, input: JobInput) -> Result<JobId, RepositoryError> {
        let job = Job::new(input, self.max_retries);
        let id = job.id;

        self.job_repository.insert(&job).await?;
        if self.scheduler.claim(id) {
            self.scheduler.launch(id);
        }

        tracing::info!(job_id = %id.as_uuid(), "Processing job created");
        Ok(id)
    }

    /// Pure read; callers may poll this as often as they like.
    pub async fn job_status(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        self.job_repository.get(id).await
    }

    /// Restarts a failed job if retries remain. Returns false when the job is
    /// absent, not failed, out of retries, or a run is still active.
    #[tracing::instrument(skip(self), fields(job_id = %id.as_uuid()))]
    pub async fn retry_job(&self, id: JobId) -> Result<bool, RepositoryError> {
        let Some(job) = self.job_repository.get(id).await? else {
            return Ok(false);
        };
        if !job.can_retry() {
            return Ok(false);
        }

        // The run slot is claimed before the record is reset, so a retry can
        // never race a worker still finishing this id.
        if !self.scheduler.claim(id) {
            tracing::warn!("Retry requested while a run is still active");
            return Ok(false);
        }

        // An accepted retry reads as processing immediately; only the stage
        // goes back to pending.
        let patch = JobPatch::new()
            .status(JobStatus::Processing)
            .stage(StageStatus::Pending)
            .progress(0)
            .clear_error()
            .clear_transcript_url()
            .retry_count(job.retry_count + 1);

        if let Err(e) = self.job_repository.update(id, patch).await {
            self.scheduler.release(id);
            return Err(e);
        }

        self.scheduler.launch(id);
        tracing::info!(retry = job.retry_count + 1, "Processing job retried");
        Ok(true)
    }
}
