use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::ports::{JobPatch, JobRepository, RepositoryError};
use crate::domain::{Job, JobId};

/// Job store backed by a plain map. Used by the test suite and for running
/// the service without a database; the scheduler's single-writer-per-id
/// guarantee makes a mutexed map sufficient.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn insert(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.lock().expect("job map lock poisoned");
        if jobs.contains_key(&job.id) {
            return Err(RepositoryError::DuplicateId(job.id.as_uuid().to_string()));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let jobs = self.jobs.lock().expect("job map lock poisoned");
        Ok(jobs.get(&id).cloned())
    }

    async fn update(&self, id: JobId, patch: JobPatch) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.lock().expect("job map lock poisoned");
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.as_uuid().to_string()))?;

        if let Some(status) = patch.status {
            job.status = status;
        }
        if let Some(stage) = patch.transcription_status {
            job.transcription_status = stage;
        }
        if let Some(progress) = patch.progress {
            job.progress = progress;
        }
        if let Some(url) = patch.transcript_url {
            job.transcript_url = url;
        }
        if let Some(error) = patch.last_error {
            job.last_error = error;
        }
        if let Some(at) = patch.completed_at {
            job.completed_at = Some(at);
        }
        if let Some(count) = patch.retry_count {
            job.retry_count = count;
        }
        job.updated_at = Utc::now();

        Ok(())
    }
}
