use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Job, JobId, JobStatus, StageStatus};

use super::RepositoryError;

/// Partial mutation of a job record. Only the fields that are set are
/// written; the repository refreshes `updated_at` on every update.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub transcription_status: Option<StageStatus>,
    pub progress: Option<u8>,
    pub transcript_url: Option<Option<String>>,
    pub last_error: Option<Option<String>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: Option<u32>,
}

impl JobPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn stage(mut self, status: StageStatus) -> Self {
        self.transcription_status = Some(status);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn transcript_url(mut self, url: impl Into<String>) -> Self {
        self.transcript_url = Some(Some(url.into()));
        self
    }

    pub fn clear_transcript_url(mut self) -> Self {
        self.transcript_url = Some(None);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(Some(message.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.last_error = Some(None);
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Creates a new record; `DuplicateId` if the id already exists.
    async fn insert(&self, job: &Job) -> Result<(), RepositoryError>;

    async fn get(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    /// Applies a partial mutation atomically; `NotFound` if no such id.
    async fn update(&self, id: JobId, patch: JobPatch) -> Result<(), RepositoryError>;
}
