use chrono::{DateTime, NaiveDate, Utc};

use super::{JobId, JobStatus, StageStatus};

/// Immutable reference to the external work item: the uploaded recording and
/// the metadata it was correlated with at upload time.
#[derive(Debug, Clone)]
pub struct JobInput {
    pub patient_email: String,
    pub therapist_email: String,
    pub session_date: NaiveDate,
    pub session_notes: String,
    pub audio_url: String,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub input: JobInput,
    pub transcript_url: Option<String>,
    pub status: JobStatus,
    pub transcription_status: StageStatus,
    pub progress: u8,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl Job {
    pub fn new(input: JobInput, max_retries: u32) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            input,
            transcript_url: None,
            status: JobStatus::Pending,
            transcription_status: StageStatus::Pending,
            progress: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            retry_count: 0,
            max_retries,
        }
    }

    pub fn can_retry(&self) -> bool {
        self.status == JobStatus::Failed && self.retry_count < self.max_retries
    }
}
