#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use samtale::application::ports::{
    BlobStore, BlobStoreError, Directory, DirectoryError, JobRepository, SessionStore,
    SessionStoreError, TranscriptionEngine, TranscriptionError,
};
use samtale::application::services::{JobScheduler, ProcessingService};
use samtale::domain::{
    Job, JobId, JobInput, NewSessionRecord, PatientId, SessionId, TherapistId,
};
use samtale::infrastructure::persistence::InMemoryJobRepository;

pub const PATIENT_EMAIL: &str = "noa@example.com";
pub const THERAPIST_EMAIL: &str = "dr.levi@example.com";

pub fn sample_input() -> JobInput {
    JobInput {
        patient_email: PATIENT_EMAIL.to_string(),
        therapist_email: THERAPIST_EMAIL.to_string(),
        session_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        session_notes: "Weekly session".to_string(),
        audio_url: "https://acct.blob.core.windows.net/sessions/recordings/session-001.wav"
            .to_string(),
    }
}

/// Transcription stub that plays back a scripted sequence of outcomes, then
/// keeps succeeding once the script runs out.
pub struct ScriptedEngine {
    outcomes: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedEngine {
    pub fn succeeding() -> Self {
        Self::with_outcomes(vec![])
    }

    pub fn with_outcomes(outcomes: Vec<Result<String, String>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
        }
    }
}

#[async_trait]
impl TranscriptionEngine for ScriptedEngine {
    async fn transcribe(&self, _audio_url: &str) -> Result<String, TranscriptionError> {
        let next = self.outcomes.lock().unwrap().pop_front();
        match next {
            Some(Ok(url)) => Ok(url),
            Some(Err(message)) => Err(TranscriptionError::TranscriptionFailed(message)),
            None => Ok("https://blobs.test/transcripts/session-001.wav.txt".to_string()),
        }
    }
}

/// Blob store stub that records every upload and signs URLs deterministically.
#[derive(Default)]
pub struct StubBlobStore {
    pub puts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl BlobStore for StubBlobStore {
    async fn put_text(&self, name: &str, content: &str) -> Result<String, BlobStoreError> {
        self.puts
            .lock()
            .unwrap()
            .push((name.to_string(), content.to_string()));
        Ok(format!("https://blobs.test/{}", name))
    }

    async fn signed_get_url(
        &self,
        name: &str,
        _expires_in: Duration,
    ) -> Result<String, BlobStoreError> {
        Ok(format!("https://blobs.test/{}?sig=stub", name))
    }
}

#[derive(Default)]
pub struct StubDirectory {
    pub patients: HashMap<String, i64>,
    pub therapists: HashMap<String, i64>,
}

impl StubDirectory {
    pub fn with_sample_people() -> Self {
        let mut directory = Self::default();
        directory.patients.insert(PATIENT_EMAIL.to_string(), 7);
        directory.therapists.insert(THERAPIST_EMAIL.to_string(), 3);
        directory
    }
}

#[async_trait]
impl Directory for StubDirectory {
    async fn patient_id_by_email(&self, email: &str) -> Result<Option<PatientId>, DirectoryError> {
        Ok(self.patients.get(email).copied().map(PatientId::from_i64))
    }

    async fn therapist_id_by_email(
        &self,
        email: &str,
    ) -> Result<Option<TherapistId>, DirectoryError> {
        Ok(self
            .therapists
            .get(email)
            .copied()
            .map(TherapistId::from_i64))
    }
}

/// Session store stub that records every insert.
#[derive(Default)]
pub struct RecordingSessionStore {
    pub inserted: Mutex<Vec<NewSessionRecord>>,
}

#[async_trait]
impl SessionStore for RecordingSessionStore {
    async fn insert_session(
        &self,
        record: &NewSessionRecord,
    ) -> Result<SessionId, SessionStoreError> {
        let mut inserted = self.inserted.lock().unwrap();
        inserted.push(record.clone());
        Ok(SessionId::from_i64(inserted.len() as i64))
    }
}

pub struct TestPipeline {
    pub repository: Arc<InMemoryJobRepository>,
    pub scheduler: Arc<JobScheduler>,
    pub service: ProcessingService,
    pub blob_store: Arc<StubBlobStore>,
    pub sessions: Arc<RecordingSessionStore>,
}

pub fn pipeline(engine: Arc<dyn TranscriptionEngine>) -> TestPipeline {
    pipeline_with(engine, Arc::new(StubDirectory::with_sample_people()), 3)
}

pub fn pipeline_with(
    engine: Arc<dyn TranscriptionEngine>,
    directory: Arc<dyn Directory>,
    max_retries: u32,
) -> TestPipeline {
    let repository = Arc::new(InMemoryJobRepository::new());
    let blob_store = Arc::new(StubBlobStore::default());
    let sessions = Arc::new(RecordingSessionStore::default());

    let scheduler = Arc::new(JobScheduler::new(
        repository.clone(),
        engine,
        blob_store.clone(),
        directory,
        sessions.clone(),
    ));

    let service = ProcessingService::new(repository.clone(), scheduler.clone(), max_retries);

    TestPipeline {
        repository,
        scheduler,
        service,
        blob_store,
        sessions,
    }
}

/// Polls the repository until the job reaches a terminal state.
pub async fn wait_for_terminal(repository: &Arc<InMemoryJobRepository>, id: JobId) -> Job {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(job) = repository.get(id).await.unwrap() {
            if job.status.is_terminal() {
                return job;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job never reached a terminal state"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
