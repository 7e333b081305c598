use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::Instrument;

use crate::application::ports::{
    BlobStore, Directory, DirectoryError, JobPatch, JobRepository, RepositoryError, SessionStore,
    SessionStoreError, TranscriptionEngine, TranscriptionError,
};
use crate::domain::{Job, JobId, JobStatus, NewSessionRecord, SessionId, StageStatus};

const PROGRESS_RUN_STARTED: u8 = 10;
const PROGRESS_STAGE_STARTED: u8 = 20;
const PROGRESS_STAGE_FAILED: u8 = 30;
const PROGRESS_STAGE_DONE: u8 = 60;
const PROGRESS_FINALIZING: u8 = 90;
const PROGRESS_DONE: u8 = 100;

/// Read access granted to the transcription backend on the source recording.
const RECORDING_SAS_TTL: Duration = Duration::from_secs(120 * 60);

enum RunState {
    /// Slot reserved; the worker task has not been spawned yet.
    Claimed,
    Running,
}

/// Drives one job per detached worker task through the pipeline stages,
/// persisting every transition. The registry of active runs is plain
/// instance state; its lock doubles as the guard that keeps a retry from
/// racing a worker that is still finishing the same id.
pub struct JobScheduler {
    job_repository: Arc<dyn JobRepository>,
    transcription_engine: Arc<dyn TranscriptionEngine>,
    blob_store: Arc<dyn BlobStore>,
    directory: Arc<dyn Directory>,
    session_store: Arc<dyn SessionStore>,
    active: Mutex<HashMap<JobId, RunState>>,
}

impl JobScheduler {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        transcription_engine: Arc<dyn TranscriptionEngine>,
        blob_store: Arc<dyn BlobStore>,
        directory: Arc<dyn Directory>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            job_repository,
            transcription_engine,
            blob_store,
            directory,
            session_store,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Reserves the run slot for `id`. Returns false when a run is already
    /// claimed or executing, which is how at-most-one-run-per-id is enforced.
    pub fn claim(&self, id: JobId) -> bool {
        let mut active = self.active.lock().expect("run registry lock poisoned");
        match active.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(RunState::Claimed);
                true
            }
        }
    }

    /// Drops a claim that never launched (e.g. the retry reset failed to
    /// persist).
    pub fn release(&self, id: JobId) {
        self.active
            .lock()
            .expect("run registry lock poisoned")
            .remove(&id);
    }

    /// Spawns the detached worker for a previously claimed id. The task owns
    /// the job until it reaches a terminal state; nothing joins it.
    pub fn launch(self: &Arc<Self>, id: JobId) {
        {
            let mut active = self.active.lock().expect("run registry lock poisoned");
            active.insert(id, RunState::Running);
        }
        let scheduler = Arc::clone(self);
        let span = tracing::info_span!("processing_job", job_id = %id.as_uuid());
        tokio::spawn(async move { scheduler.run_job(id).await }.instrument(span));
    }

    async fn run_job(self: Arc<Self>, id: JobId) {
        if let Err(e) = self.execute_run(id).await {
            // Last-resort terminal write: a run must never strand the job in
            // a processing state.
            tracing::error!(error = %e, "Job run aborted before reaching a terminal state");
            let patch = JobPatch::new()
                .status(JobStatus::Failed)
                .error(format!("processing failed: {}", e));
            if let Err(persist) = self.job_repository.update(id, patch).await {
                tracing::error!(error = %persist, "Failed to persist terminal failure");
            }
        }
        self.release(id);
    }

    async fn execute_run(&self, id: JobId) -> Result<(), RunError> {
        let job = self
            .job_repository
            .get(id)
            .await?
            .ok_or(RunError::MissingJob)?;

        self.job_repository
            .update(
                id,
                JobPatch::new()
                    .status(JobStatus::Processing)
                    .progress(PROGRESS_RUN_STARTED),
            )
            .await?;

        self.job_repository
            .update(
                id,
                JobPatch::new()
                    .stage(StageStatus::Processing)
                    .progress(PROGRESS_STAGE_STARTED),
            )
            .await?;

        let (transcript_url, stage_error) = match self.run_transcription(&job).await {
            Ok(url) => {
                tracing::info!("Transcription stage completed");
                self.job_repository
                    .update(
                        id,
                        JobPatch::new()
                            .transcript_url(url.clone())
                            .stage(StageStatus::Completed)
                            .progress(PROGRESS_STAGE_DONE),
                    )
                    .await?;
                self.job_repository
                    .update(id, JobPatch::new().progress(PROGRESS_FINALIZING))
                    .await?;
                (Some(url), None)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "Transcription stage failed");
                self.job_repository
                    .update(
                        id,
                        JobPatch::new()
                            .stage(StageStatus::Failed)
                            .error(message.clone())
                            .progress(PROGRESS_STAGE_FAILED),
                    )
                    .await?;
                (None, Some(message))
            }
        };

        // Finalization runs even after a failed stage: the uploaded audio is
        // still worth a session record.
        let finalized = self.finalize(&job, transcript_url.as_deref()).await;

        let terminal = match (stage_error, finalized) {
            (None, Ok(session_id)) => {
                tracing::info!(session_id = session_id.as_i64(), "Job completed");
                JobPatch::new()
                    .status(JobStatus::Completed)
                    .progress(PROGRESS_DONE)
                    .completed_at(Utc::now())
            }
            (None, Err(e)) => {
                tracing::warn!(error = %e, "Finalization failed after successful stage");
                JobPatch::new()
                    .status(JobStatus::Failed)
                    .error(format!("finalization failed: {}", e))
            }
            (Some(message), finalized) => {
                if let Err(e) = finalized {
                    tracing::warn!(error = %e, "Finalization also failed after stage failure");
                }
                JobPatch::new().status(JobStatus::Failed).error(message)
            }
        };

        self.job_repository.update(id, terminal).await?;
        Ok(())
    }

    async fn run_transcription(&self, job: &Job) -> Result<String, TranscriptionError> {
        let blob_name = recording_blob_name(&job.input.audio_url)?;
        let sas_url = self
            .blob_store
            .signed_get_url(&blob_name, RECORDING_SAS_TTL)
            .await
            .map_err(|e| TranscriptionError::InvalidAudioSource(e.to_string()))?;

        self.transcription_engine.transcribe(&sas_url).await
    }

    async fn finalize(
        &self,
        job: &Job,
        transcript_url: Option<&str>,
    ) -> Result<SessionId, FinalizationError> {
        let patient_id = self
            .directory
            .patient_id_by_email(&job.input.patient_email)
            .await?
            .ok_or_else(|| FinalizationError::UnknownPatient(job.input.patient_email.clone()))?;

        let therapist_id = self
            .directory
            .therapist_id_by_email(&job.input.therapist_email)
            .await?
            .ok_or_else(|| {
                FinalizationError::UnknownTherapist(job.input.therapist_email.clone())
            })?;

        let record = NewSessionRecord {
            patient_id,
            therapist_id,
            session_date: job.input.session_date,
            session_notes: job.input.session_notes.clone(),
            audio_url: job.input.audio_url.clone(),
            transcript_url: transcript_url.map(String::from),
        };

        Ok(self.session_store.insert_session(&record).await?)
    }
}

/// Blob name of the source recording, derived the same way the upload route
/// names it: last path segment of the audio URL under `recordings/`. A URL
/// with no file segment is rejected here rather than left to fail signing.
fn recording_blob_name(audio_url: &str) -> Result<String, TranscriptionError> {
    let path = audio_url.split('?').next().unwrap_or(audio_url);
    path.rsplit('/')
        .next()
        .filter(|file| !file.is_empty())
        .map(|file| format!("recordings/{}", file))
        .ok_or_else(|| TranscriptionError::InvalidAudioSource(audio_url.to_string()))
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("job record missing")]
    MissingJob,
}

#[derive(Debug, thiserror::Error)]
enum FinalizationError {
    #[error("unknown patient email: {0}")]
    UnknownPatient(String),
    #[error("unknown therapist email: {0}")]
    UnknownTherapist(String),
    #[error("directory lookup: {0}")]
    Directory(#[from] DirectoryError),
    #[error("session save: {0}")]
    Store(#[from] SessionStoreError),
}
