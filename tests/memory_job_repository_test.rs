use samtale::application::ports::{JobPatch, JobRepository, RepositoryError};
use samtale::domain::{Job, JobId, JobInput, JobStatus, StageStatus};
use samtale::infrastructure::persistence::InMemoryJobRepository;

use chrono::{NaiveDate, Utc};

fn sample_job() -> Job {
    Job::new(
        JobInput {
            patient_email: "noa@example.com".to_string(),
            therapist_email: "dr.levi@example.com".to_string(),
            session_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            session_notes: "Weekly session".to_string(),
            audio_url: "https://acct.blob.core.windows.net/sessions/recordings/a.wav".to_string(),
        },
        3,
    )
}

#[tokio::test]
async fn given_an_inserted_job_when_fetched_then_fields_round_trip() {
    let repository = InMemoryJobRepository::new();
    let job = sample_job();

    repository.insert(&job).await.unwrap();
    let fetched = repository.get(job.id).await.unwrap().unwrap();

    assert_eq!(fetched.id, job.id);
    assert_eq!(fetched.status, JobStatus::Pending);
    assert_eq!(fetched.transcription_status, StageStatus::Pending);
    assert_eq!(fetched.progress, 0);
    assert_eq!(fetched.input.patient_email, job.input.patient_email);
    assert_eq!(fetched.max_retries, 3);
}

#[tokio::test]
async fn given_a_duplicate_id_when_inserted_then_duplicate_is_reported() {
    let repository = InMemoryJobRepository::new();
    let job = sample_job();

    repository.insert(&job).await.unwrap();
    let err = repository.insert(&job).await.unwrap_err();

    assert!(matches!(err, RepositoryError::DuplicateId(_)));
}

#[tokio::test]
async fn given_an_unknown_id_when_fetched_then_nothing_is_returned() {
    let repository = InMemoryJobRepository::new();

    assert!(repository.get(JobId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn given_an_unknown_id_when_updated_then_not_found_is_reported() {
    let repository = InMemoryJobRepository::new();

    let err = repository
        .update(JobId::new(), JobPatch::new().progress(50))
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[tokio::test]
async fn given_a_partial_patch_when_applied_then_untouched_fields_survive() {
    let repository = InMemoryJobRepository::new();
    let job = sample_job();
    repository.insert(&job).await.unwrap();

    repository
        .update(
            job.id,
            JobPatch::new()
                .status(JobStatus::Processing)
                .progress(10),
        )
        .await
        .unwrap();

    let fetched = repository.get(job.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, JobStatus::Processing);
    assert_eq!(fetched.progress, 10);
    assert_eq!(fetched.transcription_status, StageStatus::Pending);
    assert!(fetched.last_error.is_none());
    assert!(fetched.updated_at >= job.updated_at);
}

#[tokio::test]
async fn given_a_patch_with_clears_when_applied_then_fields_are_nulled() {
    let repository = InMemoryJobRepository::new();
    let job = sample_job();
    repository.insert(&job).await.unwrap();

    repository
        .update(
            job.id,
            JobPatch::new()
                .transcript_url("https://blobs.test/transcripts/a.wav.txt")
                .error("boom")
                .completed_at(Utc::now()),
        )
        .await
        .unwrap();

    repository
        .update(
            job.id,
            JobPatch::new().clear_transcript_url().clear_error(),
        )
        .await
        .unwrap();

    let fetched = repository.get(job.id).await.unwrap().unwrap();
    assert!(fetched.transcript_url.is_none());
    assert!(fetched.last_error.is_none());
    // completed_at is only ever set forward; clears do not touch it.
    assert!(fetched.completed_at.is_some());
}
