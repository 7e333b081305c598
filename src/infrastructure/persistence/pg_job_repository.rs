use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use crate::application::ports::{JobPatch, JobRepository, RepositoryError};
use crate::domain::{Job, JobId, JobInput, JobStatus, StageStatus};

pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    #[instrument(skip(self, job), fields(job_id = %job.id.as_uuid()))]
    async fn insert(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO processing_jobs
                (id, patient_email, therapist_email, session_date, session_notes,
                 audio_url, transcript_url, status, transcription_status, progress,
                 last_error, created_at, updated_at, completed_at, retry_count, max_retries)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(&job.input.patient_email)
        .bind(&job.input.therapist_email)
        .bind(job.input.session_date)
        .bind(&job.input.session_notes)
        .bind(&job.input.audio_url)
        .bind(&job.transcript_url)
        .bind(job.status.as_str())
        .bind(job.transcription_status.as_str())
        .bind(job.progress as i32)
        .bind(&job.last_error)
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.completed_at)
        .bind(job.retry_count as i32)
        .bind(job.max_retries as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::DuplicateId(job.id.as_uuid().to_string())
            } else {
                RepositoryError::QueryFailed(e.to_string())
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn get(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, patient_email, therapist_email, session_date, session_notes,
                   audio_url, transcript_url, status, transcription_status, progress,
                   last_error, created_at, updated_at, completed_at, retry_count, max_retries
            FROM processing_jobs
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(
                row_to_job(&r).map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, patch), fields(job_id = %id.as_uuid()))]
    async fn update(&self, id: JobId, patch: JobPatch) -> Result<(), RepositoryError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE processing_jobs SET updated_at = ");
        builder.push_bind(Utc::now());

        if let Some(status) = patch.status {
            builder.push(", status = ");
            builder.push_bind(status.as_str());
        }
        if let Some(stage) = patch.transcription_status {
            builder.push(", transcription_status = ");
            builder.push_bind(stage.as_str());
        }
        if let Some(progress) = patch.progress {
            builder.push(", progress = ");
            builder.push_bind(progress as i32);
        }
        if let Some(url) = patch.transcript_url {
            builder.push(", transcript_url = ");
            builder.push_bind(url);
        }
        if let Some(error) = patch.last_error {
            builder.push(", last_error = ");
            builder.push_bind(error);
        }
        if let Some(at) = patch.completed_at {
            builder.push(", completed_at = ");
            builder.push_bind(at);
        }
        if let Some(count) = patch.retry_count {
            builder.push(", retry_count = ");
            builder.push_bind(count as i32);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id.as_uuid());

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.as_uuid().to_string()));
        }

        Ok(())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation
    )
}

fn row_to_job(row: &PgRow) -> Result<Job, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<JobStatus>()
        .map_err(|e| decode_error("status", e))?;

    let stage: String = row.try_get("transcription_status")?;
    let transcription_status = stage
        .parse::<StageStatus>()
        .map_err(|e| decode_error("transcription_status", e))?;

    Ok(Job {
        id: JobId::from_uuid(row.try_get("id")?),
        input: JobInput {
            patient_email: row.try_get("patient_email")?,
            therapist_email: row.try_get("therapist_email")?,
            session_date: row.try_get("session_date")?,
            session_notes: row.try_get("session_notes")?,
            audio_url: row.try_get("audio_url")?,
        },
        transcript_url: row.try_get("transcript_url")?,
        status,
        transcription_status,
        progress: row.try_get::<i32, _>("progress")? as u8,
        last_error: row.try_get("last_error")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        completed_at: row.try_get("completed_at")?,
        retry_count: row.try_get::<i32, _>("retry_count")? as u32,
        max_retries: row.try_get::<i32, _>("max_retries")? as u32,
    })
}

fn decode_error(column: &str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: message.into(),
    }
}
