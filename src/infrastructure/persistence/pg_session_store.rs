use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{SessionStore, SessionStoreError};
use crate::domain::{NewSessionRecord, SessionId};

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    #[instrument(skip(self, record))]
    async fn insert_session(
        &self,
        record: &NewSessionRecord,
    ) -> Result<SessionId, SessionStoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO sessions
                (patient_id, therapist_id, session_date, session_notes,
                 audio_url, transcript_url, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(record.patient_id.as_i64())
        .bind(record.therapist_id.as_i64())
        .bind(record.session_date)
        .bind(&record.session_notes)
        .bind(&record.audio_url)
        .bind(&record.transcript_url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SessionStoreError::InsertFailed(e.to_string()))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| SessionStoreError::InsertFailed(e.to_string()))?;

        Ok(SessionId::from_i64(id))
    }
}
