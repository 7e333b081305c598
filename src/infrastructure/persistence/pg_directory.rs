use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{Directory, DirectoryError};
use crate::domain::{PatientId, TherapistId};

/// Lookups against the externally-owned patients/therapists tables.
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn id_by_email(&self, table: &str, email: &str) -> Result<Option<i64>, DirectoryError> {
        // `table` comes from the two fixed call sites below, never from input.
        let query = format!("SELECT id FROM {} WHERE email = $1", table);
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DirectoryError::LookupFailed(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(
                r.try_get("id")
                    .map_err(|e| DirectoryError::LookupFailed(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    #[instrument(skip(self, email))]
    async fn patient_id_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PatientId>, DirectoryError> {
        Ok(self
            .id_by_email("patients", email)
            .await?
            .map(PatientId::from_i64))
    }

    #[instrument(skip(self, email))]
    async fn therapist_id_by_email(
        &self,
        email: &str,
    ) -> Result<Option<TherapistId>, DirectoryError> {
        Ok(self
            .id_by_email("therapists", email)
            .await?
            .map(TherapistId::from_i64))
    }
}
