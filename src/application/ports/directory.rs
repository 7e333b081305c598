use async_trait::async_trait;

use crate::domain::{PatientId, TherapistId};

/// Lookups against the externally-owned patient and therapist tables, used
/// only during finalization.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn patient_id_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PatientId>, DirectoryError>;

    async fn therapist_id_by_email(
        &self,
        email: &str,
    ) -> Result<Option<TherapistId>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("lookup failed: {0}")]
    LookupFailed(String),
}
