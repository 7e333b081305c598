mod blob_store;
mod directory;
mod job_repository;
mod repository_error;
mod session_store;
mod transcription_engine;

pub use blob_store::{BlobStore, BlobStoreError};
pub use directory::{Directory, DirectoryError};
pub use job_repository::{JobPatch, JobRepository};
pub use repository_error::RepositoryError;
pub use session_store::{SessionStore, SessionStoreError};
pub use transcription_engine::{TranscriptionEngine, TranscriptionError};
