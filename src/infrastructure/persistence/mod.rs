mod memory_job_repository;
mod pg_directory;
mod pg_job_repository;
mod pg_pool;
mod pg_session_store;

pub use memory_job_repository::InMemoryJobRepository;
pub use pg_directory::PgDirectory;
pub use pg_job_repository::PgJobRepository;
pub use pg_pool::create_pool;
pub use pg_session_store::PgSessionStore;
