mod health;
mod jobs;

pub use health::health_handler;
pub use jobs::{create_job_handler, job_status_handler, retry_job_handler};
