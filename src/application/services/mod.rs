mod job_scheduler;
mod processing_service;

pub use job_scheduler::JobScheduler;
pub use processing_service::ProcessingService;
