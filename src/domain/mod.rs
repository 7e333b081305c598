mod job;
mod job_id;
mod job_status;
mod session;

pub use job::{Job, JobInput};
pub use job_id::JobId;
pub use job_status::{JobStatus, StageStatus};
pub use session::{NewSessionRecord, PatientId, SessionId, TherapistId};
