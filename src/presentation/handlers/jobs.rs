use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Job, JobId, JobInput};
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub audio_url: String,
    pub patient_email: String,
    pub therapist_email: String,
    pub session_date: NaiveDate,
    #[serde(default)]
    pub session_notes: String,
}

#[derive(Serialize)]
pub struct CreateJobResponse {
    pub job_id: String,
}

#[derive(Serialize)]
pub struct RetryJobResponse {
    pub job_id: String,
    pub accepted: bool,
}

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub patient_email: String,
    pub therapist_email: String,
    pub session_date: String,
    pub session_notes: String,
    pub audio_url: String,
    pub transcript_url: Option<String>,
    pub status: String,
    pub transcription_status: String,
    pub progress: u8,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl JobStatusResponse {
    fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id.as_uuid().to_string(),
            patient_email: job.input.patient_email.clone(),
            therapist_email: job.input.therapist_email.clone(),
            session_date: job.input.session_date.to_string(),
            session_notes: job.input.session_notes.clone(),
            audio_url: job.input.audio_url.clone(),
            transcript_url: job.transcript_url.clone(),
            status: job.status.as_str().to_string(),
            transcription_status: job.transcription_status.as_str().to_string(),
            progress: job.progress,
            last_error: job.last_error.clone(),
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
            completed_at: job.completed_at.map(|at| at.to_rfc3339()),
            retry_count: job.retry_count,
            max_retries: job.max_retries,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state, request))]
pub async fn create_job_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> impl IntoResponse {
    if request.audio_url.trim().is_empty()
        || request.patient_email.trim().is_empty()
        || request.therapist_email.trim().is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "audio_url, patient_email and therapist_email are required".to_string(),
            }),
        )
            .into_response();
    }

    let input = JobInput {
        patient_email: request.patient_email,
        therapist_email: request.therapist_email,
        session_date: request.session_date,
        session_notes: request.session_notes,
        audio_url: request.audio_url,
    };

    match state.processing_service.create_job(input).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(CreateJobResponse {
                job_id: id.as_uuid().to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create processing job");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to create job: {}", e),
                }),
            )
                .into_response()
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&job_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid job ID: {}", job_id),
                }),
            )
                .into_response();
        }
    };

    match state
        .processing_service
        .job_status(JobId::from_uuid(uuid))
        .await
    {
        Ok(Some(job)) => (StatusCode::OK, Json(JobStatusResponse::from_job(&job))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Job not found: {}", job_id),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch job status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch job: {}", e),
                }),
            )
                .into_response()
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn retry_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&job_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid job ID: {}", job_id),
                }),
            )
                .into_response();
        }
    };

    match state
        .processing_service
        .retry_job(JobId::from_uuid(uuid))
        .await
    {
        Ok(accepted) => {
            let status = if accepted {
                StatusCode::OK
            } else {
                StatusCode::BAD_REQUEST
            };
            (
                status,
                Json(RetryJobResponse {
                    job_id,
                    accepted,
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to retry job");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to retry job: {}", e),
                }),
            )
                .into_response()
        }
    }
}
