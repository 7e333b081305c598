mod helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tokio::net::TcpListener;

use samtale::application::ports::{TranscriptionEngine, TranscriptionError};
use samtale::infrastructure::audio::AzureSpeechEngine;

use helpers::StubBlobStore;

const AUDIO_URL: &str =
    "https://acct.blob.core.windows.net/sessions/recordings/session-001.wav?sv=sas&sig=abc";

#[derive(Clone)]
struct SpeechServer {
    base_url: String,
    polls: Arc<AtomicUsize>,
    polls_until_done: usize,
    fail_job: bool,
    reject_submit: bool,
}

async fn submit_handler(State(server): State<SpeechServer>) -> impl IntoResponse {
    if server.reject_submit {
        return (StatusCode::INTERNAL_SERVER_ERROR, "backend down").into_response();
    }
    let location = format!(
        "{}/speechtotext/v3.0/transcriptions/job-1",
        server.base_url
    );
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        "",
    )
        .into_response()
}

async fn poll_handler(State(server): State<SpeechServer>) -> impl IntoResponse {
    let status = if server.fail_job {
        "Failed"
    } else if server.polls.fetch_add(1, Ordering::SeqCst) < server.polls_until_done {
        "Running"
    } else {
        "Succeeded"
    };
    axum::Json(serde_json::json!({ "status": status }))
}

async fn files_handler(State(server): State<SpeechServer>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "values": [
            {
                "kind": "TranscriptionReport",
                "links": { "contentUrl": format!("{}/results/report", server.base_url) }
            },
            {
                "kind": "Transcription",
                "links": { "contentUrl": format!("{}/results/job-1", server.base_url) }
            }
        ]
    }))
}

async fn result_handler() -> impl IntoResponse {
    // Deliberately out of order; the engine sorts by offset.
    axum::Json(serde_json::json!({
        "recognizedPhrases": [
            {
                "offset": "PT1M2S",
                "speaker": 1,
                "nBest": [{ "display": "How was your week?" }]
            },
            {
                "offset": "PT2.5S",
                "speaker": 2,
                "nBest": [{ "display": "It was a hard one." }]
            }
        ]
    }))
}

async fn spawn_speech_server(
    polls_until_done: usize,
    fail_job: bool,
    reject_submit: bool,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let server = SpeechServer {
        base_url: base_url.clone(),
        polls: Arc::new(AtomicUsize::new(0)),
        polls_until_done,
        fail_job,
        reject_submit,
    };

    let router = Router::new()
        .route("/speechtotext/v3.0/transcriptions", post(submit_handler))
        .route("/speechtotext/v3.0/transcriptions/job-1", get(poll_handler))
        .route(
            "/speechtotext/v3.0/transcriptions/job-1/files",
            get(files_handler),
        )
        .route("/results/job-1", get(result_handler))
        .with_state(server);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    base_url
}

fn engine_for(base_url: &str, blob_store: Arc<StubBlobStore>) -> AzureSpeechEngine {
    AzureSpeechEngine::new(
        base_url,
        "test-key",
        "he-IL",
        Duration::from_millis(10),
        blob_store,
    )
}

#[tokio::test]
async fn given_a_finished_remote_job_when_transcribing_then_dialog_is_rendered_and_stored() {
    let base_url = spawn_speech_server(2, false, false).await;
    let blob_store = Arc::new(StubBlobStore::default());
    let engine = engine_for(&base_url, blob_store.clone());

    let transcript_url = engine.transcribe(AUDIO_URL).await.unwrap();
    assert_eq!(
        transcript_url,
        "https://blobs.test/transcripts/session-001.wav.txt"
    );

    let puts = blob_store.puts.lock().unwrap();
    assert_eq!(puts.len(), 1);
    let (name, content) = &puts[0];
    assert_eq!(name, "transcripts/session-001.wav.txt");
    assert_eq!(
        content,
        "00:00:02.500  Speaker 2:  It was a hard one.\n00:01:02.000  Speaker 1:  How was your week?"
    );
}

#[tokio::test]
async fn given_a_remote_job_that_fails_when_transcribing_then_failure_is_reported() {
    let base_url = spawn_speech_server(0, true, false).await;
    let engine = engine_for(&base_url, Arc::new(StubBlobStore::default()));

    let err = engine.transcribe(AUDIO_URL).await.unwrap_err();
    assert!(matches!(err, TranscriptionError::TranscriptionFailed(_)));
}

#[tokio::test]
async fn given_a_rejected_submission_when_transcribing_then_request_failure_is_reported() {
    let base_url = spawn_speech_server(0, false, true).await;
    let engine = engine_for(&base_url, Arc::new(StubBlobStore::default()));

    let err = engine.transcribe(AUDIO_URL).await.unwrap_err();
    assert!(matches!(err, TranscriptionError::ApiRequestFailed(_)));
}

#[tokio::test]
async fn given_an_audio_url_with_no_file_name_when_transcribing_then_source_is_rejected() {
    let engine = engine_for("http://127.0.0.1:1", Arc::new(StubBlobStore::default()));

    let err = engine.transcribe("https://acct.blob.core.windows.net/").await.unwrap_err();
    assert!(matches!(err, TranscriptionError::InvalidAudioSource(_)));
}
