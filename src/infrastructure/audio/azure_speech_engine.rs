use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::{BlobStore, TranscriptionEngine, TranscriptionError};

/// Azure Speech batch-transcription backend. One `transcribe` call covers the
/// whole remote conversation: submit the job with diarization enabled, follow
/// the `Location` header until the job settles, download the result JSON,
/// render diarised dialog lines, and store the transcript next to the source
/// recording.
pub struct AzureSpeechEngine {
    client: Client,
    endpoint: String,
    api_key: String,
    locale: String,
    poll_interval: Duration,
    blob_store: Arc<dyn BlobStore>,
}

impl AzureSpeechEngine {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        locale: &str,
        poll_interval: Duration,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            locale: locale.to_string(),
            poll_interval,
            blob_store,
        }
    }

    async fn submit(&self, sas_url: &str) -> Result<String, TranscriptionError> {
        let body = serde_json::json!({
            "displayName": format!("session-{}", Uuid::new_v4()),
            "description": "Diarised session transcription",
            "locale": self.locale,
            "contentUrls": [sas_url],
            "properties": {
                "diarizationEnabled": true,
                "punctuationMode": "DictatedAndAutomatic",
            },
        });

        let url = format!("{}/speechtotext/v3.0/transcriptions", self.endpoint);
        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("submit: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "submit returned {}: {}",
                status, text
            )));
        }

        response
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                TranscriptionError::ApiRequestFailed(
                    "submit response missing Location header".to_string(),
                )
            })
    }

    /// Fixed poll interval, no overall deadline: the remote batch job is
    /// finite and the worker owns nothing else while it waits.
    async fn poll_until_done(&self, job_url: &str) -> Result<(), TranscriptionError> {
        loop {
            let response = self
                .client
                .get(job_url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .await
                .map_err(|e| TranscriptionError::ApiRequestFailed(format!("poll: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(TranscriptionError::ApiRequestFailed(format!(
                    "poll returned {}: {}",
                    status, text
                )));
            }

            let job: TranscriptionJob = response
                .json()
                .await
                .map_err(|e| TranscriptionError::ApiRequestFailed(format!("poll parse: {}", e)))?;

            match job.status.as_str() {
                "Succeeded" => return Ok(()),
                "Failed" => {
                    return Err(TranscriptionError::TranscriptionFailed(
                        "remote transcription job reported failure".to_string(),
                    ));
                }
                other => {
                    tracing::debug!(status = %other, "Transcription job still running");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn fetch_result(&self, job_url: &str) -> Result<TranscriptionResult, TranscriptionError> {
        let files: FilesResponse = self
            .client
            .get(format!("{}/files", job_url))
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("files: {}", e)))?
            .json()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("files parse: {}", e)))?;

        let content_url = files
            .values
            .into_iter()
            .find(|f| f.kind == "Transcription")
            .map(|f| f.links.content_url)
            .ok_or_else(|| {
                TranscriptionError::ApiRequestFailed(
                    "job results contain no transcription file".to_string(),
                )
            })?;

        // The content URL is already SAS-signed; no subscription key here.
        self.client
            .get(&content_url)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("result: {}", e)))?
            .json()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("result parse: {}", e)))
    }
}

#[async_trait]
impl TranscriptionEngine for AzureSpeechEngine {
    #[tracing::instrument(skip(self, audio_url))]
    async fn transcribe(&self, audio_url: &str) -> Result<String, TranscriptionError> {
        let source_name = source_blob_name(audio_url)?;

        let job_url = self.submit(audio_url).await?;
        tracing::debug!(job_url = %job_url, "Transcription job submitted");

        self.poll_until_done(&job_url).await?;
        let result = self.fetch_result(&job_url).await?;
        let dialog = render_dialog(&result);

        let transcript_name = format!("transcripts/{}.txt", source_name);
        let transcript_url = self
            .blob_store
            .put_text(&transcript_name, &dialog)
            .await
            .map_err(|e| {
                TranscriptionError::ApiRequestFailed(format!("transcript upload: {}", e))
            })?;

        tracing::info!(
            phrases = result.recognized_phrases.len(),
            "Transcription completed"
        );

        Ok(transcript_url)
    }
}

/// `HH:MM:SS.mmm  Speaker n:  text` lines sorted by offset.
fn render_dialog(result: &TranscriptionResult) -> String {
    let mut lines: Vec<(String, String)> = result
        .recognized_phrases
        .iter()
        .filter_map(|phrase| {
            let ts = format_timestamp(parse_iso_duration(&phrase.offset)?);
            let text = phrase.n_best.first()?.display.trim().to_string();
            let speaker = phrase
                .speaker
                .map(|s| s.to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let line = format!("{}  Speaker {}:  {}", ts, speaker, text);
            Some((ts, line))
        })
        .collect();

    lines.sort_by(|a, b| a.0.cmp(&b.0));
    lines
        .into_iter()
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses an ISO-8601 duration of the `PT1H2M3.45S` shape into seconds.
fn parse_iso_duration(value: &str) -> Option<f64> {
    let rest = value.strip_prefix("PT")?;
    let mut total = 0.0;
    let mut number = String::new();

    for ch in rest.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            number.push(ch);
        } else {
            let parsed: f64 = number.parse().ok()?;
            total += match ch {
                'H' => parsed * 3600.0,
                'M' => parsed * 60.0,
                'S' => parsed,
                _ => return None,
            };
            number.clear();
        }
    }

    Some(total)
}

fn format_timestamp(seconds: f64) -> String {
    let ms_total = (seconds * 1000.0).round() as u64;
    let hours = ms_total / 3_600_000;
    let minutes = (ms_total % 3_600_000) / 60_000;
    let secs = (ms_total % 60_000) / 1000;
    let millis = ms_total % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

/// File name of the source recording, with any SAS query string stripped.
fn source_blob_name(audio_url: &str) -> Result<String, TranscriptionError> {
    let path = audio_url.split('?').next().unwrap_or(audio_url);
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(String::from)
        .ok_or_else(|| TranscriptionError::InvalidAudioSource(audio_url.to_string()))
}

#[derive(Deserialize)]
struct TranscriptionJob {
    status: String,
}

#[derive(Deserialize)]
struct FilesResponse {
    values: Vec<FileEntry>,
}

#[derive(Deserialize)]
struct FileEntry {
    kind: String,
    links: FileLinks,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileLinks {
    content_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptionResult {
    recognized_phrases: Vec<RecognizedPhrase>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognizedPhrase {
    offset: String,
    #[serde(default)]
    speaker: Option<u32>,
    n_best: Vec<NBest>,
}

#[derive(Deserialize)]
struct NBest {
    display: String,
}
