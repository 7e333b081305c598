use async_trait::async_trait;

/// Executes the transcription stage: one blocking call that hides the
/// submit-and-poll conversation with the remote backend. Retry policy lives
/// with the scheduler, not here.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribes the recording behind `audio_url` (a pre-signed, readable
    /// URL) and returns the location of the produced transcript artifact.
    async fn transcribe(&self, audio_url: &str) -> Result<String, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("invalid audio source: {0}")]
    InvalidAudioSource(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
}
