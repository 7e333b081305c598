mod azure_speech_engine;

pub use azure_speech_engine::AzureSpeechEngine;
