mod settings;

pub use settings::{
    DatabaseSettings, JobSettings, LoggingSettings, ServerSettings, Settings, SettingsError,
    SpeechSettings, StorageSettings,
};
