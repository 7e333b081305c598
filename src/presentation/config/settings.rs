use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub speech: SpeechSettings,
    pub jobs: JobSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub connect_retries: u32,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub account: String,
    pub access_key: String,
    pub container: String,
}

#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub endpoint: String,
    pub api_key: String,
    pub locale: String,
    pub poll_interval_secs: u64,
}

impl SpeechSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone)]
pub struct JobSettings {
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            server: ServerSettings {
                host: var_or("SERVER_HOST", "0.0.0.0"),
                port: parsed_var_or("SERVER_PORT", 3000)?,
            },
            database: DatabaseSettings {
                url: require("DATABASE_URL")?,
                max_connections: parsed_var_or("DATABASE_MAX_CONNECTIONS", 5)?,
                connect_retries: parsed_var_or("DATABASE_CONNECT_RETRIES", 5)?,
            },
            storage: StorageSettings {
                account: require("AZURE_STORAGE_ACCOUNT")?,
                access_key: require("AZURE_STORAGE_ACCESS_KEY")?,
                container: var_or("AZURE_STORAGE_CONTAINER", "sessions"),
            },
            speech: SpeechSettings {
                endpoint: require("AZURE_SPEECH_ENDPOINT")?,
                api_key: require("AZURE_SPEECH_KEY")?,
                locale: var_or("TRANSCRIPTION_LOCALE", "he-IL"),
                poll_interval_secs: parsed_var_or("TRANSCRIPTION_POLL_INTERVAL_SECS", 10)?,
            },
            jobs: JobSettings {
                max_retries: parsed_var_or("JOB_MAX_RETRIES", 3)?,
            },
            logging: LoggingSettings {
                level: var_or("LOG_LEVEL", "info"),
                json: env::var("LOG_FORMAT")
                    .map(|v| v.to_lowercase() == "json")
                    .unwrap_or(false),
            },
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn require(name: &'static str) -> Result<String, SettingsError> {
    env::var(name).map_err(|_| SettingsError::Missing(name))
}

fn parsed_var_or<T>(name: &'static str, default: T) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| SettingsError::Invalid {
            name,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {message}")]
    Invalid {
        name: &'static str,
        message: String,
    },
}
