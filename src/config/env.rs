use std::time::Duration;

use thiserror::Error;

/// Keyword flagged out of the box; "judol" is the usual spelling in the comments we target.
pub const DEFAULT_SPAM_KEYWORD: &str = "judol";

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_IN_FLIGHT: usize = 8;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub youtube: YoutubeConfig,
    pub classifier: ClassifierConfig,
    pub detection: DetectionConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    pub access_token: Option<String>,
    pub channel_id: Option<String>,
}

/// Fixed knobs for the remote classifier. These are compile-time defaults and
/// are not read from the environment.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub attempt_timeout: Duration,
    pub max_in_flight: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub keyword: String,
    pub ai_enabled: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            keyword: DEFAULT_SPAM_KEYWORD.to_string(),
            ai_enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
