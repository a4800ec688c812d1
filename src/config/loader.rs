use std::env;

use super::env::{
    AppConfig, ClassifierConfig, ConfigError, DetectionConfig, DirectoryConfig, LoggingConfig,
    ServerConfig, YoutubeConfig, DEFAULT_SPAM_KEYWORD,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let youtube = YoutubeConfig {
            access_token: non_empty("YOUTUBE_ACCESS_TOKEN"),
            channel_id: non_empty("YOUTUBE_CHANNEL_ID"),
        };

        let detection = DetectionConfig {
            keyword: env::var("SPAM_KEYWORD").unwrap_or_else(|_| DEFAULT_SPAM_KEYWORD.to_string()),
            ai_enabled: match non_empty("AI_DETECTION_ENABLED") {
                Some(value) => parse_bool("AI_DETECTION_ENABLED", &value)?,
                None => true,
            },
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let port = match non_empty("DASHBOARD_PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "DASHBOARD_PORT",
                value,
            })?,
            None => 3000,
        };
        let server = ServerConfig {
            host: env::var("DASHBOARD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
        };

        Ok(Self {
            youtube,
            classifier: ClassifierConfig::default(),
            detection,
            directories,
            logging,
            server,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}
