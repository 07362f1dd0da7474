use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SprigConfigError {
    #[error("config file not found: {0}")]
    ConfigNotFound(String),
    #[error("[sprig] section missing from config file")]
    ConfigSectionNotFound,
    #[error("Failed to read environment variable {name}: {reason}")]
    EnvError { name: String, reason: String },
    #[error("Config Error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for SprigConfigError {
    fn from(e: config::ConfigError) -> Self {
        Self::ConfigError(e.to_string())
    }
}
