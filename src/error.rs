use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedshiftError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Table error: {0}")]
    Table(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{service} error: {message}")]
    Service { service: String, message: String },
}

impl RedshiftError {
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        RedshiftError::Service {
            service: service.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RedshiftError>;
