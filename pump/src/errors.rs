//! Error types for stack-pump

use thiserror::Error;

use crate::models::stack::StackStatus;

/// Main error type for stack-pump
#[derive(Error, Debug)]
pub enum PumpError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("stack {stack} is in failed status {status}")]
    StackFailed { stack: String, status: StackStatus },

    #[error("resource {physical_id} not found in stack {stack} after {attempts} attempts")]
    ResourceNotFound {
        stack: String,
        physical_id: String,
        attempts: u32,
    },

    #[error("deployment {0}: {1}")]
    DeploymentError(String, String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("notify error: {0}")]
    NotifyError(String),
}
