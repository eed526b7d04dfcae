use rmf_capture_core::CaptureError;
use thiserror::Error;

/// Errors raised by the harness itself, outside any test assertion.
#[derive(Debug, Error)]
pub enum ConformanceError {
    #[error("profile error: {0}")]
    Profile(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse profile: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

pub type Result<T> = std::result::Result<T, ConformanceError>;
