use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TelemetryError>;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("cannot open request log {}: {source}", path.display())]
    RequestLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("global subscriber already set: {0}")]
    AlreadyInitialized(String),
}
