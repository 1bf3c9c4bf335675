//! Error types for the dashboard application.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("api error: {0}")]
    Api(#[from] garmin_connect_client::GarminError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("no activity snapshot at {0}; run `fetch` first")]
    MissingSnapshot(PathBuf),

    #[error("invalid schedule: {0}")]
    Schedule(String),
}

/// Result type alias for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;
