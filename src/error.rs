use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between the two data sources and the screen.
/// All variants surface as inline warnings or startup context, never panics.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to fetch boundary document from {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("risk dataset not found: {0:?}")]
    MissingFile(PathBuf),

    #[error("unexpected data format: {0}")]
    Format(String),

    #[error("no rows for year {0}")]
    EmptyYear(i32),
}

impl DashboardError {
    pub fn format(msg: impl Into<String>) -> Self {
        DashboardError::Format(msg.into())
    }
}
