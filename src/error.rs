use thiserror::Error;

use crate::ai::ClassificationError;

/// Failures surfaced by dashboard operations.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("no valid YouTube credential for this session")]
    AuthenticationMissing,

    #[error("{operation} failed: {message}")]
    UpstreamRequestFailed {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error("failed to delete comment {comment_id}: {message}")]
    Deletion {
        comment_id: String,
        status: Option<u16>,
        message: String,
    },

    #[error("invalid channel id: {0}")]
    InvalidChannelId(String),

    #[error("no video id found in {0:?}")]
    InvalidVideoUrl(String),

    #[error("no YouTube channel found for this account")]
    ChannelNotFound,

    #[error("video {0} is not loaded in this session")]
    VideoNotFound(String),

    #[error("an analysis run is already in progress")]
    AnalysisInProgress,

    #[error("analysis task ended abnormally: {0}")]
    AnalysisAborted(String),
}

impl DashboardError {
    pub fn upstream(operation: &'static str, err: reqwest::Error) -> Self {
        DashboardError::UpstreamRequestFailed {
            operation,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
