use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    ai::SpamClassifier,
    domain::{ClassificationResult, Comment, DetectionSettings, Video},
    error::DashboardError,
    state::{Notification, SessionStore},
    tasks::{DeletionReconciler, FleetCoordinator},
};

/// Shared by every handler; cheap to clone.
#[derive(Clone)]
pub struct DashboardState {
    pub store: Arc<SessionStore>,
    pub fleet: Arc<FleetCoordinator>,
    pub reconciler: Arc<DeletionReconciler>,
    pub classifier: Arc<dyn SpamClassifier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchCommentsRequest {
    pub video_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub comment_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub ai_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUpdate {
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyBatchRequest {
    pub comments: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub analysis_running: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    pub channel_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListResponse {
    pub channel_id: Option<String>,
    pub videos: Vec<Video>,
}

/// The active comment view, with the keyword filter applied on top.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsResponse {
    pub keyword: String,
    pub comments: Vec<Comment>,
    pub potential_spam: Vec<Comment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub comment_id: String,
    pub removed_from_view: bool,
    pub videos_updated: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub keyword: String,
    pub ai_enabled: bool,
}

impl From<DetectionSettings> for SettingsResponse {
    fn from(settings: DetectionSettings) -> Self {
        Self {
            keyword: settings.keyword,
            ai_enabled: settings.ai_enabled,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyBatchResponse {
    pub results: Vec<ClassificationResult>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl DashboardError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::AuthenticationMissing => StatusCode::UNAUTHORIZED,
            DashboardError::InvalidChannelId(_) | DashboardError::InvalidVideoUrl(_) => {
                StatusCode::BAD_REQUEST
            }
            DashboardError::ChannelNotFound | DashboardError::VideoNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DashboardError::AnalysisInProgress => StatusCode::CONFLICT,
            DashboardError::UpstreamRequestFailed { .. }
            | DashboardError::Deletion { .. }
            | DashboardError::Classification(_) => StatusCode::BAD_GATEWAY,
            DashboardError::AnalysisAborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(
                target: "dashboard",
                status = status.as_u16(),
                error = %self,
                "request failed"
            );
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
