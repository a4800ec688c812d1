use std::sync::Arc;

use serde::Serialize;

use crate::{
    error::DashboardError,
    state::{NoticeLevel, RemovalOutcome, SessionStore},
    youtube::YoutubeApi,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedDeletion {
    pub comment_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDeletion>,
}

/// Deletes comments upstream and drops them from every local view.
pub struct DeletionReconciler {
    store: Arc<SessionStore>,
    youtube: Arc<dyn YoutubeApi>,
}

impl DeletionReconciler {
    pub fn new(store: Arc<SessionStore>, youtube: Arc<dyn YoutubeApi>) -> Self {
        Self { store, youtube }
    }

    /// Local state only changes once YouTube accepted the deletion.
    pub async fn delete_comment(
        &self,
        comment_id: &str,
    ) -> Result<RemovalOutcome, DashboardError> {
        if let Err(err) = self.youtube.delete_comment(comment_id).await {
            tracing::warn!(
                target: "reconciler",
                comment_id,
                error = %err,
                "comment deletion rejected"
            );
            self.store.notify(
                NoticeLevel::Error,
                format!("Failed to delete comment {comment_id}: {err}"),
            );
            return Err(err);
        }

        let outcome = self.store.remove_comment(comment_id);
        if outcome.is_noop() {
            tracing::debug!(
                target: "reconciler",
                comment_id,
                "deleted comment was not held locally"
            );
        } else {
            tracing::info!(
                target: "reconciler",
                comment_id,
                from_view = outcome.removed_from_view,
                videos = ?outcome.videos_updated,
                "comment deleted"
            );
        }
        self.store
            .notify(NoticeLevel::Info, format!("Comment {comment_id} deleted"));
        Ok(outcome)
    }

    /// Deletes the selected comments one after another. A missing credential
    /// aborts the batch; any other failure is recorded and the batch goes on.
    pub async fn delete_many(
        &self,
        comment_ids: &[String],
    ) -> Result<DeletionReport, DashboardError> {
        let mut report = DeletionReport::default();
        for comment_id in comment_ids {
            match self.delete_comment(comment_id).await {
                Ok(_) => report.deleted.push(comment_id.clone()),
                Err(DashboardError::AuthenticationMissing) => {
                    return Err(DashboardError::AuthenticationMissing)
                }
                Err(err) => report.failed.push(FailedDeletion {
                    comment_id: comment_id.clone(),
                    error: err.to_string(),
                }),
            }
        }
        Ok(report)
    }
}
