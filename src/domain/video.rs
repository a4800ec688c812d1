use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{comment::Comment, types::AnalysisStatus};

/// Percentage of `total` represented by `spam`; zero for an empty video.
pub fn spam_ratio(spam: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * spam as f64 / total as f64
}

/// A channel video plus the spam statistics gathered for it this session.
///
/// `spam_probability` is derived from `spam_comments` and `comment_count`;
/// it is only written by [`Video::recompute_spam_ratio`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    comment_count: usize,
    spam_probability: f64,
    spam_comments: Vec<Comment>,
}

impl Video {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            published_at,
            status: AnalysisStatus::NotAnalyzed,
            last_error: None,
            comment_count: 0,
            spam_probability: 0.0,
            spam_comments: Vec::new(),
        }
    }

    pub fn comment_count(&self) -> usize {
        self.comment_count
    }

    pub fn spam_probability(&self) -> f64 {
        self.spam_probability
    }

    pub fn spam_comments(&self) -> &[Comment] {
        &self.spam_comments
    }

    /// Replaces the previous analysis outright and marks the video analyzed.
    pub fn record_analysis(&mut self, comment_count: usize, spam_comments: Vec<Comment>) {
        self.comment_count = comment_count;
        self.spam_comments = spam_comments;
        self.status = AnalysisStatus::Analyzed;
        self.last_error = None;
        self.recompute_spam_ratio();
    }

    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.status = AnalysisStatus::Failed;
        self.last_error = Some(reason.into());
    }

    /// Drops `comment_id` from the spam list. Returns whether anything changed.
    pub fn remove_spam_comment(&mut self, comment_id: &str) -> bool {
        let before = self.spam_comments.len();
        self.spam_comments.retain(|comment| comment.id != comment_id);
        let changed = self.spam_comments.len() != before;
        if changed {
            self.recompute_spam_ratio();
        }
        changed
    }

    fn recompute_spam_ratio(&mut self) {
        self.spam_probability = spam_ratio(self.spam_comments.len(), self.comment_count);
    }
}
