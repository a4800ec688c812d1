use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::{
    ai::{ClassificationError, SpamClassifier},
    domain::{AnalysisStatus, ClassificationResult, Comment, DetectionSettings},
    error::DashboardError,
    state::{NoticeLevel, SessionStore},
    youtube::YoutubeApi,
};

/// Everything one analysis pass produced for a video.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalysis {
    pub video_id: String,
    pub comments: Vec<Comment>,
    pub spam_comments: Vec<Comment>,
    pub used_ai: bool,
}

/// Fetches, classifies and scores the comments of a single video.
pub struct VideoAnalyzer {
    store: Arc<SessionStore>,
    youtube: Arc<dyn YoutubeApi>,
    classifier: Arc<dyn SpamClassifier>,
    max_in_flight: usize,
}

impl VideoAnalyzer {
    pub fn new(
        store: Arc<SessionStore>,
        youtube: Arc<dyn YoutubeApi>,
        classifier: Arc<dyn SpamClassifier>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            store,
            youtube,
            classifier,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Analyzes `video_id` and returns its spam comments. Only a failed comment
    /// fetch is reported as an error; classifier trouble degrades to the
    /// keyword filter.
    pub async fn analyze(&self, video_id: &str) -> Result<Vec<Comment>, DashboardError> {
        Ok(self.run(video_id).await?.spam_comments)
    }

    /// Same as [`analyze`](Self::analyze), and also makes the video's comments
    /// the active view.
    pub async fn open(&self, video_id: &str) -> Result<VideoAnalysis, DashboardError> {
        let analysis = self.run(video_id).await?;
        self.store.set_active_comments(analysis.comments.clone());
        Ok(analysis)
    }

    async fn run(&self, video_id: &str) -> Result<VideoAnalysis, DashboardError> {
        let settings = self.store.settings();
        self.store.set_status(video_id, AnalysisStatus::Analyzing);

        let mut comments = match self.youtube.list_comments(video_id).await {
            Ok(comments) => comments,
            Err(err) => {
                tracing::error!(
                    target: "analyzer",
                    video_id,
                    error = %err,
                    "failed to fetch comments"
                );
                self.store.record_failure(video_id, &err.to_string());
                self.store.notify(
                    NoticeLevel::Error,
                    format!("Could not load comments for video {video_id}: {err}"),
                );
                return Err(err);
            }
        };

        let used_ai = self.classify_all(video_id, &mut comments, &settings).await;
        // Deletions that landed mid-run still count towards the total.
        let fetched = comments.len();
        comments.retain(|comment| !self.store.is_deleted(&comment.id));
        let spam_comments: Vec<Comment> =
            comments.iter().filter(|c| c.flagged()).cloned().collect();

        // Single write of the aggregate, after every classification settled.
        self.store
            .record_analysis(video_id, fetched, spam_comments.clone());

        tracing::info!(
            target: "analyzer",
            video_id,
            total = fetched,
            spam = spam_comments.len(),
            used_ai,
            "video analyzed"
        );

        Ok(VideoAnalysis {
            video_id: video_id.to_string(),
            comments,
            spam_comments,
            used_ai,
        })
    }

    /// Annotates every comment. Returns whether model results were applied;
    /// on any classifier failure none are.
    async fn classify_all(
        &self,
        video_id: &str,
        comments: &mut [Comment],
        settings: &DetectionSettings,
    ) -> bool {
        let verdicts = if settings.ai_enabled && !comments.is_empty() {
            match self.fan_out(comments).await {
                Ok(verdicts) => Some(verdicts),
                Err(err) => {
                    tracing::warn!(
                        target: "analyzer",
                        video_id,
                        error = %err,
                        "classifier unavailable, falling back to keyword filter"
                    );
                    self.store.notify(
                        NoticeLevel::Warning,
                        format!(
                            "AI detection unavailable for video {video_id}; used keyword \"{}\" instead",
                            settings.keyword
                        ),
                    );
                    None
                }
            }
        } else {
            None
        };

        match verdicts {
            Some(verdicts) => {
                for (comment, verdict) in comments.iter_mut().zip(verdicts) {
                    comment.annotate(Some(verdict), &settings.keyword);
                }
                true
            }
            None => {
                for comment in comments.iter_mut() {
                    comment.annotate(None, &settings.keyword);
                }
                false
            }
        }
    }

    /// Classifies all comments with at most `max_in_flight` calls outstanding.
    /// The first error drops the remaining calls.
    async fn fan_out(
        &self,
        comments: &[Comment],
    ) -> Result<Vec<ClassificationResult>, ClassificationError> {
        let calls: Vec<_> = comments
            .iter()
            .map(|comment| {
                let classifier = self.classifier.clone();
                let text = comment.text.clone();
                async move { classifier.classify(&text).await }
            })
            .collect();

        stream::iter(calls)
            .buffered(self.max_in_flight)
            .try_collect()
            .await
    }
}
