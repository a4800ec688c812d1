use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{
    domain::{AnalysisStatus, Video},
    error::DashboardError,
    state::{NoticeLevel, SessionStore},
    youtube::YoutubeApi,
};

use super::analyzer::{VideoAnalysis, VideoAnalyzer};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedVideo {
    pub video_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetReport {
    pub analyzed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedVideo>,
}

/// Runs the analyzer over the channel's videos, one video at a time.
pub struct FleetCoordinator {
    store: Arc<SessionStore>,
    youtube: Arc<dyn YoutubeApi>,
    analyzer: Arc<VideoAnalyzer>,
}

impl FleetCoordinator {
    pub fn new(
        store: Arc<SessionStore>,
        youtube: Arc<dyn YoutubeApi>,
        analyzer: Arc<VideoAnalyzer>,
    ) -> Self {
        Self {
            store,
            youtube,
            analyzer,
        }
    }

    /// The configured channel, or the signed-in user's own channel.
    pub async fn resolve_channel(&self) -> Result<String, DashboardError> {
        if let Some(channel_id) = self.store.channel_id() {
            return Ok(channel_id);
        }
        let channel_id = self.youtube.my_channel_id().await?;
        tracing::info!(target: "fleet", %channel_id, "resolved channel of signed-in user");
        self.store.set_channel_id(channel_id.clone());
        Ok(channel_id)
    }

    /// Pulls the channel's video list into the session. Known videos keep
    /// their analysis results.
    pub async fn refresh_videos(
        &self,
        channel_id: Option<String>,
    ) -> Result<Arc<Vec<Video>>, DashboardError> {
        let channel_id = match channel_id {
            Some(channel_id) => channel_id,
            None => self.resolve_channel().await?,
        };

        let listing = match self.youtube.list_videos(&channel_id).await {
            Ok(listing) => listing,
            Err(err) => {
                self.store
                    .notify(NoticeLevel::Error, format!("Could not load videos: {err}"));
                return Err(err);
            }
        };

        self.store.set_channel_id(channel_id);
        Ok(self.store.merge_videos(listing))
    }

    /// Analyzes every loaded video that is not analyzed yet, in list order.
    /// Per-video failures land in the report; only a concurrent run is an error.
    ///
    /// The run is a spawned task holding the run slot, so it finishes even if
    /// the caller stops waiting.
    pub async fn analyze_all(&self) -> Result<FleetReport, DashboardError> {
        let run = self
            .store
            .try_begin_analysis()
            .ok_or(DashboardError::AnalysisInProgress)?;
        let store = self.store.clone();
        let analyzer = self.analyzer.clone();

        join_run(tokio::spawn(async move {
            let _run = run;
            analyze_pending(&store, &analyzer).await
        }))
        .await
    }

    /// Analyzes one video on demand and opens its comments. Shares the run slot
    /// with [`analyze_all`](Self::analyze_all).
    pub async fn analyze_one(&self, video_id: &str) -> Result<VideoAnalysis, DashboardError> {
        let run = self
            .store
            .try_begin_analysis()
            .ok_or(DashboardError::AnalysisInProgress)?;
        let analyzer = self.analyzer.clone();
        let video_id = video_id.to_string();

        join_run(tokio::spawn(async move {
            let _run = run;
            analyzer.open(&video_id).await
        }))
        .await?
    }
}

async fn analyze_pending(store: &SessionStore, analyzer: &VideoAnalyzer) -> FleetReport {
    let videos = store.videos();
    let mut report = FleetReport::default();

    for video in videos.iter() {
        if video.status == AnalysisStatus::Analyzed {
            report.skipped.push(video.id.clone());
            continue;
        }
        match analyzer.analyze(&video.id).await {
            Ok(_) => report.analyzed.push(video.id.clone()),
            Err(err) => report.failed.push(FailedVideo {
                video_id: video.id.clone(),
                error: err.to_string(),
            }),
        }
    }

    tracing::info!(
        target: "fleet",
        analyzed = report.analyzed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "fleet analysis finished"
    );
    if !report.failed.is_empty() {
        store.notify(
            NoticeLevel::Warning,
            format!(
                "{} of {} videos could not be analyzed",
                report.failed.len(),
                videos.len()
            ),
        );
    }
    report
}

async fn join_run<T>(handle: JoinHandle<T>) -> Result<T, DashboardError> {
    handle.await.map_err(|err| {
        tracing::error!(target: "fleet", error = %err, "analysis task ended abnormally");
        DashboardError::AnalysisAborted(err.to_string())
    })
}
