use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use crate::{
    domain::{AnalysisStatus, Comment, DetectionSettings, Video},
    youtube::CredentialProvider,
};

use super::notifications::{NoticeLevel, NotificationQueue};

/// Session-scoped state shared by the analyzer, the reconciler and the
/// dashboard handlers.
///
/// Collections are held as `Arc` snapshots. Writers clone the current value,
/// edit the copy and swap it in, so readers only ever see whole states.
pub struct SessionStore {
    videos: Mutex<Arc<Vec<Video>>>,
    active_comments: Mutex<Arc<Vec<Comment>>>,
    settings: Mutex<DetectionSettings>,
    access_token: Mutex<Option<String>>,
    channel_id: Mutex<Option<String>>,
    deleted_comments: Mutex<HashSet<String>>,
    analysis_running: Arc<AtomicBool>,
    notifications: NotificationQueue,
}

/// What a local comment removal touched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub removed_from_view: bool,
    pub videos_updated: Vec<String>,
}

impl RemovalOutcome {
    pub fn is_noop(&self) -> bool {
        !self.removed_from_view && self.videos_updated.is_empty()
    }
}

/// Held for the duration of an analysis run; releases the run flag on drop.
/// Owned so it can move into a spawned task.
pub struct AnalysisRunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for AnalysisRunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl SessionStore {
    pub fn new(
        settings: DetectionSettings,
        access_token: Option<String>,
        channel_id: Option<String>,
    ) -> Self {
        Self {
            videos: Mutex::new(Arc::new(Vec::new())),
            active_comments: Mutex::new(Arc::new(Vec::new())),
            settings: Mutex::new(settings),
            access_token: Mutex::new(access_token),
            channel_id: Mutex::new(channel_id),
            deleted_comments: Mutex::new(HashSet::new()),
            analysis_running: Arc::new(AtomicBool::new(false)),
            notifications: NotificationQueue::new(),
        }
    }

    pub fn settings(&self) -> DetectionSettings {
        self.settings.lock().clone()
    }

    pub fn update_settings(
        &self,
        keyword: Option<String>,
        ai_enabled: Option<bool>,
    ) -> DetectionSettings {
        let mut settings = self.settings.lock();
        if let Some(keyword) = keyword {
            settings.keyword = keyword;
        }
        if let Some(ai_enabled) = ai_enabled {
            settings.ai_enabled = ai_enabled;
        }
        settings.clone()
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.lock() = token.filter(|t| !t.trim().is_empty());
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.lock().is_some()
    }

    pub fn channel_id(&self) -> Option<String> {
        self.channel_id.lock().clone()
    }

    pub fn set_channel_id(&self, channel_id: String) {
        *self.channel_id.lock() = Some(channel_id);
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.notifications.push(level, message);
    }

    pub fn videos(&self) -> Arc<Vec<Video>> {
        self.videos.lock().clone()
    }

    pub fn video(&self, video_id: &str) -> Option<Video> {
        self.videos
            .lock()
            .iter()
            .find(|video| video.id == video_id)
            .cloned()
    }

    /// Installs a fresh listing in its order. Videos already known keep their
    /// analysis state so incremental runs can skip them.
    pub fn merge_videos(&self, listing: Vec<Video>) -> Arc<Vec<Video>> {
        let mut guard = self.videos.lock();
        let merged: Vec<Video> = listing
            .into_iter()
            .map(|incoming| {
                match guard.iter().find(|known| known.id == incoming.id) {
                    Some(known) => {
                        let mut kept = known.clone();
                        kept.title = incoming.title;
                        kept
                    }
                    None => incoming,
                }
            })
            .collect();
        *guard = Arc::new(merged);
        guard.clone()
    }

    pub fn set_status(&self, video_id: &str, status: AnalysisStatus) -> bool {
        self.update_video(video_id, |video| video.status = status)
            .is_some()
    }

    /// Comments deleted this session are dropped from `spam_comments` before
    /// the write, so a run that fetched them earlier cannot bring them back.
    pub fn record_analysis(
        &self,
        video_id: &str,
        comment_count: usize,
        spam_comments: Vec<Comment>,
    ) -> Option<Video> {
        self.update_video(video_id, move |video| {
            let spam_comments = self.without_deleted(spam_comments);
            video.record_analysis(comment_count, spam_comments)
        })
    }

    pub fn record_failure(&self, video_id: &str, reason: &str) -> Option<Video> {
        self.update_video(video_id, |video| video.record_failure(reason))
    }

    pub fn active_comments(&self) -> Arc<Vec<Comment>> {
        self.active_comments.lock().clone()
    }

    pub fn set_active_comments(&self, comments: Vec<Comment>) {
        let mut guard = self.active_comments.lock();
        *guard = Arc::new(self.without_deleted(comments));
    }

    pub fn is_deleted(&self, comment_id: &str) -> bool {
        self.deleted_comments.lock().contains(comment_id)
    }

    fn without_deleted(&self, mut comments: Vec<Comment>) -> Vec<Comment> {
        let deleted = self.deleted_comments.lock();
        if !deleted.is_empty() {
            comments.retain(|comment| !deleted.contains(&comment.id));
        }
        comments
    }

    /// Removes `comment_id` from the active view and from every video's spam
    /// list, recomputing the ratio of each video that changed. Absent ids
    /// leave the videos and the view untouched.
    ///
    /// The id is remembered for the rest of the session; later writes of
    /// analysis results and the active view skip it.
    pub fn remove_comment(&self, comment_id: &str) -> RemovalOutcome {
        let mut outcome = RemovalOutcome::default();
        self.deleted_comments.lock().insert(comment_id.to_string());

        {
            let mut guard = self.active_comments.lock();
            if guard.iter().any(|comment| comment.id == comment_id) {
                let next: Vec<Comment> = guard
                    .iter()
                    .filter(|comment| comment.id != comment_id)
                    .cloned()
                    .collect();
                *guard = Arc::new(next);
                outcome.removed_from_view = true;
            }
        }

        {
            let mut guard = self.videos.lock();
            let affected = guard
                .iter()
                .any(|video| video.spam_comments().iter().any(|c| c.id == comment_id));
            if affected {
                let mut next = guard.as_ref().clone();
                for video in next.iter_mut() {
                    if video.remove_spam_comment(comment_id) {
                        outcome.videos_updated.push(video.id.clone());
                    }
                }
                *guard = Arc::new(next);
            }
        }

        outcome
    }

    /// Claims the single fleet-run slot, or `None` if a run is in flight.
    pub fn try_begin_analysis(&self) -> Option<AnalysisRunGuard> {
        self.analysis_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AnalysisRunGuard {
                flag: self.analysis_running.clone(),
            })
    }

    pub fn is_analysis_running(&self) -> bool {
        self.analysis_running.load(Ordering::Acquire)
    }

    fn update_video<F>(&self, video_id: &str, edit: F) -> Option<Video>
    where
        F: FnOnce(&mut Video),
    {
        let mut guard = self.videos.lock();
        let index = guard.iter().position(|video| video.id == video_id)?;
        let mut next = guard.as_ref().clone();
        edit(&mut next[index]);
        let updated = next[index].clone();
        *guard = Arc::new(next);
        Some(updated)
    }
}

impl CredentialProvider for SessionStore {
    fn access_token(&self) -> Option<String> {
        self.access_token.lock().clone()
    }
}
