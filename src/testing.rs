//! In-memory stand-ins for YouTube and the classifier, for unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use crate::{
    ai::{ClassificationError, SpamClassifier},
    domain::{ClassificationResult, Comment, DetectionSettings, RiskLevel, Video},
    error::DashboardError,
    state::SessionStore,
    youtube::YoutubeApi,
};

pub fn comment(id: &str, video_id: &str, text: &str) -> Comment {
    Comment::new(id, "viewer", text, video_id, Utc::now())
}

pub fn session_store(keyword: &str, ai_enabled: bool) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(
        DetectionSettings {
            keyword: keyword.to_string(),
            ai_enabled,
        },
        Some("test-token".to_string()),
        None,
    ))
}

pub struct FakeYoutube {
    videos: Vec<Video>,
    comments: Mutex<HashMap<String, Vec<Comment>>>,
    failing: Mutex<HashSet<String>>,
    rejected: HashSet<String>,
    deleted: Mutex<Vec<String>>,
    signed_in: bool,
}

impl FakeYoutube {
    pub const CHANNEL_ID: &'static str = "UCfakefakefakefakefake00";

    pub fn new() -> Self {
        Self {
            videos: Vec::new(),
            comments: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            rejected: HashSet::new(),
            deleted: Mutex::new(Vec::new()),
            signed_in: true,
        }
    }

    pub fn with_video(mut self, video_id: &str, comments: Vec<Comment>) -> Self {
        self.videos
            .push(Video::new(video_id, format!("Video {video_id}"), Utc::now()));
        self.comments.lock().insert(video_id.to_string(), comments);
        self
    }

    pub fn failing_comments_for(self, video_id: &str) -> Self {
        self.failing.lock().insert(video_id.to_string());
        self
    }

    pub fn recover_comments_for(&self, video_id: &str) {
        self.failing.lock().remove(video_id);
    }

    pub fn rejecting_deletion_of(mut self, comment_id: &str) -> Self {
        self.rejected.insert(comment_id.to_string());
        self
    }

    pub fn signed_out(mut self) -> Self {
        self.signed_in = false;
        self
    }

    pub fn listing(&self) -> Vec<Video> {
        self.videos.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    fn ensure_signed_in(&self) -> Result<(), DashboardError> {
        if self.signed_in {
            Ok(())
        } else {
            Err(DashboardError::AuthenticationMissing)
        }
    }
}

#[async_trait]
impl YoutubeApi for FakeYoutube {
    async fn my_channel_id(&self) -> Result<String, DashboardError> {
        self.ensure_signed_in()?;
        Ok(Self::CHANNEL_ID.to_string())
    }

    async fn list_videos(&self, _channel_id: &str) -> Result<Vec<Video>, DashboardError> {
        self.ensure_signed_in()?;
        Ok(self.videos.clone())
    }

    async fn list_comments(&self, video_id: &str) -> Result<Vec<Comment>, DashboardError> {
        self.ensure_signed_in()?;
        if self.failing.lock().contains(video_id) {
            return Err(DashboardError::UpstreamRequestFailed {
                operation: "comment listing",
                status: Some(500),
                message: "backend error".into(),
            });
        }
        Ok(self
            .comments
            .lock()
            .get(video_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), DashboardError> {
        self.ensure_signed_in()?;
        if self.rejected.contains(comment_id) {
            return Err(DashboardError::Deletion {
                comment_id: comment_id.to_string(),
                status: Some(403),
                message: "forbidden".into(),
            });
        }
        for comments in self.comments.lock().values_mut() {
            comments.retain(|c| c.id != comment_id);
        }
        self.deleted.lock().push(comment_id.to_string());
        Ok(())
    }
}

/// Answers from a fixed table; unknown texts score as clean.
pub struct ScriptedClassifier {
    verdicts: HashMap<String, ClassificationResult>,
    failing_texts: HashSet<String>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self {
            verdicts: HashMap::new(),
            failing_texts: HashSet::new(),
            unavailable: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    pub fn with_verdict(mut self, text: &str, probability: f64, risk_level: RiskLevel) -> Self {
        self.verdicts.insert(
            text.to_string(),
            ClassificationResult {
                probability,
                risk_level,
                processing_time_seconds: 0.01,
            },
        );
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing_texts.insert(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpamClassifier for ScriptedClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable || self.failing_texts.contains(text) {
            return Err(ClassificationError::Unreachable {
                attempts: 3,
                reason: "scripted outage".into(),
            });
        }
        Ok(self
            .verdicts
            .get(text)
            .copied()
            .unwrap_or(ClassificationResult {
                probability: 0.05,
                risk_level: RiskLevel::Low,
                processing_time_seconds: 0.01,
            }))
    }
}

/// Holds every call until [`open`](Self::open) is called, then answers clean.
pub struct GatedClassifier {
    gate: Semaphore,
    called: Notify,
}

impl GatedClassifier {
    pub fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            called: Notify::new(),
        }
    }

    /// Resolves once at least one call is waiting at the gate.
    pub async fn wait_until_called(&self) {
        self.called.notified().await;
    }

    pub fn open(&self) {
        self.gate.close();
    }
}

#[async_trait]
impl SpamClassifier for GatedClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassificationResult, ClassificationError> {
        self.called.notify_one();
        // A closed semaphore releases every waiter.
        let _ = self.gate.acquire().await;
        Ok(ClassificationResult {
            probability: 0.05,
            risk_level: RiskLevel::Low,
            processing_time_seconds: 0.01,
        })
    }
}
