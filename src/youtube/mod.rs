use async_trait::async_trait;

use crate::{
    domain::{Comment, Video},
    error::DashboardError,
};

pub mod client;
pub mod types;

pub use client::YoutubeClient;

/// Supplies the bearer token of the signed-in channel owner, if any.
pub trait CredentialProvider: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// The slice of the YouTube Data API the dashboard relies on.
#[async_trait]
pub trait YoutubeApi: Send + Sync {
    async fn my_channel_id(&self) -> Result<String, DashboardError>;

    async fn list_videos(&self, channel_id: &str) -> Result<Vec<Video>, DashboardError>;

    async fn list_comments(&self, video_id: &str) -> Result<Vec<Comment>, DashboardError>;

    /// Deleting a comment YouTube no longer knows about counts as success.
    async fn delete_comment(&self, comment_id: &str) -> Result<(), DashboardError>;
}
