use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    domain::{Comment, Video},
    error::DashboardError,
};

use super::{
    types::{ApiErrorResponse, ChannelListResponse, CommentThreadListResponse, SearchListResponse},
    CredentialProvider, YoutubeApi,
};

pub const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
const MAX_VIDEOS: &str = "50";
const MAX_COMMENTS: &str = "100";

static CHANNEL_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^UC[a-zA-Z0-9_-]{22}$").expect("valid channel id regex"));

pub fn is_valid_channel_id(channel_id: &str) -> bool {
    CHANNEL_ID_REGEX.is_match(channel_id)
}

#[derive(Clone)]
pub struct YoutubeClient {
    http: Client,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
}

impl YoutubeClient {
    pub fn new(http: Client, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http,
            credentials,
            base_url: YOUTUBE_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn bearer(&self) -> Result<String, DashboardError> {
        self.credentials
            .access_token()
            .ok_or(DashboardError::AuthenticationMissing)
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), resource)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DashboardError> {
        let token = self.bearer()?;
        let response = self
            .http
            .get(self.endpoint(resource))
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|err| DashboardError::upstream(operation, err))?;

        if !response.status().is_success() {
            return Err(upstream_failure(operation, response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|err| DashboardError::upstream(operation, err))
    }
}

#[async_trait]
impl YoutubeApi for YoutubeClient {
    async fn my_channel_id(&self) -> Result<String, DashboardError> {
        let channels: ChannelListResponse = self
            .get_json("channel lookup", "channels", &[("part", "id"), ("mine", "true")])
            .await?;
        channels
            .items
            .into_iter()
            .next()
            .map(|item| item.id)
            .ok_or(DashboardError::ChannelNotFound)
    }

    async fn list_videos(&self, channel_id: &str) -> Result<Vec<Video>, DashboardError> {
        if !is_valid_channel_id(channel_id) {
            return Err(DashboardError::InvalidChannelId(channel_id.to_string()));
        }

        let search: SearchListResponse = self
            .get_json(
                "video listing",
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id),
                    ("maxResults", MAX_VIDEOS),
                    ("type", "video"),
                ],
            )
            .await?;

        let videos: Vec<Video> = search
            .items
            .into_iter()
            .filter_map(|item| item.into_video())
            .collect();
        tracing::info!(target: "youtube", channel_id, total = videos.len(), "videos listed");
        Ok(videos)
    }

    async fn list_comments(&self, video_id: &str) -> Result<Vec<Comment>, DashboardError> {
        let threads: CommentThreadListResponse = self
            .get_json(
                "comment listing",
                "commentThreads",
                &[
                    ("part", "snippet"),
                    ("videoId", video_id),
                    ("maxResults", MAX_COMMENTS),
                ],
            )
            .await?;

        let comments: Vec<Comment> = threads.items.into_iter().map(Comment::from).collect();
        tracing::debug!(target: "youtube", video_id, total = comments.len(), "comments listed");
        Ok(comments)
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), DashboardError> {
        let token = self.bearer()?;
        let response = self
            .http
            .delete(self.endpoint("comments"))
            .bearer_auth(token)
            .query(&[("id", comment_id)])
            .send()
            .await
            .map_err(|err| DashboardError::Deletion {
                comment_id: comment_id.to_string(),
                status: None,
                message: err.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match status {
            StatusCode::NOT_FOUND => {
                tracing::info!(target: "youtube", comment_id, "comment already gone upstream");
                Ok(())
            }
            StatusCode::UNAUTHORIZED => Err(DashboardError::AuthenticationMissing),
            _ => Err(DashboardError::Deletion {
                comment_id: comment_id.to_string(),
                status: Some(status.as_u16()),
                message: read_error_message(response).await,
            }),
        }
    }
}

async fn upstream_failure(operation: &'static str, response: Response) -> DashboardError {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return DashboardError::AuthenticationMissing;
    }
    let message = read_error_message(response).await;
    tracing::error!(
        target: "youtube",
        operation,
        status = status.as_u16(),
        %message,
        "YouTube API error"
    );
    DashboardError::UpstreamRequestFailed {
        operation,
        status: Some(status.as_u16()),
        message,
    }
}

async fn read_error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ApiErrorResponse>(&body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("YouTube API returned {status}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const CHANNEL: &str = "UCabcdefghijklmnopqrstuv";

    struct StaticToken(Option<&'static str>);

    impl CredentialProvider for StaticToken {
        fn access_token(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn test_client(server: &MockServer, token: Option<&'static str>) -> YoutubeClient {
        YoutubeClient::new(Client::new(), Arc::new(StaticToken(token))).with_base_url(server.uri())
    }

    #[test]
    fn channel_id_shape() {
        assert!(is_valid_channel_id(CHANNEL));
        assert!(!is_valid_channel_id("UCshort"));
        assert!(!is_valid_channel_id("XXabcdefghijklmnopqrstuv"));
    }

    #[tokio::test]
    async fn lists_videos_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("channelId", CHANNEL))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {
                        "id": {"videoId": "vid1"},
                        "snippet": {"title": "First", "publishedAt": "2024-03-01T10:00:00Z"}
                    },
                    {
                        "id": {"playlistId": "pl"},
                        "snippet": {"title": "Playlist", "publishedAt": "2024-03-02T10:00:00Z"}
                    }
                ]
            })))
            .mount(&server)
            .await;

        let videos = test_client(&server, Some("tok"))
            .list_videos(CHANNEL)
            .await
            .unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, "vid1");
        assert_eq!(videos[0].title, "First");
        assert_eq!(videos[0].comment_count(), 0);
    }

    #[tokio::test]
    async fn rejects_malformed_channel_id_before_calling() {
        let server = MockServer::start().await;
        let err = test_client(&server, Some("tok"))
            .list_videos("not-a-channel")
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidChannelId(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_token_is_authentication_error() {
        let server = MockServer::start().await;
        let err = test_client(&server, None)
            .list_comments("vid1")
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::AuthenticationMissing));
    }

    #[tokio::test]
    async fn maps_comment_threads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commentThreads"))
            .and(query_param("videoId", "vid1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "id": "thread-1",
                    "snippet": {"topLevelComment": {"snippet": {
                        "authorDisplayName": "Budi",
                        "textDisplay": "main di situs judol",
                        "videoId": "vid1",
                        "publishedAt": "2024-03-03T08:30:00Z"
                    }}}
                }]
            })))
            .mount(&server)
            .await;

        let comments = test_client(&server, Some("tok"))
            .list_comments("vid1")
            .await
            .unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, "thread-1");
        assert_eq!(comments[0].author, "Budi");
        assert!(comments[0].classification.is_none());
    }

    #[tokio::test]
    async fn surfaces_google_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commentThreads"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "The video has disabled comments."}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server, Some("tok"))
            .list_comments("vid1")
            .await
            .unwrap_err();
        match err {
            DashboardError::UpstreamRequestFailed { status, message, .. } => {
                assert_eq!(status, Some(403));
                assert!(message.contains("disabled comments"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn channel_lookup_without_items_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels"))
            .and(query_param("mine", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let err = test_client(&server, Some("tok"))
            .my_channel_id()
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::ChannelNotFound));
    }

    #[tokio::test]
    async fn delete_treats_missing_comment_as_done() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/comments"))
            .and(query_param("id", "gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/comments"))
            .and(query_param("id", "locked"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"message": "Insufficient permissions"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server, Some("tok"));
        client.delete_comment("gone").await.unwrap();

        let err = client.delete_comment("locked").await.unwrap_err();
        match err {
            DashboardError::Deletion { comment_id, status, message } => {
                assert_eq!(comment_id, "locked");
                assert_eq!(status, Some(403));
                assert_eq!(message, "Insufficient permissions");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
