use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    domain::{filter_by_keyword, ClassificationResult},
    error::DashboardError,
    state::NoticeLevel,
    tasks::{DeletionReport, FleetReport, VideoAnalysis},
};

use super::{
    types::{
        BulkDeleteRequest, ChannelResponse, ClassifyBatchRequest, ClassifyBatchResponse,
        ClassifyRequest, CommentsResponse, DashboardState, DeleteResponse, FetchCommentsRequest,
        HealthResponse, NotificationsResponse, SessionResponse, SettingsResponse, SettingsUpdate,
        TokenUpdate, VideoListResponse, VideoQuery,
    },
    utils::extract_video_id,
};

type ApiResult<T> = Result<Json<T>, DashboardError>;

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/channel", get(channel))
        .route("/api/videos", get(list_videos))
        .route("/api/videos/analyze", post(analyze_all))
        .route("/api/videos/{video_id}/analyze", post(analyze_video))
        .route("/api/comments", get(active_comments))
        .route("/api/comments/fetch", post(fetch_comments))
        .route("/api/comments/delete", post(delete_comments))
        .route("/api/comments/{comment_id}", delete(delete_comment))
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/session/token", put(update_token))
        .route("/api/notifications", get(drain_notifications))
        .route("/api/classify", post(classify))
        .route("/api/classify/batch", post(classify_batch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<DashboardState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        analysis_running: state.store.is_analysis_running(),
    })
}

async fn channel(State(state): State<DashboardState>) -> ApiResult<ChannelResponse> {
    let channel_id = state.fleet.resolve_channel().await?;
    Ok(Json(ChannelResponse { channel_id }))
}

async fn list_videos(
    State(state): State<DashboardState>,
    Query(query): Query<VideoQuery>,
) -> ApiResult<VideoListResponse> {
    let channel_id = query.channel_id.filter(|id| !id.trim().is_empty());
    let videos = state.fleet.refresh_videos(channel_id).await?;
    Ok(Json(VideoListResponse {
        channel_id: state.store.channel_id(),
        videos: videos.as_ref().clone(),
    }))
}

async fn analyze_all(State(state): State<DashboardState>) -> ApiResult<FleetReport> {
    Ok(Json(state.fleet.analyze_all().await?))
}

async fn analyze_video(
    State(state): State<DashboardState>,
    Path(video_id): Path<String>,
) -> ApiResult<VideoAnalysis> {
    if state.store.video(&video_id).is_none() {
        return Err(DashboardError::VideoNotFound(video_id));
    }
    Ok(Json(state.fleet.analyze_one(&video_id).await?))
}

/// Opens a video the dashboard may not have listed, by link or bare id.
async fn fetch_comments(
    State(state): State<DashboardState>,
    Json(body): Json<FetchCommentsRequest>,
) -> ApiResult<VideoAnalysis> {
    let video_id = extract_video_id(&body.video_url)?;
    tracing::info!(target: "dashboard", %video_id, "opening comments from pasted link");
    Ok(Json(state.fleet.analyze_one(&video_id).await?))
}

async fn active_comments(State(state): State<DashboardState>) -> Json<CommentsResponse> {
    let keyword = state.store.settings().keyword;
    let comments = state.store.active_comments();
    let potential_spam = filter_by_keyword(&comments, &keyword);
    Json(CommentsResponse {
        keyword,
        comments: comments.as_ref().clone(),
        potential_spam,
    })
}

async fn delete_comment(
    State(state): State<DashboardState>,
    Path(comment_id): Path<String>,
) -> ApiResult<DeleteResponse> {
    let outcome = state.reconciler.delete_comment(&comment_id).await?;
    Ok(Json(DeleteResponse {
        comment_id,
        removed_from_view: outcome.removed_from_view,
        videos_updated: outcome.videos_updated,
    }))
}

async fn delete_comments(
    State(state): State<DashboardState>,
    Json(body): Json<BulkDeleteRequest>,
) -> ApiResult<DeletionReport> {
    Ok(Json(state.reconciler.delete_many(&body.comment_ids).await?))
}

async fn get_settings(State(state): State<DashboardState>) -> Json<SettingsResponse> {
    Json(state.store.settings().into())
}

/// Takes effect for the next analysis; results already on screen keep the
/// flags they were computed with.
async fn update_settings(
    State(state): State<DashboardState>,
    Json(body): Json<SettingsUpdate>,
) -> Json<SettingsResponse> {
    let keyword = body.keyword.map(|keyword| keyword.trim().to_string());
    let settings = state.store.update_settings(keyword, body.ai_enabled);
    tracing::info!(
        target: "dashboard",
        keyword = %settings.keyword,
        ai_enabled = settings.ai_enabled,
        "detection settings updated"
    );
    Json(settings.into())
}

async fn update_token(
    State(state): State<DashboardState>,
    Json(body): Json<TokenUpdate>,
) -> Json<SessionResponse> {
    state.store.set_access_token(body.access_token);
    let authenticated = state.store.has_access_token();
    if authenticated {
        state.store.notify(NoticeLevel::Info, "Signed in to YouTube");
    } else {
        state.store.notify(NoticeLevel::Warning, "Signed out of YouTube");
    }
    Json(SessionResponse { authenticated })
}

async fn drain_notifications(State(state): State<DashboardState>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        notifications: state.store.notifications().drain(),
    })
}

async fn classify(
    State(state): State<DashboardState>,
    Json(body): Json<ClassifyRequest>,
) -> ApiResult<ClassificationResult> {
    Ok(Json(state.classifier.classify(&body.comment).await?))
}

async fn classify_batch(
    State(state): State<DashboardState>,
    Json(body): Json<ClassifyBatchRequest>,
) -> ApiResult<ClassifyBatchResponse> {
    let results = state.classifier.classify_many(&body.comments).await?;
    Ok(Json(ClassifyBatchResponse { results }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        ai::SpamClassifier,
        domain::RiskLevel,
        tasks::{DeletionReconciler, FleetCoordinator, VideoAnalyzer},
        testing::{comment, session_store, FakeYoutube, ScriptedClassifier},
    };

    fn dashboard(youtube: FakeYoutube, classifier: ScriptedClassifier) -> (Router, DashboardState) {
        let store = session_store("judol", true);
        let youtube = Arc::new(youtube);
        let classifier: Arc<dyn SpamClassifier> = Arc::new(classifier);
        let analyzer = Arc::new(VideoAnalyzer::new(
            store.clone(),
            youtube.clone(),
            classifier.clone(),
            4,
        ));
        let state = DashboardState {
            store: store.clone(),
            fleet: Arc::new(FleetCoordinator::new(store.clone(), youtube.clone(), analyzer)),
            reconciler: Arc::new(DeletionReconciler::new(store, youtube)),
            classifier,
        };
        (router(state.clone()), state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn channel_videos() -> FakeYoutube {
        FakeYoutube::new()
            .with_video(
                "v1",
                vec![
                    comment("c1", "v1", "main judol yuk"),
                    comment("c2", "v1", "mantap"),
                ],
            )
            .with_video("v2", vec![comment("c3", "v2", "ok")])
    }

    #[tokio::test]
    async fn health_reports_idle() {
        let (app, _) = dashboard(FakeYoutube::new(), ScriptedClassifier::new());
        let (status, body) = send(&app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["analysisRunning"], false);
    }

    #[tokio::test]
    async fn list_then_analyze_channel() {
        let (app, _) = dashboard(channel_videos(), ScriptedClassifier::new());

        let (status, body) = send(&app, Method::GET, "/api/videos", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["channelId"], FakeYoutube::CHANNEL_ID);
        assert_eq!(body["videos"].as_array().unwrap().len(), 2);
        assert_eq!(body["videos"][0]["status"], "notAnalyzed");

        let (status, report) = send(&app, Method::POST, "/api/videos/analyze", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["analyzed"], json!(["v1", "v2"]));

        let (_, body) = send(&app, Method::GET, "/api/videos", None).await;
        assert_eq!(body["videos"][0]["status"], "analyzed");
        assert_eq!(body["videos"][0]["spamProbability"], 50.0);
        assert_eq!(body["videos"][0]["commentCount"], 2);
    }

    #[tokio::test]
    async fn unknown_video_is_not_found() {
        let (app, _) = dashboard(channel_videos(), ScriptedClassifier::new());
        let (status, body) = send(&app, Method::POST, "/api/videos/nope/analyze", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn busy_analysis_is_a_conflict() {
        let (app, state) = dashboard(channel_videos(), ScriptedClassifier::new());
        send(&app, Method::GET, "/api/videos", None).await;

        let _held = state.store.try_begin_analysis().unwrap();
        let (status, _) = send(&app, Method::POST, "/api/videos/v1/analyze", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn pasted_link_opens_comments() {
        let youtube = FakeYoutube::new().with_video(
            "dQw4w9WgXcQ",
            vec![
                comment("c1", "dQw4w9WgXcQ", "situs judol gacor"),
                comment("c2", "dQw4w9WgXcQ", "lagu enak"),
            ],
        );
        let (app, _) = dashboard(youtube, ScriptedClassifier::new());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/comments/fetch",
            Some(json!({ "videoUrl": "https://youtu.be/dQw4w9WgXcQ" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["videoId"], "dQw4w9WgXcQ");
        assert_eq!(body["usedAi"], true);

        let (_, view) = send(&app, Method::GET, "/api/comments", None).await;
        assert_eq!(view["comments"].as_array().unwrap().len(), 2);
        assert_eq!(view["potentialSpam"][0]["id"], "c1");
    }

    #[tokio::test]
    async fn bad_link_is_rejected() {
        let (app, _) = dashboard(FakeYoutube::new(), ScriptedClassifier::new());
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/comments/fetch",
            Some(json!({ "videoUrl": "https://example.com/clip" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_without_credential_is_unauthorized() {
        let (app, _) = dashboard(FakeYoutube::new().signed_out(), ScriptedClassifier::new());
        let (status, body) = send(&app, Method::DELETE, "/api/comments/c1", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn deletion_updates_the_view() {
        let (app, state) = dashboard(channel_videos(), ScriptedClassifier::new());
        send(&app, Method::GET, "/api/videos", None).await;
        send(&app, Method::POST, "/api/videos/v1/analyze", None).await;

        let (status, body) = send(&app, Method::DELETE, "/api/comments/c1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removedFromView"], true);
        assert_eq!(body["videosUpdated"], json!(["v1"]));
        assert_eq!(state.store.video("v1").unwrap().spam_probability(), 0.0);

        let (status, report) = send(
            &app,
            Method::POST,
            "/api/comments/delete",
            Some(json!({ "commentIds": ["c2", "c3"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["deleted"], json!(["c2", "c3"]));
        assert!(state.store.active_comments().is_empty());
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let (app, state) = dashboard(FakeYoutube::new(), ScriptedClassifier::new());
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/settings",
            Some(json!({ "keyword": "  slot ", "aiEnabled": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "keyword": "slot", "aiEnabled": false }));

        let (_, body) = send(&app, Method::GET, "/api/settings", None).await;
        assert_eq!(body["keyword"], "slot");
        assert!(!state.store.settings().ai_enabled);
    }

    #[tokio::test]
    async fn token_hand_off_and_notifications() {
        let (app, state) = dashboard(FakeYoutube::new(), ScriptedClassifier::new());
        let (_, body) = send(
            &app,
            Method::PUT,
            "/api/session/token",
            Some(json!({ "accessToken": "   " })),
        )
        .await;
        assert_eq!(body["authenticated"], false);
        assert!(!state.store.has_access_token());

        let (_, body) = send(&app, Method::GET, "/api/notifications", None).await;
        assert_eq!(body["notifications"][0]["level"], "warning");
        let (_, body) = send(&app, Method::GET, "/api/notifications", None).await;
        assert!(body["notifications"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn classify_passthrough() {
        let classifier = ScriptedClassifier::new()
            .with_verdict("daftar sekarang", 0.93, RiskLevel::High)
            .failing_on("boom");
        let (app, _) = dashboard(FakeYoutube::new(), classifier);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/classify",
            Some(json!({ "comment": "daftar sekarang" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["riskLevel"], "HIGH");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/classify/batch",
            Some(json!({ "comments": ["daftar sekarang", "halo"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        assert_eq!(body["results"][1]["riskLevel"], "LOW");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/classify",
            Some(json!({ "comment": "boom" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
