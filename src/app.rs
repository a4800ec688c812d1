use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use reqwest::Client;
use tokio::{net::TcpListener, time::timeout};

use crate::{
    ai::{GradioClient, SpamClassifier},
    config::{AppConfig, ServerConfig},
    dashboard::{self, DashboardState},
    domain::DetectionSettings,
    infrastructure::shutdown::Shutdown,
    state::SessionStore,
    tasks::{DeletionReconciler, FleetCoordinator, VideoAnalyzer},
    youtube::{YoutubeApi, YoutubeClient},
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DashboardApp {
    server: ServerConfig,
    router: Router,
    shutdown: Shutdown,
}

impl DashboardApp {
    pub fn initialize(config: AppConfig, shutdown: Shutdown) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(format!("judol-guard/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let settings = DetectionSettings::from(&config.detection);
        if config.youtube.access_token.is_none() {
            tracing::warn!(
                target: "youtube",
                "YOUTUBE_ACCESS_TOKEN is not set; sign in through /api/session/token"
            );
        }
        let store = Arc::new(SessionStore::new(
            settings,
            config.youtube.access_token.clone(),
            config.youtube.channel_id.clone(),
        ));

        let youtube: Arc<dyn YoutubeApi> =
            Arc::new(YoutubeClient::new(http_client.clone(), store.clone()));
        let classifier: Arc<dyn SpamClassifier> = Arc::new(GradioClient::new(
            http_client,
            config.classifier.clone(),
        ));

        let analyzer = Arc::new(VideoAnalyzer::new(
            store.clone(),
            youtube.clone(),
            classifier.clone(),
            config.classifier.max_in_flight,
        ));
        let fleet = Arc::new(FleetCoordinator::new(store.clone(), youtube.clone(), analyzer));
        let reconciler = Arc::new(DeletionReconciler::new(store.clone(), youtube));

        let router = dashboard::router(DashboardState {
            store,
            fleet,
            reconciler,
            classifier,
        });

        tracing::info!(
            target: "dashboard",
            keyword = %config.detection.keyword,
            ai_enabled = config.detection.ai_enabled,
            channel = config.youtube.channel_id.as_deref().unwrap_or("<signed-in user>"),
            "dashboard initialized"
        );

        Ok(Self {
            server: config.server,
            router,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let DashboardApp {
            server,
            router,
            shutdown,
        } = self;

        let addr = server.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind dashboard to {addr}"))?;
        tracing::info!(target: "dashboard", %addr, "judol dashboard listening");

        let mut graceful = shutdown.subscribe();
        let mut server_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { graceful.notified().await })
                .await
        });

        let mut shutdown_listener = shutdown.subscribe();
        tokio::select! {
            _ = shutdown_listener.notified() => {
                tracing::info!("shutdown signal received (CTRL+C / SIGTERM)");
            }
            res = &mut server_handle => {
                res.context("dashboard server task panicked")?
                    .context("dashboard server stopped unexpectedly")?;
                return Ok(());
            }
        }

        match timeout(SHUTDOWN_TIMEOUT, &mut server_handle).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(err))) => {
                tracing::error!(target: "dashboard", error = %err, "server error during shutdown");
            }
            Ok(Err(err)) => {
                tracing::error!(
                    target: "dashboard",
                    error = %err,
                    "server task failed during shutdown"
                );
            }
            Err(_) => {
                tracing::warn!(
                    target: "dashboard",
                    "open connections did not drain within {:?}; aborting",
                    SHUTDOWN_TIMEOUT
                );
                server_handle.abort();
            }
        }

        tracing::info!("dashboard stopped");
        Ok(())
    }
}
