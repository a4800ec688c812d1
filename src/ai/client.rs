use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde_json::{json, Value};
use tokio::time::{sleep, timeout, Instant};

use crate::{config::ClassifierConfig, domain::ClassificationResult};

use super::{
    inference::{
        build_csv, parse_batch_predictions, parse_event_stream, parse_single_prediction,
        result_from_score, FileData, PredictRequest, QueuedCall, SpaceConfig, SpaceSession,
        FILE_INPUT_ENDPOINT, JUDOL_SPACE_URL, SINGLE_INPUT_ENDPOINT,
    },
    ClassificationError, SpamClassifier,
};

const BATCH_FILE_NAME: &str = "comments.csv";

/// Client for the hosted judol classifier.
///
/// Every call first establishes a session against the space (bounded retries
/// with a fixed backoff, each attempt raced against a timer), then runs the
/// prediction under the same per-attempt timeout.
#[derive(Clone)]
pub struct GradioClient {
    http: Client,
    config: ClassifierConfig,
    base_url: String,
}

impl GradioClient {
    pub fn new(http: Client, config: ClassifierConfig) -> Self {
        Self {
            http,
            config,
            base_url: JUDOL_SPACE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Scores many comments through the CSV file endpoint. Returns one
    /// probability per input, in input order.
    pub async fn classify_batch(&self, texts: &[String]) -> Result<Vec<f64>, ClassificationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let session = self.connect_with_retry().await?;
        let uploaded = self.upload_csv(&session, build_csv(texts)).await?;
        let data = self
            .predict(
                &session,
                FILE_INPUT_ENDPOINT,
                json!([FileData::new(uploaded, BATCH_FILE_NAME)]),
            )
            .await?;

        let scores = parse_batch_predictions(&data)?;
        if scores.len() != texts.len() {
            return Err(ClassificationError::Malformed(format!(
                "expected {} scores, got {}",
                texts.len(),
                scores.len()
            )));
        }
        tracing::info!(target: "classifier", total = scores.len(), "batch predictions received");
        Ok(scores)
    }

    async fn connect_with_retry(&self) -> Result<SpaceSession, ClassificationError> {
        let attempts = self.config.max_attempts.max(1);
        let mut last_failure = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                tracing::info!(
                    target: "classifier",
                    attempt,
                    remaining = attempts - attempt + 1,
                    "retrying inference connection"
                );
                sleep(self.config.retry_backoff).await;
            }

            match timeout(self.config.attempt_timeout, self.connect()).await {
                Ok(Ok(session)) => return Ok(session),
                Ok(Err(err)) => {
                    tracing::warn!(
                        target: "classifier",
                        attempt,
                        error = %err,
                        "inference connection failed"
                    );
                    last_failure = err.to_string();
                }
                Err(_) => {
                    tracing::warn!(
                        target: "classifier",
                        attempt,
                        timeout = ?self.config.attempt_timeout,
                        "inference connection timed out"
                    );
                    last_failure = format!("timed out after {:?}", self.config.attempt_timeout);
                }
            }
        }

        Err(ClassificationError::Unreachable {
            attempts,
            reason: last_failure,
        })
    }

    async fn connect(&self) -> Result<SpaceSession, ClassificationError> {
        let config: SpaceConfig = self
            .http
            .get(format!("{}/config", self.base_url.trim_end_matches('/')))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(SpaceSession::new(&self.base_url, config))
    }

    async fn predict(
        &self,
        session: &SpaceSession,
        endpoint: &str,
        data: Value,
    ) -> Result<Value, ClassificationError> {
        let call = async {
            let queued: QueuedCall = self
                .http
                .post(session.call_url(endpoint))
                .json(&PredictRequest { data })
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            let body = self
                .http
                .get(session.result_url(endpoint, &queued.event_id))
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;

            parse_event_stream(&body)
        };

        // Dropping `call` on timeout discards whatever it would have returned.
        timeout(self.config.attempt_timeout, call)
            .await
            .map_err(|_| ClassificationError::Timeout(self.config.attempt_timeout))?
    }

    async fn upload_csv(
        &self,
        session: &SpaceSession,
        csv: String,
    ) -> Result<String, ClassificationError> {
        let upload = async {
            let part = Part::text(csv)
                .file_name(BATCH_FILE_NAME)
                .mime_str("text/csv")?;
            let paths: Vec<String> = self
                .http
                .post(session.upload_url())
                .multipart(Form::new().part("files", part))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            paths
                .into_iter()
                .next()
                .ok_or_else(|| {
                    ClassificationError::Malformed("upload returned no file path".into())
                })
        };

        timeout(self.config.attempt_timeout, upload)
            .await
            .map_err(|_| ClassificationError::Timeout(self.config.attempt_timeout))?
    }
}

#[async_trait]
impl SpamClassifier for GradioClient {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassificationError> {
        let started = Instant::now();
        let session = self.connect_with_retry().await?;
        let data = self
            .predict(&session, SINGLE_INPUT_ENDPOINT, json!([text]))
            .await?;
        let result = parse_single_prediction(&data)?;

        tracing::debug!(
            target: "classifier",
            probability = result.probability,
            risk = %result.risk_level,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "comment classified"
        );
        Ok(result)
    }

    async fn classify_many(
        &self,
        texts: &[String],
    ) -> Result<Vec<ClassificationResult>, ClassificationError> {
        let scores = self.classify_batch(texts).await?;
        Ok(scores.into_iter().map(result_from_score).collect())
    }
}
