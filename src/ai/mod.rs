use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ClassificationResult;

pub mod client;
pub mod inference;

pub use client::GradioClient;

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("inference endpoint unreachable after {attempts} attempts: {reason}")]
    Unreachable { attempts: u32, reason: String },

    #[error("inference call timed out after {0:?}")]
    Timeout(Duration),

    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference endpoint reported an error: {0}")]
    Remote(String),

    #[error("unparseable inference response: {0}")]
    Malformed(String),
}

/// Scores comment texts.
#[async_trait]
pub trait SpamClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassificationError>;

    /// One result per input, in input order. The default scores texts one by
    /// one and fails on the first error.
    async fn classify_many(
        &self,
        texts: &[String],
    ) -> Result<Vec<ClassificationResult>, ClassificationError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.classify(text).await?);
        }
        Ok(results)
    }
}
