use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{keyword::keyword_flags, types::ClassificationResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub video_id: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_spam: Option<bool>,
}

impl Comment {
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        text: impl Into<String>,
        video_id: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            text: text.into(),
            video_id: video_id.into(),
            published_at,
            classification: None,
            is_spam: None,
        }
    }

    /// Attaches (or clears) the model result and derives `is_spam` from it and
    /// the active keyword.
    ///
    /// Unlike [`filter_by_keyword`](super::keyword::filter_by_keyword), where an
    /// empty keyword matches everything, a blank keyword flags nothing here.
    pub fn annotate(&mut self, classification: Option<ClassificationResult>, keyword: &str) {
        let ai_flag = classification.map_or(false, |result| result.is_spam());
        self.classification = classification;
        self.is_spam = Some(ai_flag || keyword_flags(&self.text, keyword));
    }

    pub fn flagged(&self) -> bool {
        self.is_spam.unwrap_or(false)
    }
}
