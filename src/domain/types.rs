use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;

/// Model probability a comment must exceed before its risk level is consulted.
pub const SPAM_PROBABILITY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Medium,
    #[default]
    Low,
}

impl RiskLevel {
    /// HIGH and MEDIUM are the tiers that count towards spam.
    pub fn is_elevated(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Medium)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(RiskLevel::High),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "LOW" => Ok(RiskLevel::Low),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Outcome of one remote classification.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub processing_time_seconds: f64,
}

impl ClassificationResult {
    pub fn is_spam(&self) -> bool {
        self.probability > SPAM_PROBABILITY_THRESHOLD && self.risk_level.is_elevated()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisStatus {
    #[default]
    NotAnalyzed,
    Analyzing,
    Analyzed,
    Failed,
}

/// User-editable detection switches for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSettings {
    pub keyword: String,
    pub ai_enabled: bool,
}

impl From<&DetectionConfig> for DetectionSettings {
    fn from(cfg: &DetectionConfig) -> Self {
        Self {
            keyword: cfg.keyword.clone(),
            ai_enabled: cfg.ai_enabled,
        }
    }
}
