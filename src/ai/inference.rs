use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ClassificationResult, RiskLevel};

use super::ClassificationError;

/// Hosted space serving the Indonesian judol comment model.
pub const JUDOL_SPACE_URL: &str = "https://yekaii-ytb-comment-judol-indonesia.hf.space";
pub const SINGLE_INPUT_ENDPOINT: &str = "process_single_input";
pub const FILE_INPUT_ENDPOINT: &str = "process_file_input";
const DEFAULT_API_PREFIX: &str = "/gradio_api";

static PROBABILITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Probability of being judol: ([\d.]+)").expect("valid probability regex")
});
static RISK_LEVEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Judol Risk Level: (HIGH|MEDIUM|LOW)").expect("valid risk level regex")
});
static PROCESSING_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Processing time: ([\d.]+) seconds").expect("valid processing time regex")
});

/// Subset of the space's `/config` document we care about.
#[derive(Debug, Default, Deserialize)]
pub struct SpaceConfig {
    #[serde(default)]
    pub api_prefix: Option<String>,
}

/// A successful connection: where the space's API lives.
#[derive(Debug, Clone)]
pub struct SpaceSession {
    root: String,
    api_prefix: String,
}

impl SpaceSession {
    pub fn new(root: &str, config: SpaceConfig) -> Self {
        let api_prefix = config
            .api_prefix
            .map(|prefix| prefix.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());
        Self {
            root: root.trim_end_matches('/').to_string(),
            api_prefix,
        }
    }

    pub fn call_url(&self, endpoint: &str) -> String {
        format!("{}{}/call/{}", self.root, self.api_prefix, endpoint)
    }

    pub fn result_url(&self, endpoint: &str, event_id: &str) -> String {
        format!("{}/{}", self.call_url(endpoint), event_id)
    }

    pub fn upload_url(&self) -> String {
        format!("{}{}/upload", self.root, self.api_prefix)
    }
}

#[derive(Debug, Serialize)]
pub struct PredictRequest {
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct QueuedCall {
    pub event_id: String,
}

/// Reference to an uploaded file, as the file endpoint expects it.
#[derive(Debug, Serialize)]
pub struct FileData {
    pub path: String,
    pub orig_name: String,
    pub meta: FileMeta,
}

#[derive(Debug, Serialize)]
pub struct FileMeta {
    #[serde(rename = "_type")]
    pub kind: &'static str,
}

impl FileData {
    pub fn new(path: String, orig_name: &str) -> Self {
        Self {
            path,
            orig_name: orig_name.to_string(),
            meta: FileMeta {
                kind: "gradio.FileData",
            },
        }
    }
}

/// Reads the call's event stream and returns the `data` of its `complete` event.
pub fn parse_event_stream(body: &str) -> Result<Value, ClassificationError> {
    let mut event = "";
    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
            continue;
        }
        let Some(payload) = line.strip_prefix("data:") else {
            continue;
        };
        let payload = payload.trim();
        match event {
            "complete" => {
                return serde_json::from_str(payload).map_err(|err| {
                    ClassificationError::Malformed(format!("complete event payload: {err}"))
                });
            }
            "error" => return Err(ClassificationError::Remote(payload.to_string())),
            _ => {}
        }
    }
    Err(ClassificationError::Malformed(
        "event stream ended without a complete event".into(),
    ))
}

/// Interprets the output of the single-comment endpoint.
///
/// The model normally answers with a text block; a bare numeric score is
/// accepted too and mapped through [`result_from_score`].
pub fn parse_single_prediction(data: &Value) -> Result<ClassificationResult, ClassificationError> {
    let first = match data {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    match first {
        Some(Value::String(text)) => Ok(parse_prediction_text(text)),
        Some(Value::Number(score)) => score
            .as_f64()
            .map(result_from_score)
            .ok_or_else(|| ClassificationError::Malformed(format!("score out of range: {score}"))),
        Some(other) => Err(ClassificationError::Malformed(format!(
            "unexpected prediction payload: {other}"
        ))),
        None => Err(ClassificationError::Malformed("empty prediction payload".into())),
    }
}

/// Extracts probability, risk level and processing time from the model's
/// text output. Each field falls back on its own: probability 0, risk LOW,
/// processing time 0.
pub fn parse_prediction_text(text: &str) -> ClassificationResult {
    let probability = capture_f64(&PROBABILITY_REGEX, text)
        .map(|p| p.clamp(0.0, 1.0))
        .unwrap_or(0.0);
    let risk_level = RISK_LEVEL_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<RiskLevel>().ok())
        .unwrap_or_default();
    let processing_time_seconds = capture_f64(&PROCESSING_TIME_REGEX, text).unwrap_or(0.0);

    ClassificationResult {
        probability,
        risk_level,
        processing_time_seconds,
    }
}

/// Maps a bare score onto the three risk tiers.
pub fn result_from_score(score: f64) -> ClassificationResult {
    let probability = score.clamp(0.0, 1.0);
    let risk_level = if probability >= 0.7 {
        RiskLevel::High
    } else if probability >= 0.4 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };
    ClassificationResult {
        probability,
        risk_level,
        processing_time_seconds: 0.0,
    }
}

/// One-column CSV with a `text` header; every value quoted.
pub fn build_csv(texts: &[String]) -> String {
    let mut csv = String::from("text");
    for text in texts {
        csv.push('\n');
        csv.push('"');
        csv.push_str(&text.replace('"', "\"\""));
        csv.push('"');
    }
    csv
}

/// Interprets the file endpoint's output: newline separated scores or a
/// numeric array, possibly wrapped in the outer output list.
pub fn parse_batch_predictions(data: &Value) -> Result<Vec<f64>, ClassificationError> {
    match data {
        Value::String(text) => parse_score_lines(text),
        Value::Array(items) => match items.as_slice() {
            [Value::String(text)] => parse_score_lines(text),
            [inner @ Value::Array(_)] => parse_batch_predictions(inner),
            _ => items.iter().map(score_from_value).collect(),
        },
        other => Err(ClassificationError::Malformed(format!(
            "unexpected batch payload: {other}"
        ))),
    }
}

fn parse_score_lines(text: &str) -> Result<Vec<f64>, ClassificationError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<f64>()
                .map_err(|_| ClassificationError::Malformed(format!("not a score: {line:?}")))
        })
        .collect()
}

fn score_from_value(value: &Value) -> Result<f64, ClassificationError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ClassificationError::Malformed(format!("score out of range: {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ClassificationError::Malformed(format!("not a score: {s:?}"))),
        other => Err(ClassificationError::Malformed(format!("not a score: {other}"))),
    }
}

fn capture_f64(regex: &Regex, text: &str) -> Option<f64> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
