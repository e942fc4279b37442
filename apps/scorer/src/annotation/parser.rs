//! Turns the model's reply into a `ScoreResult`.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::llm_client::strip_json_fences;
use crate::models::ScoreResult;

#[derive(Debug, Error)]
pub enum ScoreParseError {
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Parses a reply of the form `{"score": 85, "reason": "..."}`, optionally
/// wrapped in a markdown code fence. Never fails: an unparseable reply is
/// logged and yields an empty result so the row is still counted.
pub fn parse_score_result(raw_text: &str) -> ScoreResult {
    match try_parse_score_result(raw_text) {
        Ok(result) => result,
        Err(e) => {
            warn!("Could not parse model reply: {e}");
            ScoreResult::default()
        }
    }
}

pub fn try_parse_score_result(raw_text: &str) -> Result<ScoreResult, ScoreParseError> {
    let cleaned = strip_json_fences(raw_text);
    match serde_json::from_str::<Value>(cleaned)? {
        Value::Object(fields) => Ok(from_fields(&fields)),
        other => Err(ScoreParseError::NotAnObject(json_kind(&other))),
    }
}

fn from_fields(fields: &Map<String, Value>) -> ScoreResult {
    let score = fields.get("score").and_then(|value| {
        let score = score_from_value(value);
        if score.is_none() && !value.is_null() {
            warn!("Ignoring non-integer score {value}");
        }
        score
    });
    let reason = fields.get("reason").and_then(reason_from_value);
    ScoreResult { score, reason }
}

/// Integers as-is; integral floats and numeric strings are accepted too.
fn score_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn reason_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
