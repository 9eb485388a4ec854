//! Tolerant parsing of model replies into score records.
//!
//! Model replies are free text expected to contain one JSON object. Parsing
//! runs in two stages: first the whole reply is tried as JSON, then the first
//! brace-delimited block is extracted, cleaned of newlines and backslashes,
//! and tried again. Both stages accept only JSON objects. If neither stage
//! yields an object the reply is unparseable and the caller must treat the
//! scoring pass as failed.
//!
//! Field extraction is deliberately lenient: missing keys default (bands to
//! 0, `off_topic` to false, `confidence` to 0.0, `explanation` to empty) and
//! unknown keys are ignored. An object with none of the expected keys is
//! still a successful parse.

use crate::performance::{AnalyticScores, HolisticScore, OffTopicAnalysis};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static JSON_BLOCK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*?\}").expect("JSON block regex should be valid"));

/// Parses an analytic scoring reply.
///
/// Expected shape: `{ grammar, vocabulary, content, fluency, pronunciation,
/// overall }`, all integer bands.
#[must_use]
pub fn parse_analytic(response: &str) -> Option<AnalyticScores> {
    let map = parse_object(response)?;
    Some(AnalyticScores {
        grammar: int_field(&map, "grammar"),
        vocabulary: int_field(&map, "vocabulary"),
        content: int_field(&map, "content"),
        fluency: int_field(&map, "fluency"),
        pronunciation: int_field(&map, "pronunciation"),
        overall: int_field(&map, "overall"),
    })
}

/// Parses a holistic scoring reply of shape `{ overall_score }`.
#[must_use]
pub fn parse_holistic(response: &str) -> Option<HolisticScore> {
    let map = parse_object(response)?;
    Some(HolisticScore { overall_score: int_field(&map, "overall_score") })
}

/// Parses an off-topic detection reply of shape
/// `{ off_topic, confidence, explanation }`.
#[must_use]
pub fn parse_off_topic(response: &str) -> Option<OffTopicAnalysis> {
    let map = parse_object(response)?;
    Some(OffTopicAnalysis {
        is_off_topic: bool_field(&map, "off_topic"),
        confidence: float_field(&map, "confidence"),
        explanation: string_field(&map, "explanation"),
    })
}

/// Runs the two-stage parse. Returns the fields of the first JSON object
/// found, or `None` if neither stage produced an object.
fn parse_object(response: &str) -> Option<Map<String, Value>> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(response) {
        return Some(map);
    }

    // Recovery stage: take the first brace-delimited block and retry after
    // dropping newlines and backslashes, which models like to sprinkle into
    // otherwise-valid JSON.
    let block = JSON_BLOCK_REGEX.find(response)?;
    let cleaned: String = block.as_str().chars().filter(|c| *c != '\n' && *c != '\\').collect();
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn int_field(map: &Map<String, Value>, key: &str) -> i64 {
    match map.get(key) {
        Some(Value::Number(n)) => {
            n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0)
        }
        _ => 0,
    }
}

fn bool_field(map: &Map<String, Value>, key: &str) -> bool {
    matches!(map.get(key), Some(Value::Bool(true)))
}

fn float_field(map: &Map<String, Value>, key: &str) -> f64 {
    match map.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}
