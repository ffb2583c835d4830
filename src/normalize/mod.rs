//! Record normalization.
//!
//! Turns raw payloads from a record source into validated `MatchRecord`s.
//! Payloads that fail validation are skipped, never partially admitted.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::models::{MatchId, MatchRecord, RawPayload};

/// Why a payload was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Body is not valid JSON
    InvalidJson,
    /// Body is JSON but not an object
    NotAnObject,
    /// Required key missing, empty, or not a string
    MissingField(&'static str),
    /// Both sides name the same player
    SamePlayer,
    /// Winner is neither of the two players
    UnknownWinner,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InvalidJson => write!(f, "payload is not valid JSON"),
            SkipReason::NotAnObject => write!(f, "payload is not a JSON object"),
            SkipReason::MissingField(key) => write!(f, "missing or empty field '{}'", key),
            SkipReason::SamePlayer => write!(f, "playerA and playerB are the same"),
            SkipReason::UnknownWinner => write!(f, "winner is neither playerA nor playerB"),
        }
    }
}

/// Recognized payload keys. Values stay untyped until validated.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchPayload {
    player_a: Option<Value>,
    player_b: Option<Value>,
    race_a: Option<Value>,
    race_b: Option<Value>,
    winner: Option<Value>,
    region: Option<Value>,
    timestamp: Option<Value>,
    season: Option<Value>,
}

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n(.*?)```").expect("fenced block pattern is valid")
});

/// Pull the JSON text out of a payload body.
///
/// Issue bodies often wrap the object in a Markdown code fence, sometimes
/// after other fences (replay logs, build orders). The first fenced block
/// holding a JSON object wins; failing that, the first fenced block, so the
/// payload is reported as invalid JSON. Without fences the trimmed body is
/// returned as-is.
pub fn extract_json(body: &str) -> &str {
    let mut blocks = FENCED_BLOCK
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .peekable();

    let Some(&first) = blocks.peek() else {
        return body.trim();
    };
    blocks
        .find(|block| {
            serde_json::from_str::<Value>(block).is_ok_and(|value| value.is_object())
        })
        .unwrap_or(first)
}

/// Required fields must be non-empty strings; surrounding whitespace is dropped.
fn required_text(value: Option<Value>, key: &'static str) -> Result<String, SkipReason> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SkipReason::MissingField(key)),
    }
}

/// Optional fields accept strings or numbers; anything else counts as absent.
fn optional_text(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Validate one payload.
pub fn validate_payload(payload: &RawPayload) -> Result<MatchRecord, SkipReason> {
    let value: Value =
        serde_json::from_str(extract_json(&payload.body)).map_err(|_| SkipReason::InvalidJson)?;
    if !value.is_object() {
        return Err(SkipReason::NotAnObject);
    }
    let fields: MatchPayload =
        serde_json::from_value(value).map_err(|_| SkipReason::NotAnObject)?;

    let player_a = required_text(fields.player_a, "playerA")?;
    let player_b = required_text(fields.player_b, "playerB")?;
    let race_a = required_text(fields.race_a, "raceA")?;
    let race_b = required_text(fields.race_b, "raceB")?;
    let winner = required_text(fields.winner, "winner")?;
    let region = required_text(fields.region, "region")?;

    if player_a == player_b {
        return Err(SkipReason::SamePlayer);
    }
    if winner != player_a && winner != player_b {
        return Err(SkipReason::UnknownWinner);
    }

    Ok(MatchRecord {
        id: payload.id,
        player_a,
        player_b,
        race_a,
        race_b,
        winner,
        region,
        timestamp: optional_text(fields.timestamp),
        season: optional_text(fields.season),
    })
}

/// Normalize one payload, `None` meaning "skip".
pub fn normalize_payload(payload: &RawPayload) -> Option<MatchRecord> {
    match validate_payload(payload) {
        Ok(record) => Some(record),
        Err(reason) => {
            debug!("Skipping payload {}: {}", payload.id, reason);
            None
        }
    }
}

/// Outcome of normalizing a batch.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    /// Accepted records in input order
    pub records: Vec<MatchRecord>,
    /// Skipped payload ids with the reason
    pub skipped: Vec<(MatchId, SkipReason)>,
}

impl NormalizeReport {
    pub fn accepted(&self) -> usize {
        self.records.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Normalize a batch of payloads, keeping input order.
pub fn normalize_all(payloads: &[RawPayload]) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    for payload in payloads {
        match validate_payload(payload) {
            Ok(record) => report.records.push(record),
            Err(reason) => {
                debug!("Skipping payload {}: {}", payload.id, reason);
                report.skipped.push((payload.id, reason));
            }
        }
    }

    info!(
        "Normalized {} payloads: {} accepted, {} skipped",
        payloads.len(),
        report.accepted(),
        report.skipped_count()
    );
    report
}
