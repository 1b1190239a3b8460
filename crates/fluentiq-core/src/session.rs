use crate::error::{FluentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Named scores of one session.
///
/// Every field is `None` when the analysis did not compute it. `None` is
/// never the same as 0 here; see [`crate::types::absent_as_zero`] for the
/// one place the two are allowed to merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub overall: Option<f64>,
    pub fluency: Option<f64>,
    pub grammar: Option<f64>,
    pub coherence: Option<f64>,
    pub readability: Option<f64>,
    pub posture: Option<f64>,
    pub gaze: Option<f64>,
    pub movement: Option<f64>,
    /// Unscaled count.
    pub word_count: Option<f64>,
    /// Unscaled count.
    pub sentence_count: Option<f64>,
    pub avg_sentence_length: Option<f64>,
    /// Unscaled count.
    pub grammar_errors: Option<f64>,
}

impl Metrics {
    /// Field names in tabular column order.
    pub const FIELD_NAMES: [&'static str; 12] = [
        "overall",
        "fluency",
        "grammar",
        "coherence",
        "readability",
        "posture",
        "gaze",
        "movement",
        "word_count",
        "sentence_count",
        "avg_sentence_length",
        "grammar_errors",
    ];

    /// Values in the same order as [`Metrics::FIELD_NAMES`].
    pub fn values(&self) -> [Option<f64>; 12] {
        [
            self.overall,
            self.fluency,
            self.grammar,
            self.coherence,
            self.readability,
            self.posture,
            self.gaze,
            self.movement,
            self.word_count,
            self.sentence_count,
            self.avg_sentence_length,
            self.grammar_errors,
        ]
    }
}

/// One stored analysis record, as served by `GET /history/all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub transcript: String,
    #[serde(flatten)]
    pub metrics: Metrics,
    /// Remaining server columns (raw per-modality JSON and the like), kept
    /// so a structured export reproduces the record verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Session {
    pub fn new(id: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            transcript: String::new(),
            metrics: Metrics::default(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = transcript.into();
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Session timestamps: RFC 3339 on output; accepts RFC 3339 or a naive
/// ISO 8601 datetime (taken as UTC) on input.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// Holder of the current session snapshot.
///
/// Every load fully replaces the held collection, in the order the remote
/// source delivered it (newest first by convention).
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Vec<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Vec<Session>) -> Self {
        let mut store = Self::new();
        store.load(snapshot);
        store
    }

    /// Replace the held snapshot.
    pub fn load(&mut self, snapshot: Vec<Session>) {
        let mut seen = HashSet::with_capacity(snapshot.len());
        for session in &snapshot {
            if !seen.insert(session.id) {
                tracing::warn!("Snapshot contains duplicate session id {}", session.id);
            }
        }
        tracing::debug!("Loaded session snapshot ({} sessions)", snapshot.len());
        self.sessions = snapshot;
    }

    /// Look up a session by id.
    pub fn get(&self, id: i64) -> Result<&Session> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .ok_or(FluentError::NotFound(id))
    }

    /// Resolve an optional user selection, failing with `EmptySelection`
    /// when nothing was chosen.
    pub fn select(&self, id: Option<i64>) -> Result<&Session> {
        match id {
            Some(id) => self.get(id),
            None => Err(FluentError::EmptySelection),
        }
    }

    /// Sessions in snapshot order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn ids(&self) -> Vec<i64> {
        self.sessions.iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
