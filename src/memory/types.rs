//! Document types produced from agent events.
//!
//! Defines [`EventKind`] (the tag derived from an event mapping),
//! [`IngestedDocument`] (what gets written to the index), and [`SearchHit`]
//! (what comes back from a similarity query).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which kind of event a document was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Action,
    Observation,
    /// Neither an `"action"` nor an `"observation"` key was present.
    Unknown,
}

impl EventKind {
    /// SQL-compatible string representation. Unknown maps to `""`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Observation => "observation",
            Self::Unknown => "",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "action" => Ok(Self::Action),
            "observation" => Ok(Self::Observation),
            "" => Ok(Self::Unknown),
            _ => Err(format!("unknown event kind: {s}")),
        }
    }
}

/// An event ready for insertion into the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedDocument {
    /// The whole event mapping, serialized as compact JSON.
    pub body: String,
    /// Position in ingestion order, starting at 0.
    pub seq: u64,
    pub kind: EventKind,
    /// The value stored under the `"action"` / `"observation"` key; empty for unknown.
    pub source_id: String,
}

impl IngestedDocument {
    /// Build a document from an event mapping.
    ///
    /// `"action"` is checked before `"observation"`. Non-string tag values are
    /// rendered as JSON text.
    pub fn from_event(event: &Value, seq: u64) -> Self {
        let (kind, source_id) = [("action", EventKind::Action), ("observation", EventKind::Observation)]
            .into_iter()
            .find_map(|(key, kind)| event.get(key).map(|v| (kind, tag_text(v))))
            .unwrap_or((EventKind::Unknown, String::new()));

        Self {
            body: event.to_string(),
            seq,
            kind,
            source_id,
        }
    }
}

fn tag_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One similarity search result, nearest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub seq: u64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub source_id: String,
    pub text: String,
    /// Distance from the query embedding; lower is closer.
    pub distance: f64,
}

/// A background insertion that failed after retries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedInsert {
    pub seq: u64,
    pub kind: EventKind,
    pub error: String,
}
