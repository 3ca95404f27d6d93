//! Minimal concrete events: something the agent did, and what it saw.
//!
//! Both serialize to a flat JSON mapping keyed by `"action"` or
//! `"observation"`, which is the shape the memory store tags documents by.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Event, EventMeta};

/// An action taken by the agent, e.g. `run` with `{"command": "ls"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub action: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
    /// Whether the agent must wait for this action to finish.
    #[serde(default)]
    pub blocking: bool,
    #[serde(flatten)]
    pub meta: EventMeta,
}

impl ActionEvent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            args: Map::new(),
            blocking: false,
            meta: EventMeta::default(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: EventMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl Event for ActionEvent {
    fn meta(&self) -> &EventMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EventMeta {
        &mut self.meta
    }

    fn blocking_mut(&mut self) -> Option<&mut bool> {
        Some(&mut self.blocking)
    }
}

/// The result of an action as seen by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEvent {
    pub observation: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
    #[serde(flatten)]
    pub meta: EventMeta,
}

impl ObservationEvent {
    pub fn new(observation: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            observation: observation.into(),
            content: content.into(),
            extras: Map::new(),
            meta: EventMeta::default(),
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: EventMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl Event for ObservationEvent {
    fn meta(&self) -> &EventMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EventMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventSource, INVALID_ID};

    #[test]
    fn setting_timeout_makes_action_blocking() {
        let mut action = ActionEvent::new("run").with_arg("command", "sleep 5");
        assert!(!action.blocking);

        action.set_timeout(Some(120));

        assert!(action.blocking);
        assert_eq!(action.timeout(), Some(120));
    }

    #[test]
    fn clearing_timeout_still_marks_action_blocking() {
        let mut action = ActionEvent::new("run");
        action.set_timeout(None);
        assert!(action.blocking);
        assert!(action.timeout().is_none());
    }

    #[test]
    fn observation_timeout_has_no_side_effect() {
        let mut obs = ObservationEvent::new("run", "ok");
        obs.set_timeout(Some(5));
        assert_eq!(obs.timeout(), Some(5));
        assert_eq!(obs.id(), INVALID_ID);
    }

    #[test]
    fn action_serializes_flat_with_tag_key() {
        let action = ActionEvent::new("run")
            .with_arg("command", "ls")
            .with_meta(EventMeta::default().with_id(4).with_source(EventSource::Agent));

        let value = serde_json::to_value(&action).unwrap();

        assert_eq!(value["action"], "run");
        assert_eq!(value["args"]["command"], "ls");
        assert_eq!(value["id"], 4);
        assert_eq!(value["source"], "agent");
        assert_eq!(value["blocking"], false);
        // absent metadata is omitted, not null
        assert!(value.get("cause").is_none());
        assert!(value.get("timeout").is_none());
    }

    #[test]
    fn observation_deserializes_from_mapping() {
        let value = serde_json::json!({
            "observation": "run",
            "content": "total 0",
            "cause": 4,
            "source": "user",
        });

        let obs: ObservationEvent = serde_json::from_value(value).unwrap();

        assert_eq!(obs.observation, "run");
        assert_eq!(obs.content, "total 0");
        assert_eq!(obs.cause(), Some(4));
        assert_eq!(obs.source(), Some(EventSource::User));
        assert_eq!(obs.message(), "");
    }
}
