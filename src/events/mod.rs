//! Agent event base type.
//!
//! Every concrete event embeds an [`EventMeta`] holding the optional metadata
//! shared by the whole family, and implements [`Event`] to expose it. Unset
//! fields read back as documented defaults rather than failing.

pub mod variants;

pub use variants::{ActionEvent, ObservationEvent};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id reported by events that were never assigned one.
pub const INVALID_ID: i64 = -1;

/// Who produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Agent,
    User,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(Self::Agent),
            "user" => Ok(Self::User),
            _ => Err(format!("unknown event source: {s}")),
        }
    }
}

/// Optional metadata carried by every event. All fields start absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<EventSource>,
    /// Id of the event that caused this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<i64>,
    /// Seconds to wait before giving up on the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl EventMeta {
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: EventSource) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: i64) -> Self {
        self.cause = Some(cause);
        self
    }
}

/// Common read access over an event's metadata.
///
/// Implementors only provide [`meta`](Event::meta) and
/// [`meta_mut`](Event::meta_mut). Variants that carry a blocking flag opt into
/// the timeout policy by overriding [`blocking_mut`](Event::blocking_mut).
pub trait Event {
    fn meta(&self) -> &EventMeta;

    fn meta_mut(&mut self) -> &mut EventMeta;

    /// Message text, or `""` when unset.
    fn message(&self) -> &str {
        self.meta().message.as_deref().unwrap_or("")
    }

    /// Event id, or [`INVALID_ID`] when unset.
    fn id(&self) -> i64 {
        self.meta().id.unwrap_or(INVALID_ID)
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.meta().timestamp
    }

    fn source(&self) -> Option<EventSource> {
        self.meta().source
    }

    fn cause(&self) -> Option<i64> {
        self.meta().cause
    }

    fn timeout(&self) -> Option<u64> {
        self.meta().timeout
    }

    /// The variant's blocking flag, if it has one.
    fn blocking_mut(&mut self) -> Option<&mut bool> {
        None
    }

    /// Store a timeout. Variants with a blocking flag become blocking.
    fn set_timeout(&mut self, timeout: Option<u64>) {
        self.meta_mut().timeout = timeout;
        if let Some(blocking) = self.blocking_mut() {
            *blocking = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A variant that fills in nothing.
    struct Bare {
        meta: EventMeta,
    }

    impl Event for Bare {
        fn meta(&self) -> &EventMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut EventMeta {
            &mut self.meta
        }
    }

    #[test]
    fn unset_fields_read_as_defaults() {
        let event = Bare {
            meta: EventMeta::default(),
        };
        assert_eq!(event.message(), "");
        assert_eq!(event.id(), INVALID_ID);
        assert!(event.timestamp().is_none());
        assert!(event.source().is_none());
        assert!(event.cause().is_none());
        assert!(event.timeout().is_none());
    }

    #[test]
    fn set_fields_read_back() {
        let now = Utc::now();
        let event = Bare {
            meta: EventMeta::default()
                .with_message("hello")
                .with_id(7)
                .with_timestamp(now)
                .with_source(EventSource::User)
                .with_cause(3),
        };
        assert_eq!(event.message(), "hello");
        assert_eq!(event.id(), 7);
        assert_eq!(event.timestamp(), Some(now));
        assert_eq!(event.source(), Some(EventSource::User));
        assert_eq!(event.cause(), Some(3));
    }

    #[test]
    fn timeout_without_blocking_flag_is_stored() {
        let mut event = Bare {
            meta: EventMeta::default(),
        };
        event.set_timeout(Some(30));
        assert_eq!(event.timeout(), Some(30));
    }

    #[test]
    fn source_round_trips_through_str() {
        assert_eq!("agent".parse::<EventSource>().unwrap(), EventSource::Agent);
        assert_eq!(EventSource::User.to_string(), "user");
        assert!("robot".parse::<EventSource>().is_err());
    }
}
