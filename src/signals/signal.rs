//! # Signal: the immutable unit of published information.
//!
//! A [`Signal`] carries an opaque `id`, a `schema_id` type tag, an ordered
//! `payload`, free-form `metadata` and a creation `timestamp`.
//!
//! ## Field resolution
//! Patterns address signal data by field name ([`Signal::field`]):
//! ```text
//! "id"            → signal id (string)
//! "schema_id"     → schema tag (string)
//! "timestamp"     → RFC 3339 timestamp (string)
//! "payload.<k>"   → payload[k]
//! "metadata.<k>"  → metadata[k]
//! "<k>"           → payload[k]
//! ```
//!
//! ## Rules
//! - Signals are never mutated once shared; transformations build a new one.
//! - `id` is not deduplicated anywhere: publishing the same id twice yields two
//!   independent deliveries.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Ordered field map (insertion order is preserved).
pub type Fields = serde_json::Map<String, Value>;

/// Immutable signal published into the engine.
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use specterflow::Signal;
///
/// let payload = json!({"status": "open", "region": "eu"});
/// let sig = Signal::new("ticket.v1", payload.as_object().cloned().unwrap_or_default())
///     .with_metadata("source", json!("helpdesk"));
///
/// assert_eq!(sig.schema_id(), "ticket.v1");
/// assert_eq!(sig.field("status").as_deref(), Some(&json!("open")));
/// assert_eq!(sig.field("metadata.source").as_deref(), Some(&json!("helpdesk")));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub(crate) id: String,
    pub(crate) schema_id: String,
    pub(crate) payload: Fields,
    #[serde(default)]
    pub(crate) metadata: Fields,
    pub(crate) timestamp: DateTime<Utc>,
}

impl Signal {
    /// Creates a signal with a fresh v4 UUID and the current UTC time.
    pub fn new(schema_id: impl Into<String>, payload: Fields) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            schema_id: schema_id.into(),
            payload,
            metadata: Fields::new(),
            timestamp: Utc::now(),
        }
    }

    /// Replaces the generated id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Replaces the creation timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = at;
        self
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    #[inline]
    pub fn payload(&self) -> &Fields {
        &self.payload
    }

    #[inline]
    pub fn metadata(&self) -> &Fields {
        &self.metadata
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Resolves a pattern field name against this signal.
    ///
    /// Envelope fields (`id`, `schema_id`, `timestamp`) are rendered as JSON
    /// strings; everything else is borrowed from the payload or metadata.
    pub fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        match name {
            "id" => Some(Cow::Owned(Value::String(self.id.clone()))),
            "schema_id" => Some(Cow::Owned(Value::String(self.schema_id.clone()))),
            "timestamp" => Some(Cow::Owned(Value::String(self.timestamp.to_rfc3339()))),
            _ => {
                if let Some(key) = name.strip_prefix("metadata.") {
                    return self.metadata.get(key).map(Cow::Borrowed);
                }
                self.payload.get(payload_key(name)).map(Cow::Borrowed)
            }
        }
    }
}

/// Payload key addressed by `name`: `payload.<k>` and bare `<k>` both mean `k`.
pub(crate) fn payload_key(name: &str) -> &str {
    name.strip_prefix("payload.").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Fields {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn new_signals_get_distinct_ids() {
        let a = Signal::new("s", Fields::new());
        let b = Signal::new("s", Fields::new());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn envelope_fields_resolve_as_strings() {
        let sig = Signal::new("order.v2", Fields::new()).with_id("sig-1");
        assert_eq!(sig.field("id").as_deref(), Some(&json!("sig-1")));
        assert_eq!(sig.field("schema_id").as_deref(), Some(&json!("order.v2")));
        assert!(sig.field("timestamp").is_some());
    }

    #[test]
    fn explicit_paths_reach_payload_and_metadata() {
        let sig = Signal::new("s", fields(json!({"id": "inner", "n": 3})))
            .with_metadata("origin", json!("crawler"));

        assert_eq!(sig.field("payload.id").as_deref(), Some(&json!("inner")));
        assert_eq!(sig.field("n").as_deref(), Some(&json!(3)));
        assert_eq!(sig.field("metadata.origin").as_deref(), Some(&json!("crawler")));
        assert!(sig.field("origin").is_none());
        assert!(sig.field("missing").is_none());
    }

    #[test]
    fn payload_order_is_preserved() {
        let sig = Signal::new("s", fields(json!({"z": 1, "a": 2, "m": 3})));
        let keys: Vec<&str> = sig.payload().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn serde_keeps_the_envelope() {
        let sig = Signal::new("s", fields(json!({"k": "v"}))).with_id("fixed");
        let text = serde_json::to_string(&sig).unwrap();
        let back: Signal = serde_json::from_str(&text).unwrap();
        assert_eq!(back, sig);
    }
}
