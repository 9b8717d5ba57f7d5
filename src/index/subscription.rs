//! # Subscription records.
//!
//! A [`Subscription`] pairs a compiled [`Pattern`] with the [`SpecterId`]
//! that wants matching signals. It also remembers its registration sequence,
//! which breaks priority ties in match results.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::patterns::Pattern;
use crate::signals::SpecterId;

/// Unique subscription identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(Arc<str>);

impl SubscriptionId {
    /// Fresh random identifier.
    pub(crate) fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub(crate) fn as_arc(&self) -> Arc<str> {
        Arc::clone(&self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

/// Registered `(pattern, specter)` pair.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    pattern: Pattern,
    specter_id: SpecterId,
    seq: u64,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, pattern: Pattern, specter_id: SpecterId, seq: u64) -> Self {
        Self {
            id,
            pattern,
            specter_id,
            seq,
        }
    }

    #[inline]
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    #[inline]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    #[inline]
    pub fn specter_id(&self) -> &SpecterId {
        &self.specter_id
    }

    #[inline]
    pub fn priority(&self) -> i64 {
        self.pattern.priority()
    }

    /// Registration order (monotonic per index).
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}
