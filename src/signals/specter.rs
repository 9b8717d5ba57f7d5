//! # Specter identifiers.
//!
//! [`SpecterId`] names a long-lived consumer. It is validated once at
//! construction (non-empty, not only whitespace) and is cheap to clone
//! afterwards (`Arc<str>` inside).

use std::fmt;
use std::sync::Arc;

use crate::error::RegistrationError;

/// Validated identifier of a specter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecterId(Arc<str>);

impl SpecterId {
    /// Validates and wraps a specter identifier.
    ///
    /// # Example
    /// ```
    /// use specterflow::SpecterId;
    ///
    /// assert!(SpecterId::new("ledger-agent").is_ok());
    /// assert!(SpecterId::new("  ").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, RegistrationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RegistrationError::InvalidSpecterId { value: id });
        }
        Ok(Self(Arc::from(id)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shared string form, used when attaching the id to events.
    #[inline]
    pub(crate) fn as_arc(&self) -> Arc<str> {
        Arc::clone(&self.0)
    }
}

impl fmt::Display for SpecterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for SpecterId {
    type Error = RegistrationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        SpecterId::new(value)
    }
}

impl TryFrom<String> for SpecterId {
    type Error = RegistrationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SpecterId::new(value)
    }
}

impl AsRef<str> for SpecterId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
