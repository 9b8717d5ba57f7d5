//! Error types used by the specterflow engine.
//!
//! This module defines the error enums surfaced by the engine:
//!
//! - [`PatternError`] a subscription pattern could not be compiled.
//! - [`RegistrationError`] a subscription was rejected at registration time.
//! - [`DeliveryError`] a specter capability refused or failed a delivery.
//! - [`QueueError`] a [`SignalQueue`](crate::SignalQueue) operation failed.
//! - [`EngineError`] the delivery pool could not accept work.
//! - [`RuntimeError`] the engine itself failed to shut down cleanly.
//!
//! All types provide `as_label` (stable snake_case label for logs/metrics).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced while compiling a subscription pattern.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PatternError {
    /// A `~r/…/` field value is not a valid regular expression.
    #[error("field `{field}`: invalid regex `{pattern}`: {source}")]
    InvalidRegex {
        /// Field the regex was declared on.
        field: String,
        /// Regex source as written (without delimiters).
        pattern: String,
        /// Underlying compile error.
        #[source]
        source: regex::Error,
    },

    /// A `~r/…/flags` value carries a flag outside `imsx`.
    #[error("field `{field}`: unsupported regex flag `{flag}`")]
    UnsupportedFlag {
        /// Field the regex was declared on.
        field: String,
        /// Offending flag character.
        flag: char,
    },
}

impl PatternError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PatternError::InvalidRegex { .. } => "pattern_invalid_regex",
            PatternError::UnsupportedFlag { .. } => "pattern_unsupported_flag",
        }
    }
}

/// # Errors produced when registering a subscription.
///
/// Registration fails fast: nothing is inserted into the index when any of
/// these is returned.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The specter identifier is empty or contains only whitespace.
    #[error("invalid specter id {value:?}")]
    InvalidSpecterId {
        /// The rejected identifier.
        value: String,
    },

    /// The raw pattern did not compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

impl RegistrationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use specterflow::RegistrationError;
    ///
    /// let err = RegistrationError::InvalidSpecterId { value: "".into() };
    /// assert_eq!(err.as_label(), "registration_invalid_specter");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistrationError::InvalidSpecterId { .. } => "registration_invalid_specter",
            RegistrationError::Pattern(e) => e.as_label(),
        }
    }
}

/// # Errors returned by a specter delivery capability.
///
/// Any error makes the owning delivery manager keep a pending record and retry
/// later; the producer never sees these.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The specter received the signal but refused it.
    #[error("delivery failed: {reason}")]
    Failed {
        /// Reason reported by the capability.
        reason: String,
    },

    /// The specter could not be reached at all.
    #[error("specter unreachable: {reason}")]
    Unreachable {
        /// Reason reported by the capability.
        reason: String,
    },
}

impl DeliveryError {
    /// Shorthand for [`DeliveryError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        DeliveryError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::Failed { .. } => "delivery_failed",
            DeliveryError::Unreachable { .. } => "delivery_unreachable",
        }
    }

    /// Human-readable reason without the variant prefix.
    pub fn reason(&self) -> &str {
        match self {
            DeliveryError::Failed { reason } | DeliveryError::Unreachable { reason } => reason,
        }
    }
}

/// # Errors produced by [`SignalQueue`](crate::SignalQueue) implementations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was cleaned up; the handle must not be used anymore.
    #[error("queue closed")]
    Closed,

    /// A bounded queue is at capacity.
    #[error("queue full (capacity {capacity})")]
    Full {
        /// Configured capacity.
        capacity: usize,
    },
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Closed => "queue_closed",
            QueueError::Full { .. } => "queue_full",
        }
    }
}

/// # Errors produced by the delivery pool.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The named instance exists but is restarting or its mailbox is gone.
    #[error("delivery instance `{name}` unavailable")]
    InstanceUnavailable {
        /// Logical instance name.
        name: String,
    },

    /// No instance with this logical name belongs to the pool.
    #[error("unknown delivery instance `{name}`")]
    UnknownInstance {
        /// Requested instance name.
        name: String,
    },

    /// The pool has been shut down.
    #[error("delivery pool closed")]
    PoolClosed,
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::InstanceUnavailable { .. } => "engine_instance_unavailable",
            EngineError::UnknownInstance { .. } => "engine_unknown_instance",
            EngineError::PoolClosed => "engine_pool_closed",
        }
    }
}

/// # Errors produced by the engine runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some delivery instances were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of instances that did not stop in time.
        stuck: Vec<String>,
    },

    /// OS signal listeners could not be installed.
    #[error("failed to install shutdown signal handler: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use specterflow::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal_handler",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck instances={stuck:?}")
            }
            RuntimeError::Signal(e) => format!("signal handler: {e}"),
        }
    }
}

/// Best-effort text of a panic payload (`&str` or `String`), for events and logs.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
