//! # Signals and specter identities.
//!
//! This module provides the data the engine moves around:
//! - [`Signal`] - immutable unit of information published by producers
//! - [`Fields`] - ordered field map used for payload and metadata
//! - [`SpecterId`] - validated identifier of a long-lived consumer

mod signal;
mod specter;

pub use signal::{Fields, Signal};
pub(crate) use signal::payload_key;
pub use specter::SpecterId;
