//! # Event subscribers for the engine.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and built-in implementations for handling runtime events broadcast through
//! the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Router / DeliveryManager / DeliveryPool ── publish(Event) ──► Bus
//!                                                                │
//!                                                   engine listener
//!                                                                │
//!                                                                ▼
//!                                                  SubscriberSet::emit(&Event)
//!                                                     │        │        │
//!                                                LogWriter  Metrics  Custom
//! ```

mod embedded;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
