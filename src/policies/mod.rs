//! Delivery and pool policies.
//!
//! This module groups the knobs that control **how often** a failed delivery
//! is retried, **how long** it may stay pending, and **which** pool instance
//! handles a new delivery.
//!
//! ## Contents
//! - [`RetryPolicy`]     retry interval / retry budget / absolute timeout
//! - [`JitterPolicy`]    randomization of the retry interval
//! - [`SelectionPolicy`] round-robin or random instance selection
//!
//! ## Quick wiring
//! ```text
//! EngineConfig { retry: RetryPolicy, selection: SelectionPolicy, .. }
//!      ├─► delivery::DeliveryManager uses retry to arm callbacks and check the budget
//!      └─► core::DeliveryPool uses selection in get_instance()
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::default()` → interval=5s, max_retries=3, timeout=30s, jitter=None.
//! - `SelectionPolicy::RoundRobin`.

mod jitter;
mod retry;
mod selection;

pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
pub use selection::SelectionPolicy;
