//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the router, delivery
//! managers, the pool supervisor and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Engine`, `SignalRouter`, `DeliveryManager`, `DeliveryPool`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the engine listener (fans out to `SubscriberSet`) and any
//!   receiver obtained from [`Engine::events`](crate::Engine::events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
