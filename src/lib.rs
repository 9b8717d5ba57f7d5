//! # specterflow
//!
//! **Specterflow** is a signal-distribution engine for multi-agent systems.
//!
//! Producers publish [`Signal`]s; long-lived consumers ("specters") register
//! declarative [`PatternSpec`]s describing the signals they want. The engine
//! matches every signal against all subscriptions and delivers it to each
//! interested specter through a supervised pool of delivery managers with
//! bounded retry and an absolute per-delivery timeout.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  producer                        specter registration
//!     │ publish(signal)                 │ register(specter, PatternSpec)
//!     ▼                                 ▼
//! ┌───────────────┐  find_matching  ┌────────────────────┐
//! │ SignalRouter  │ ──────────────► │ SubscriptionIndex  │
//! │ (stateless)   │ ◄────────────── │ literal + scan     │
//! └──────┬────────┘  subs by prio   └────────────────────┘
//!        │ spawn one dispatch per match
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  DeliveryPool (one-for-one supervision, name → handle registry)   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!   │ delivery-0  │    │ delivery-1  │    │ delivery-N  │
//!   │ records +   │    │ records +   │    │ records +   │
//!   │ DelayQueue  │    │ DelayQueue  │    │ DelayQueue  │
//!   └──────┬──────┘    └──────┬──────┘    └──────┬──────┘
//!          └──────────► Deliver::deliver_signal ◄┘
//!
//! All components ── publish(Event) ──► Bus ──► SubscriberSet ──► LogWriter, custom subscribers
//! ```
//!
//! ### Delivery lifecycle
//! ```text
//! none ──attempt ok──────────────────────────────► (delivered, no state)
//!   └──attempt err──► pending(retry_count = 0)
//!                       ├─ Retry fires:  budget left → attempt → ok: delivered
//!                       │                                         err: retry_count += 1, re-arm
//!                       │                budget spent → retries-exhausted
//!                       └─ Timeout fires (once, from creation) → timed-out
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                             |
//! |-------------------|--------------------------------------------------------------|------------------------------------------------|
//! | **Signals**       | Immutable, serde-serializable events.                        | [`Signal`], [`SpecterId`]                      |
//! | **Patterns**      | Exact (OR), glob and regex field predicates with priority.   | [`PatternSpec`], [`Pattern`], [`Transform`]    |
//! | **Index**         | Concurrent subscription store with ordered matching.         | [`SubscriptionIndex`], [`Subscription`]        |
//! | **Delivery**      | Capability contract and pending-record introspection.        | [`Deliver`], [`DeliverFn`], [`RecordSnapshot`] |
//! | **Runtime**       | Router, supervised pool, facade, shutdown.                   | [`Engine`], [`SignalRouter`], [`DeliveryPool`] |
//! | **Policies**      | Retry budget/timeout, jitter, instance selection.            | [`RetryPolicy`], [`SelectionPolicy`]           |
//! | **Queue**         | Optional FIFO buffer for signals.                            | [`SignalQueue`], [`MemoryQueue`]               |
//! | **Observability** | Typed runtime events and subscribers.                        | [`Event`], [`Subscribe`]                       |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber rendering events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use serde_json::json;
//! use specterflow::{DeliverFn, DeliveryError, Engine, EngineConfig, PatternSpec, RetryPolicy, Signal};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = EngineConfig {
//!         retry: RetryPolicy { interval: Duration::from_millis(100), ..RetryPolicy::default() },
//!         pool_size: 2,
//!         ..EngineConfig::default()
//!     };
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn specterflow::Subscribe>> = vec![Arc::new(specterflow::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn specterflow::Subscribe>> = Vec::new();
//!
//!     let engine = Engine::builder(DeliverFn::arc(|signal, specter| async move {
//!         if specter.as_str() == "sleepy" {
//!             return Err(DeliveryError::failed("not ready"));
//!         }
//!         println!("{specter} got {}", signal.id());
//!         Ok(())
//!     }))
//!     .with_config(cfg)
//!     .with_subscribers(subs)
//!     .build();
//!
//!     engine.register("auditor", PatternSpec::new()).await?;
//!     engine
//!         .register("alerts", PatternSpec::new().field("severity", json!("~r/^(high|critical)$/i")).priority(10))
//!         .await?;
//!
//!     let mut payload = serde_json::Map::new();
//!     payload.insert("severity".into(), json!("HIGH"));
//!     let routed = engine.publish(Signal::new("monitoring.v1", payload)).await;
//!     assert_eq!(routed, 2);
//!
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod core;
mod delivery;
mod error;
mod events;
mod index;
mod patterns;
mod policies;
mod queue;
mod signals;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{DeliveryPool, Dispatch, Engine, EngineBuilder, EngineConfig, InstanceHandle, SignalRouter};
pub use delivery::{BoxDeliverFuture, Deliver, DeliverFn, DeliverRef, DeliveryRef, RecordSnapshot};
pub use error::{DeliveryError, EngineError, PatternError, QueueError, RegistrationError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use index::{Subscription, SubscriptionId, SubscriptionIndex};
pub use patterns::{Glob, Pattern, PatternSpec, Transform, glob_match};
pub use policies::{JitterPolicy, RetryPolicy, SelectionPolicy};
pub use queue::{MemoryQueue, MemoryQueueOptions, SignalQueue};
pub use signals::{Fields, Signal, SpecterId};
pub use subscribers::{Subscribe, SubscriberSet};

// Built-in `tracing` subscriber.
// Disable with: `--no-default-features`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
