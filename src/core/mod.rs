//! Runtime core: orchestration and lifecycle.
//!
//! Public surface: [`Engine`], [`EngineBuilder`], [`EngineConfig`],
//! [`SignalRouter`] with its [`Dispatch`] seam, and the supervised
//! [`DeliveryPool`] with its [`InstanceHandle`]s.
//!
//! Internal modules:
//! - `engine`: wires bus, subscribers, index, router and pool; shutdown;
//! - `router`: stateless match-and-fan-out;
//! - `pool`: fixed set of managers under one-for-one supervision;
//! - `registry`: logical name → live handle, deregistered on exit;
//! - `shutdown`: cross-platform termination signals.

mod builder;
mod config;
mod engine;
mod pool;
mod registry;
mod router;
mod shutdown;

pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use engine::Engine;
pub use pool::DeliveryPool;
pub use registry::InstanceHandle;
pub use router::{Dispatch, SignalRouter};
