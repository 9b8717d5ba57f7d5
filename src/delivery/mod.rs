//! Delivery: capability contract, pending records and the manager actor.
//!
//! ## Contents
//! - [`Deliver`], [`DeliverFn`], [`DeliverRef`] the specter capability
//! - [`RecordSnapshot`], [`DeliveryRef`] read-only view of pending deliveries
//! - `DeliveryManager` (crate-private) the per-instance retry/timeout actor,
//!   spawned and supervised by [`DeliveryPool`](crate::DeliveryPool)

mod capability;
pub(crate) mod manager;
mod record;

pub use capability::{BoxDeliverFuture, Deliver, DeliverFn, DeliverRef};
pub use record::{DeliveryRef, RecordSnapshot};
