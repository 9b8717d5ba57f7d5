//! Subscription storage and lookup.
//!
//! - [`Subscription`] / [`SubscriptionId`] registered `(pattern, specter)` pairs
//! - [`SubscriptionIndex`] concurrent store with an inverted index for literal
//!   patterns and a linear scan for everything else

mod store;
mod subscription;

pub use store::SubscriptionIndex;
pub use subscription::{Subscription, SubscriptionId};
