//! # Engine configuration.
//!
//! Provides [`EngineConfig`], the centralized settings for an
//! [`Engine`](crate::Engine): retry/timeout policy for every delivery manager,
//! pool shape, channel capacities and shutdown grace.
//!
//! ## Sentinel values
//! - `pool_size = 0` → clamped to 1 (a pool always has an instance)
//! - `bus_capacity = 0`, `mailbox_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::policies::{RetryPolicy, SelectionPolicy};

/// Global configuration for the engine.
///
/// ## Field semantics
/// - `retry`: interval, retry budget and absolute timeout for pending deliveries
/// - `pool_size`: number of delivery manager instances
/// - `mailbox_capacity`: bounded mailbox size per instance
/// - `bus_capacity`: event bus ring buffer size
/// - `selection`: how `get_instance()` spreads work over instances
/// - `grace`: maximum wait for instances to stop on shutdown
///
/// All fields are public. Prefer the clamped accessors over sprinkling
/// sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Retry/timeout policy applied by every delivery manager.
    pub retry: RetryPolicy,

    /// Number of delivery manager instances in the pool.
    ///
    /// Instances are named `delivery-0 .. delivery-{n-1}`.
    pub pool_size: usize,

    /// Capacity of each instance's mailbox.
    ///
    /// `deliver` waits for mailbox space, never for the delivery outcome.
    pub mailbox_capacity: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers lagging more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Instance selection for deliveries that do not name an instance.
    pub selection: SelectionPolicy,

    /// Maximum time to wait for instances to stop during shutdown.
    ///
    /// If exceeded, shutdown returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,
}

impl EngineConfig {
    /// Pool size clamped to a minimum of 1.
    #[inline]
    pub fn pool_size_clamped(&self) -> usize {
        self.pool_size.max(1)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Mailbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn mailbox_capacity_clamped(&self) -> usize {
        self.mailbox_capacity.max(1)
    }
}

impl Default for EngineConfig {
    /// Default configuration:
    ///
    /// - `retry = RetryPolicy::default()` (5s interval, 3 retries, 30s timeout)
    /// - `pool_size = 4`
    /// - `mailbox_capacity = 1024`
    /// - `bus_capacity = 1024`
    /// - `selection = SelectionPolicy::RoundRobin`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            pool_size: 4,
            mailbox_capacity: 1024,
            bus_capacity: 1024,
            selection: SelectionPolicy::RoundRobin,
            grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinels_are_clamped() {
        let cfg = EngineConfig {
            pool_size: 0,
            mailbox_capacity: 0,
            bus_capacity: 0,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.pool_size_clamped(), 1);
        assert_eq!(cfg.mailbox_capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.pool_size, 4);
        assert_eq!(cfg.retry.max_retries, 3);
        assert_eq!(cfg.grace, Duration::from_secs(5));
    }
}
