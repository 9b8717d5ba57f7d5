//! # Runtime events emitted by the engine.
//!
//! The [`EventKind`] enum classifies event types across five categories:
//! - **Routing events**: a signal entered the engine and was fanned out
//! - **Delivery events**: the per-record retry/timeout state machine
//! - **Subscription events**: index changes
//! - **Instance events**: delivery manager lifecycle under supervision
//! - **Runtime events**: shutdown and subscriber health
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! signal and specter ids, the owning instance, attempts and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use specterflow::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_signal("sig-1")
//!     .with_specter("ledger")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.signal.as_deref(), Some("sig-1"));
//! assert_eq!(ev.delay_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Routing events ===
    /// A producer published a signal.
    ///
    /// Sets: `signal`
    SignalPublished,

    /// Fan-out for a signal was initiated.
    ///
    /// Sets: `signal`, `count` (number of matching subscriptions)
    SignalRouted,

    /// A matched delivery could not be handed to any pool instance.
    ///
    /// Sets: `signal`, `specter`, `reason`
    DispatchFailed,

    // === Delivery events ===
    /// A delivery attempt is about to call the specter capability.
    ///
    /// Sets: `signal`, `specter`, `instance`, `attempt` (1-based)
    DeliveryAttempted,

    /// The capability accepted the signal; any pending record is gone.
    ///
    /// Sets: `signal`, `specter`, `instance`, `attempt`
    DeliverySucceeded,

    /// The capability returned an error for this attempt.
    ///
    /// Sets: `signal`, `specter`, `instance`, `attempt`, `reason`
    DeliveryFailed,

    /// Another attempt was scheduled for a pending record.
    ///
    /// Sets: `signal`, `specter`, `instance`, `attempt` (retry count so far), `delay_ms`
    RetryScheduled,

    /// The absolute delivery timeout removed a pending record.
    ///
    /// Sets: `signal`, `specter`, `instance`, `attempt`, `timeout_ms`
    DeliveryTimedOut,

    /// The retry budget ran out; the pending record was removed.
    ///
    /// Sets: `signal`, `specter`, `instance`, `attempt`
    RetriesExhausted,

    // === Subscription events ===
    /// A subscription was registered.
    ///
    /// Sets: `subscription`, `specter`
    SubscriptionAdded,

    /// A subscription was removed (explicitly or with its specter).
    ///
    /// Sets: `subscription`, `specter`
    SubscriptionRemoved,

    // === Instance events ===
    /// A delivery manager instance started (first start or restart).
    ///
    /// Sets: `instance`
    InstanceStarted,

    /// A delivery manager instance crashed; its pending records are lost.
    ///
    /// Sets: `instance`, `reason`, `count` (records lost, when known)
    InstanceCrashed,

    /// The supervisor is bringing a crashed instance back with empty state.
    ///
    /// Sets: `instance`, `attempt` (restart number for this name)
    InstanceRestarted,

    /// A delivery manager instance stopped during shutdown.
    ///
    /// Sets: `instance`
    InstanceStopped,

    // === Runtime events ===
    /// Shutdown requested (OS signal or explicit call).
    ShutdownRequested,

    /// All instances stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some instances did not stop in time.
    GraceExceeded,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `instance` (subscriber name), `reason`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `instance` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Signal id, if applicable.
    pub signal: Option<Arc<str>>,
    /// Specter id, if applicable.
    pub specter: Option<Arc<str>>,
    /// Delivery instance (or subscriber) name, if applicable.
    pub instance: Option<Arc<str>>,
    /// Subscription id, if applicable.
    pub subscription: Option<Arc<str>>,
    /// Attempt / retry / restart counter.
    pub attempt: Option<u32>,
    /// Generic counter (matches, lost records).
    pub count: Option<u32>,
    /// Delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Delivery timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            signal: None,
            specter: None,
            instance: None,
            subscription: None,
            attempt: None,
            count: None,
            delay_ms: None,
            timeout_ms: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_signal(mut self, id: impl Into<Arc<str>>) -> Self {
        self.signal = Some(id.into());
        self
    }

    #[inline]
    pub fn with_specter(mut self, id: impl Into<Arc<str>>) -> Self {
        self.specter = Some(id.into());
        self
    }

    #[inline]
    pub fn with_instance(mut self, name: impl Into<Arc<str>>) -> Self {
        self.instance = Some(name.into());
        self
    }

    #[inline]
    pub fn with_subscription(mut self, id: impl Into<Arc<str>>) -> Self {
        self.subscription = Some(id.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n.min(u32::MAX as usize) as u32);
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(as_compact_ms(d));
        self
    }

    /// Attaches a delivery timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(as_compact_ms(d));
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_instance(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_instance(subscriber)
            .with_reason(info)
    }

    /// True for events produced by the delivery state machine.
    pub fn is_delivery(&self) -> bool {
        matches!(
            self.kind,
            EventKind::DeliveryAttempted
                | EventKind::DeliverySucceeded
                | EventKind::DeliveryFailed
                | EventKind::RetryScheduled
                | EventKind::DeliveryTimedOut
                | EventKind::RetriesExhausted
        )
    }

    /// True for events that end a pending delivery for good.
    pub fn is_terminal_delivery(&self) -> bool {
        matches!(
            self.kind,
            EventKind::DeliverySucceeded | EventKind::DeliveryTimedOut | EventKind::RetriesExhausted
        )
    }
}

fn as_compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::SignalPublished);
        let b = Event::new(EventKind::SignalPublished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_are_clamped_to_u32_ms() {
        let ev = Event::new(EventKind::DeliveryTimedOut).with_timeout(Duration::from_secs(u64::MAX / 2));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn classification_helpers() {
        assert!(Event::new(EventKind::RetryScheduled).is_delivery());
        assert!(!Event::new(EventKind::RetryScheduled).is_terminal_delivery());
        assert!(Event::new(EventKind::RetriesExhausted).is_terminal_delivery());
        assert!(!Event::new(EventKind::InstanceCrashed).is_delivery());
    }
}
