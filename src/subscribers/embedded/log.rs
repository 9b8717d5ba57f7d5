//! # LogWriter: structured event logging
//!
//! A subscriber that forwards incoming [`Event`]s to [`tracing`]. Install any
//! `tracing` subscriber (for example `tracing_subscriber::fmt`) to see them.
//!
//! ## Levels
//! - `debug`: routine traffic (published, routed, attempted, succeeded)
//! - `info`: subscription changes, instance lifecycle, shutdown
//! - `warn`: failures, retries, timeouts, exhausted budgets, subscriber trouble
//! - `error`: instance crashes, grace exceeded

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let signal = e.signal.as_deref().unwrap_or("-");
        let specter = e.specter.as_deref().unwrap_or("-");
        let instance = e.instance.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::SignalPublished => {
                tracing::debug!(seq = e.seq, signal, "signal published");
            }
            EventKind::SignalRouted => {
                tracing::debug!(seq = e.seq, signal, matched = e.count, "signal routed");
            }
            EventKind::DispatchFailed => {
                tracing::warn!(seq = e.seq, signal, specter, reason, "dispatch failed");
            }
            EventKind::DeliveryAttempted => {
                tracing::debug!(seq = e.seq, signal, specter, instance, attempt = e.attempt, "delivery attempted");
            }
            EventKind::DeliverySucceeded => {
                tracing::debug!(seq = e.seq, signal, specter, instance, attempt = e.attempt, "delivered");
            }
            EventKind::DeliveryFailed => {
                tracing::warn!(seq = e.seq, signal, specter, instance, attempt = e.attempt, reason, "delivery failed");
            }
            EventKind::RetryScheduled => {
                tracing::warn!(
                    seq = e.seq,
                    signal,
                    specter,
                    instance,
                    retries = e.attempt,
                    delay_ms = e.delay_ms,
                    "retry scheduled"
                );
            }
            EventKind::DeliveryTimedOut => {
                tracing::warn!(seq = e.seq, signal, specter, instance, timeout_ms = e.timeout_ms, "delivery timed out");
            }
            EventKind::RetriesExhausted => {
                tracing::warn!(seq = e.seq, signal, specter, instance, retries = e.attempt, "retries exhausted");
            }
            EventKind::SubscriptionAdded => {
                tracing::info!(seq = e.seq, subscription = e.subscription.as_deref(), specter, "subscription added");
            }
            EventKind::SubscriptionRemoved => {
                tracing::info!(seq = e.seq, subscription = e.subscription.as_deref(), specter, "subscription removed");
            }
            EventKind::InstanceStarted => {
                tracing::info!(seq = e.seq, instance, "instance started");
            }
            EventKind::InstanceCrashed => {
                tracing::error!(seq = e.seq, instance, lost = e.count, reason, "instance crashed");
            }
            EventKind::InstanceRestarted => {
                tracing::info!(seq = e.seq, instance, restarts = e.attempt, "instance restarted");
            }
            EventKind::InstanceStopped => {
                tracing::info!(seq = e.seq, instance, "instance stopped");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(seq = e.seq, "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(seq = e.seq, "all instances stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::error!(seq = e.seq, reason, "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(seq = e.seq, subscriber = instance, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(seq = e.seq, subscriber = instance, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
