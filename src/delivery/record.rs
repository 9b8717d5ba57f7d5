//! # Pending delivery records.
//!
//! A [`DeliveryRecord`] exists only between the first failed attempt and the
//! terminal outcome (success on retry, timeout, or exhausted budget). It never
//! leaves its owning manager; callers see read-only [`RecordSnapshot`]s.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::signals::{Signal, SpecterId};

static RECORD_REF: AtomicU64 = AtomicU64::new(1);

/// Opaque unique reference of one delivery attempt chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliveryRef(u64);

impl DeliveryRef {
    pub(crate) fn next() -> Self {
        Self(RECORD_REF.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value (unique per process).
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DeliveryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dlv-{}", self.0)
    }
}

/// Live state of a pending delivery.
#[derive(Debug)]
pub(crate) struct DeliveryRecord {
    pub(crate) signal: Arc<Signal>,
    pub(crate) specter_id: SpecterId,
    pub(crate) started: Instant,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) retry_count: u32,
}

impl DeliveryRecord {
    pub(crate) fn new(signal: Arc<Signal>, specter_id: SpecterId) -> Self {
        Self {
            signal,
            specter_id,
            started: Instant::now(),
            started_at: Utc::now(),
            retry_count: 0,
        }
    }

    pub(crate) fn snapshot(&self, reference: DeliveryRef) -> RecordSnapshot {
        RecordSnapshot {
            reference,
            signal_id: self.signal.id().to_owned(),
            specter_id: self.specter_id.clone(),
            start_time: self.started_at,
            age: self.started.elapsed(),
            retry_count: self.retry_count,
        }
    }
}

/// Read-only view of a pending delivery, for introspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordSnapshot {
    /// Unique reference of the delivery.
    pub reference: DeliveryRef,
    /// Id of the signal being delivered.
    pub signal_id: String,
    /// Target specter.
    pub specter_id: SpecterId,
    /// Wall-clock time the record was created (first failure).
    pub start_time: DateTime<Utc>,
    /// Time since the record was created, on the runtime clock.
    pub age: std::time::Duration,
    /// Retries performed so far.
    pub retry_count: u32,
}
