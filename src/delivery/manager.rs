//! # DeliveryManager: one supervised delivery actor.
//!
//! A manager owns a private map of pending [`DeliveryRecord`]s and a private
//! timer wheel ([`DelayQueue`]). Everything it does happens inside its own task,
//! strictly one step at a time, so records are never shared or locked.
//!
//! ## State machine (per delivery)
//! ```text
//! deliver(signal, specter)
//!   ├─► attempt ok   → DeliverySucceeded            (no record)
//!   └─► attempt err  → record(retry_count=0)
//!                      ├─ arm Retry(+interval)
//!                      └─ arm Timeout(+timeout)     (once, never re-armed)
//!
//! Retry fires:
//!   ├─► record absent                 → no-op
//!   ├─► retry_count >= max_retries    → remove, RetriesExhausted
//!   └─► attempt
//!         ├─ ok  → remove, DeliverySucceeded
//!         └─ err → retry_count += 1, arm Retry(+interval)
//!
//! Timeout fires:
//!   ├─► record absent  → no-op
//!   └─► record present → remove, DeliveryTimedOut
//! ```
//!
//! ## Rules
//! - Callbacks are never cancelled; the presence check makes late ones no-ops.
//! - A panic in the capability unwinds through [`DeliveryManager::run`] and
//!   crashes this instance only; the pool restarts it with empty state.
//! - In-flight attempts are not interrupted by shutdown; the manager stops at
//!   the next step boundary.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio_util::time::DelayQueue;

use crate::delivery::capability::DeliverRef;
use crate::delivery::record::{DeliveryRecord, DeliveryRef, RecordSnapshot};
use crate::events::{Bus, Event, EventKind};
use crate::policies::RetryPolicy;
use crate::signals::{Signal, SpecterId};

/// Mailbox message accepted by a manager.
#[derive(Debug)]
pub(crate) enum Command {
    /// Start a new delivery chain.
    Deliver {
        signal: Arc<Signal>,
        specter_id: SpecterId,
    },
    /// Read-only view of pending records.
    Inspect {
        reply: oneshot::Sender<Vec<RecordSnapshot>>,
    },
}

/// Deferred callback armed in the manager's timer wheel.
#[derive(Clone, Copy, Debug)]
enum Callback {
    Retry(DeliveryRef),
    Timeout(DeliveryRef),
}

/// Why the manager loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ManagerExit {
    /// Runtime token cancelled.
    Cancelled,
    /// Every sender of the mailbox was dropped.
    MailboxClosed,
}

enum Step {
    Stop(ManagerExit),
    Command(Command),
    Fire(Callback),
}

/// Single delivery actor. Constructed by the pool, driven by [`DeliveryManager::run`].
pub(crate) struct DeliveryManager {
    name: Arc<str>,
    capability: DeliverRef,
    policy: RetryPolicy,
    bus: Bus,
    records: HashMap<DeliveryRef, DeliveryRecord>,
    timers: DelayQueue<Callback>,
    pending: Arc<AtomicUsize>,
}

impl DeliveryManager {
    pub(crate) fn new(
        name: Arc<str>,
        capability: DeliverRef,
        policy: RetryPolicy,
        bus: Bus,
        pending: Arc<AtomicUsize>,
    ) -> Self {
        pending.store(0, Ordering::Relaxed);
        Self {
            name,
            capability,
            policy,
            bus,
            records: HashMap::new(),
            timers: DelayQueue::new(),
            pending,
        }
    }

    /// Runs until cancellation or until the mailbox closes.
    ///
    /// Pending records are dropped on exit.
    pub(crate) async fn run(
        mut self,
        mut mailbox: mpsc::Receiver<Command>,
        token: CancellationToken,
    ) -> ManagerExit {
        loop {
            let step = tokio::select! {
                biased;
                _ = token.cancelled() => Step::Stop(ManagerExit::Cancelled),
                Some(expired) = self.timers.next(), if !self.timers.is_empty() => {
                    Step::Fire(expired.into_inner())
                }
                cmd = mailbox.recv() => match cmd {
                    Some(cmd) => Step::Command(cmd),
                    None => Step::Stop(ManagerExit::MailboxClosed),
                },
            };

            match step {
                Step::Stop(exit) => {
                    if !self.records.is_empty() {
                        tracing::debug!(
                            instance = %self.name,
                            dropped = self.records.len(),
                            "delivery manager stopping with pending records"
                        );
                    }
                    return exit;
                }
                Step::Command(Command::Deliver { signal, specter_id }) => {
                    self.deliver(signal, specter_id).await;
                }
                Step::Command(Command::Inspect { reply }) => {
                    let _ = reply.send(self.snapshot());
                }
                Step::Fire(Callback::Retry(reference)) => self.on_retry(reference).await,
                Step::Fire(Callback::Timeout(reference)) => self.on_timeout(reference),
            }
            self.pending.store(self.records.len(), Ordering::Relaxed);
        }
    }

    async fn deliver(&mut self, signal: Arc<Signal>, specter_id: SpecterId) {
        let reference = DeliveryRef::next();
        match self.attempt(&signal, &specter_id, 1).await {
            Ok(()) => {}
            Err(()) => {
                self.records
                    .insert(reference, DeliveryRecord::new(signal, specter_id));
                self.arm(Callback::Timeout(reference), self.policy.timeout_clamped());
                self.schedule_retry(reference);
            }
        }
    }

    async fn on_retry(&mut self, reference: DeliveryRef) {
        let Some(record) = self.records.get(&reference) else {
            return;
        };

        if !self.policy.allows(record.retry_count) {
            if let Some(record) = self.records.remove(&reference) {
                self.bus.publish(
                    self.record_event(EventKind::RetriesExhausted, &record)
                        .with_attempt(record.retry_count),
                );
            }
            return;
        }

        let signal = Arc::clone(&record.signal);
        let specter_id = record.specter_id.clone();
        let attempt = record.retry_count.saturating_add(2);

        match self.attempt(&signal, &specter_id, attempt).await {
            Ok(()) => {
                self.records.remove(&reference);
            }
            Err(()) => {
                if let Some(record) = self.records.get_mut(&reference) {
                    record.retry_count += 1;
                }
                self.schedule_retry(reference);
            }
        }
    }

    fn on_timeout(&mut self, reference: DeliveryRef) {
        if let Some(record) = self.records.remove(&reference) {
            self.bus.publish(
                self.record_event(EventKind::DeliveryTimedOut, &record)
                    .with_attempt(record.retry_count)
                    .with_timeout(self.policy.timeout_clamped()),
            );
        }
    }

    /// One call through the capability, with attempt events around it.
    async fn attempt(&self, signal: &Arc<Signal>, specter_id: &SpecterId, attempt: u32) -> Result<(), ()> {
        self.bus.publish(
            self.base_event(EventKind::DeliveryAttempted, signal, specter_id)
                .with_attempt(attempt),
        );

        match self
            .capability
            .deliver_signal(Arc::clone(signal), specter_id.clone())
            .await
        {
            Ok(()) => {
                self.bus.publish(
                    self.base_event(EventKind::DeliverySucceeded, signal, specter_id)
                        .with_attempt(attempt),
                );
                Ok(())
            }
            Err(err) => {
                self.bus.publish(
                    self.base_event(EventKind::DeliveryFailed, signal, specter_id)
                        .with_attempt(attempt)
                        .with_reason(err.to_string()),
                );
                Err(())
            }
        }
    }

    fn schedule_retry(&mut self, reference: DeliveryRef) {
        let delay = self.policy.next_delay();
        self.arm(Callback::Retry(reference), delay);
        if let Some(record) = self.records.get(&reference) {
            self.bus.publish(
                self.record_event(EventKind::RetryScheduled, record)
                    .with_attempt(record.retry_count)
                    .with_delay(delay),
            );
        }
    }

    /// Inserts a callback. An empty wheel is not polled and its clock goes
    /// stale, so it is replaced before use; with delays capped at
    /// [`RetryPolicy::MAX_DELAY`] every deadline stays within the wheel's range.
    fn arm(&mut self, callback: Callback, delay: Duration) {
        if self.timers.is_empty() {
            self.timers = DelayQueue::new();
        }
        self.timers.insert(callback, delay);
    }

    fn snapshot(&self) -> Vec<RecordSnapshot> {
        let mut out: Vec<RecordSnapshot> = self
            .records
            .iter()
            .map(|(reference, record)| record.snapshot(*reference))
            .collect();
        out.sort_unstable_by_key(|s| s.reference);
        out
    }

    fn base_event(&self, kind: EventKind, signal: &Signal, specter_id: &SpecterId) -> Event {
        Event::new(kind)
            .with_signal(signal.id())
            .with_specter(specter_id.as_arc())
            .with_instance(Arc::clone(&self.name))
    }

    fn record_event(&self, kind: EventKind, record: &DeliveryRecord) -> Event {
        self.base_event(kind, &record.signal, &record.specter_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::capability::DeliverFn;
    use crate::error::DeliveryError;
    use crate::signals::Fields;
    use std::sync::atomic::AtomicU32;

    struct Harness {
        tx: mpsc::Sender<Command>,
        token: CancellationToken,
        calls: Arc<AtomicU32>,
        join: tokio::task::JoinHandle<ManagerExit>,
    }

    /// Capability failing the first `failures` calls, then succeeding.
    fn spawn_manager(failures: u32, policy: RetryPolicy) -> Harness {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let cap: DeliverRef = DeliverFn::arc(move |_signal, _specter| {
            let n = seen.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < failures {
                    Err(DeliveryError::failed("down"))
                } else {
                    Ok(())
                }
            }
        });
        let (tx, rx) = mpsc::channel(16);
        let token = CancellationToken::new();
        let manager = DeliveryManager::new(
            Arc::from("delivery-test"),
            cap,
            policy,
            Bus::new(64),
            Arc::new(AtomicUsize::new(0)),
        );
        let join = tokio::spawn(manager.run(rx, token.clone()));
        Harness {
            tx,
            token,
            calls,
            join,
        }
    }

    async fn deliver(h: &Harness) {
        h.tx.send(Command::Deliver {
            signal: Arc::new(Signal::new("s", Fields::new())),
            specter_id: SpecterId::new("a").unwrap(),
        })
        .await
        .unwrap();
    }

    async fn pending(h: &Harness) -> Vec<RecordSnapshot> {
        let (reply, rx) = oneshot::channel();
        h.tx.send(Command::Inspect { reply }).await.unwrap();
        rx.await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn success_leaves_no_record() {
        let h = spawn_manager(0, RetryPolicy::default());
        deliver(&h).await;
        assert!(pending(&h).await.is_empty());
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_creates_record_then_retry_succeeds() {
        let h = spawn_manager(1, RetryPolicy::default());
        deliver(&h).await;

        let records = pending(&h).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].retry_count, 0);

        tokio::time::sleep(Duration::from_millis(5_001)).await;
        assert!(pending(&h).await.is_empty());
        assert_eq!(h.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exit_on_cancel_and_on_closed_mailbox() {
        let h = spawn_manager(0, RetryPolicy::default());
        h.token.cancel();
        assert_eq!(h.join.await.unwrap(), ManagerExit::Cancelled);

        let h = spawn_manager(0, RetryPolicy::default());
        let Harness { tx, join, .. } = h;
        drop(tx);
        assert_eq!(join.await.unwrap(), ManagerExit::MailboxClosed);
    }
}
