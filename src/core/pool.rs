//! # DeliveryPool: fixed set of supervised delivery managers.
//!
//! The pool starts `pool_size` managers named `delivery-0 ..` and keeps each
//! one alive with its own supervising loop (one-for-one):
//!
//! ```text
//! supervise("delivery-k"):
//!   loop {
//!     spawn DeliveryManager(empty state) ─► registry.register(handle)   InstanceStarted
//!     join
//!       ├─ returned (cancel/mailbox) ─► exit hook: deregister  → InstanceStopped, stop
//!       └─ panicked                  ─► exit hook: deregister  → InstanceCrashed
//!                                        runtime cancelled?   → stop
//!                                        else                  → InstanceRestarted, loop
//!   }
//! ```
//!
//! A crash loses that instance's pending records and nothing else: other
//! instances keep running, and the name is re-registered with a fresh handle.
//!
//! ## Selection
//! [`DeliveryPool::get_instance`] picks a name with the configured
//! [`SelectionPolicy`] and skips names that are mid-restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::core::config::EngineConfig;
use crate::core::registry::{InstanceHandle, Registry};
use crate::core::router::Dispatch;
use crate::delivery::manager::{DeliveryManager, ManagerExit};
use crate::delivery::{DeliverRef, RecordSnapshot};
use crate::error::{EngineError, RuntimeError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::policies::{RetryPolicy, SelectionPolicy};
use crate::signals::{Signal, SpecterId};

/// Everything a supervising loop needs to (re)start its manager.
struct Shared {
    registry: Arc<Registry>,
    capability: DeliverRef,
    retry: RetryPolicy,
    mailbox_capacity: usize,
    bus: Bus,
    token: CancellationToken,
    generation: AtomicU64,
}

/// Fixed-size, supervised pool of delivery managers.
pub struct DeliveryPool {
    names: Vec<Arc<str>>,
    shared: Arc<Shared>,
    selection: SelectionPolicy,
    cursor: AtomicUsize,
    supervisors: Mutex<JoinSet<()>>,
}

impl DeliveryPool {
    /// Starts the pool. Must be called inside a Tokio runtime.
    ///
    /// `token` stops every instance when cancelled.
    pub fn start(cfg: &EngineConfig, capability: DeliverRef, bus: Bus, token: CancellationToken) -> Arc<Self> {
        let names: Vec<Arc<str>> = (0..cfg.pool_size_clamped())
            .map(|i| Arc::from(format!("delivery-{i}")))
            .collect();

        let shared = Arc::new(Shared {
            registry: Registry::new(),
            capability,
            retry: cfg.retry,
            mailbox_capacity: cfg.mailbox_capacity_clamped(),
            bus,
            token,
            generation: AtomicU64::new(0),
        });

        // First generation is registered before `start` returns, so the pool
        // is addressable immediately.
        let mut supervisors = JoinSet::new();
        for name in &names {
            let first = launch(name, &shared);
            supervisors.spawn(supervise(Arc::clone(name), Arc::clone(&shared), first));
        }

        Arc::new(Self {
            names,
            shared,
            selection: cfg.selection,
            cursor: AtomicUsize::new(0),
            supervisors: Mutex::new(supervisors),
        })
    }

    /// Picks a running instance using the selection policy.
    ///
    /// Names that are currently restarting are skipped; if none is running the
    /// call fails with [`EngineError::InstanceUnavailable`] (or
    /// [`EngineError::PoolClosed`] after shutdown).
    pub fn get_instance(&self) -> Result<InstanceHandle, EngineError> {
        if self.shared.token.is_cancelled() {
            return Err(EngineError::PoolClosed);
        }
        let len = self.names.len();
        let start = self.selection.pick(&self.cursor, len).ok_or(EngineError::PoolClosed)?;
        for offset in 0..len {
            let name = &self.names[(start + offset) % len];
            if let Some(handle) = self.shared.registry.get(name) {
                if handle.is_alive() {
                    return Ok(handle);
                }
            }
        }
        Err(EngineError::InstanceUnavailable {
            name: self.names[start].to_string(),
        })
    }

    /// Resolves a logical name to its current handle.
    pub fn instance(&self, name: &str) -> Result<InstanceHandle, EngineError> {
        if !self.names.iter().any(|n| n.as_ref() == name) {
            return Err(EngineError::UnknownInstance { name: name.to_owned() });
        }
        if self.shared.token.is_cancelled() {
            return Err(EngineError::PoolClosed);
        }
        self.shared
            .registry
            .get(name)
            .ok_or_else(|| EngineError::InstanceUnavailable { name: name.to_owned() })
    }

    /// Delivers through a handle obtained from [`DeliveryPool::get_instance`].
    pub async fn deliver(&self, handle: &InstanceHandle, signal: Arc<Signal>, specter_id: SpecterId) -> Result<(), EngineError> {
        handle.deliver(signal, specter_id).await
    }

    /// Delivers through the instance currently registered under `name`.
    pub async fn deliver_named(&self, name: &str, signal: Arc<Signal>, specter_id: SpecterId) -> Result<(), EngineError> {
        self.instance(name)?.deliver(signal, specter_id).await
    }

    /// Logical names of every pool member, running or not.
    pub fn names(&self) -> Vec<String> {
        self.names.iter().map(|n| n.to_string()).collect()
    }

    /// Sorted names of instances currently running.
    pub fn instances(&self) -> Vec<String> {
        self.shared.registry.list()
    }

    /// Pending records of one instance.
    pub async fn pending(&self, name: &str) -> Result<Vec<RecordSnapshot>, EngineError> {
        self.instance(name)?.pending().await
    }

    /// Cancels every instance and waits up to `grace` for all of them to stop.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success; on timeout
    /// publishes [`EventKind::GraceExceeded`], aborts the stragglers and returns
    /// [`RuntimeError::GraceExceeded`] naming the instances still registered.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), RuntimeError> {
        self.shared.token.cancel();

        let mut set = self.supervisors.lock().await;
        let done = async { while set.join_next().await.is_some() {} };

        match tokio::time::timeout(grace, done).await {
            Ok(()) => {
                self.shared.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.shared.registry.list();
                self.shared
                    .bus
                    .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")));
                set.abort_all();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

#[async_trait]
impl Dispatch for DeliveryPool {
    async fn dispatch(&self, signal: Arc<Signal>, specter_id: SpecterId) -> Result<(), EngineError> {
        let handle = self.get_instance()?;
        handle.deliver(signal, specter_id).await
    }
}

/// A running manager: its generation, pending gauge and owning join set.
struct Launched {
    generation: u64,
    pending: Arc<AtomicUsize>,
    task: JoinSet<ManagerExit>,
}

/// Spawns a manager with empty state and registers its handle under `name`.
fn launch(name: &Arc<str>, shared: &Shared) -> Launched {
    let generation = shared.generation.fetch_add(1, Ordering::Relaxed) + 1;
    let pending = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel(shared.mailbox_capacity);

    let manager = DeliveryManager::new(
        Arc::clone(name),
        Arc::clone(&shared.capability),
        shared.retry,
        shared.bus.clone(),
        Arc::clone(&pending),
    );
    shared
        .registry
        .register(InstanceHandle::new(Arc::clone(name), generation, tx, Arc::clone(&pending)));

    // Dropping the set (supervisor aborted after grace) aborts the manager too.
    let mut task = JoinSet::new();
    task.spawn(manager.run(rx, shared.token.child_token()));

    shared
        .bus
        .publish(Event::new(EventKind::InstanceStarted).with_instance(Arc::clone(name)));

    Launched {
        generation,
        pending,
        task,
    }
}

/// One-for-one supervising loop for a single logical name.
async fn supervise(name: Arc<str>, shared: Arc<Shared>, first: Launched) {
    let mut restarts: u32 = 0;
    let mut current = first;

    loop {
        let outcome = current.task.join_next().await;
        shared.registry.deregister(&name, current.generation);

        match outcome {
            Some(Err(err)) if err.is_panic() => {
                let reason = panic_message(err.into_panic().as_ref());
                tracing::error!(instance = %name, %reason, "delivery manager crashed");
                shared.bus.publish(
                    Event::new(EventKind::InstanceCrashed)
                        .with_instance(Arc::clone(&name))
                        .with_count(current.pending.load(Ordering::Relaxed))
                        .with_reason(reason),
                );
                if shared.token.is_cancelled() {
                    break;
                }
                restarts = restarts.saturating_add(1);
                shared.bus.publish(
                    Event::new(EventKind::InstanceRestarted)
                        .with_instance(Arc::clone(&name))
                        .with_attempt(restarts),
                );
                current = launch(&name, &shared);
            }
            Some(Ok(ManagerExit::Cancelled | ManagerExit::MailboxClosed)) | Some(Err(_)) | None => {
                shared
                    .bus
                    .publish(Event::new(EventKind::InstanceStopped).with_instance(Arc::clone(&name)));
                break;
            }
        }
    }
}
