//! # Instance registry: logical name → live delivery manager handle.
//!
//! The pool supervisor registers a fresh [`InstanceHandle`] every time it
//! (re)starts a manager, and deregisters it from the exit hook once the
//! manager task terminates (normally or by panic). Between the two a name
//! resolves to nothing, and deliveries addressed to it fail fast with
//! [`EngineError::InstanceUnavailable`].
//!
//! ## Rules
//! - Registration is keyed by name; a newer generation replaces an older one.
//! - Deregistration only removes the generation that registered, so a late
//!   exit hook can never evict a restarted instance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{mpsc, oneshot};

use crate::delivery::RecordSnapshot;
use crate::delivery::manager::Command;
use crate::error::EngineError;
use crate::signals::{Signal, SpecterId};

/// Address of one running delivery manager.
///
/// Cheap to clone. A handle outliving its instance (crash or shutdown) makes
/// every call return [`EngineError::InstanceUnavailable`].
#[derive(Clone, Debug)]
pub struct InstanceHandle {
    name: Arc<str>,
    generation: u64,
    tx: mpsc::Sender<Command>,
    pending: Arc<AtomicUsize>,
}

impl InstanceHandle {
    pub(crate) fn new(name: Arc<str>, generation: u64, tx: mpsc::Sender<Command>, pending: Arc<AtomicUsize>) -> Self {
        Self {
            name,
            generation,
            tx,
            pending,
        }
    }

    /// Logical instance name (stable across restarts).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start counter of this name; bumps on every restart.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while the manager behind this handle is running.
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Number of pending records as last published by the manager.
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// Enqueues a delivery. Returns once the manager accepted the message,
    /// not once the specter got the signal.
    pub async fn deliver(&self, signal: Arc<Signal>, specter_id: SpecterId) -> Result<(), EngineError> {
        self.tx
            .send(Command::Deliver { signal, specter_id })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Read-only snapshot of the manager's pending records.
    pub async fn pending(&self) -> Result<Vec<RecordSnapshot>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Inspect { reply })
            .await
            .map_err(|_| self.unavailable())?;
        rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> EngineError {
        EngineError::InstanceUnavailable {
            name: self.name.to_string(),
        }
    }
}

/// Concurrent name → handle map.
///
/// Critical sections are a single map operation and never await.
#[derive(Default)]
pub(crate) struct Registry {
    handles: RwLock<HashMap<Arc<str>, InstanceHandle>>,
}

impl Registry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn register(&self, handle: InstanceHandle) {
        let mut handles = self.handles.write().unwrap_or_else(PoisonError::into_inner);
        handles.insert(Arc::clone(&handle.name), handle);
    }

    /// Exit hook: removes `name` only if it still points at `generation`.
    pub(crate) fn deregister(&self, name: &str, generation: u64) -> bool {
        let mut handles = self.handles.write().unwrap_or_else(PoisonError::into_inner);
        match handles.get(name) {
            Some(h) if h.generation == generation => handles.remove(name).is_some(),
            _ => false,
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<InstanceHandle> {
        let handles = self.handles.read().unwrap_or_else(PoisonError::into_inner);
        handles.get(name).cloned()
    }

    /// Sorted list of registered names.
    pub(crate) fn list(&self) -> Vec<String> {
        let handles = self.handles.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = handles.keys().map(|k| k.to_string()).collect();
        names.sort_unstable();
        names
    }
}
