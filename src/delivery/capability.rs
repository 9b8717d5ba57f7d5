//! # Specter delivery capability.
//!
//! [`Deliver`] is the single external dependency of a delivery manager: hand
//! one signal to one specter and report whether it was accepted. The engine
//! may call it up to `max_retries + 1` times for the same logical signal, so
//! implementations should be idempotent on [`Signal::id`].
//!
//! [`DeliverFn`] wraps a closure `F: Fn(Arc<Signal>, SpecterId) -> Fut`,
//! producing a fresh future per attempt. Shared state lives behind an explicit
//! `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use specterflow::{DeliverFn, DeliverRef, DeliveryError};
//!
//! let cap: DeliverRef = DeliverFn::arc(|signal, specter| async move {
//!     if specter.as_str() == "offline" {
//!         return Err(DeliveryError::failed("not connected"));
//!     }
//!     let _ = signal.id();
//!     Ok(())
//! });
//! # let _ = cap;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::DeliveryError;
use crate::signals::{Signal, SpecterId};

/// Boxed future returned by [`Deliver::deliver_signal`].
pub type BoxDeliverFuture = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'static>>;

/// Shared handle to a delivery capability.
pub type DeliverRef = Arc<dyn Deliver>;

/// # Hands a signal to a specter.
///
/// The returned future owns everything it needs; the manager awaits it inside
/// its own task, so a panic here crashes that manager instance only.
pub trait Deliver: Send + Sync + 'static {
    /// Attempts one delivery of `signal` to `specter_id`.
    fn deliver_signal(&self, signal: Arc<Signal>, specter_id: SpecterId) -> BoxDeliverFuture;
}

/// Function-backed delivery capability.
pub struct DeliverFn<F> {
    f: F,
}

impl<F> DeliverFn<F> {
    /// Creates a new function-backed capability.
    ///
    /// Prefer [`DeliverFn::arc`] when you immediately need a [`DeliverRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the capability and returns it as a shared handle.
    pub fn arc<Fut>(f: F) -> Arc<Self>
    where
        F: Fn(Arc<Signal>, SpecterId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DeliveryError>> + Send + 'static,
    {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> Deliver for DeliverFn<F>
where
    F: Fn(Arc<Signal>, SpecterId) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), DeliveryError>> + Send + 'static,
{
    fn deliver_signal(&self, signal: Arc<Signal>, specter_id: SpecterId) -> BoxDeliverFuture {
        Box::pin((self.f)(signal, specter_id))
    }
}

impl<F> std::fmt::Debug for DeliverFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliverFn").finish_non_exhaustive()
    }
}
