//! # Engine: the assembled signal-distribution runtime.
//!
//! The [`Engine`] owns the event bus, the subscriber fan-out, the subscription
//! index, a router and the supervised delivery pool. It is the producer- and
//! registration-facing surface; every part is also usable on its own.
//!
//! ## High-level architecture
//! ```text
//! register(specter, PatternSpec) ──► SubscriptionIndex
//!
//! publish(signal)
//!   └─► SignalRouter::route ──► find_matching_subscriptions
//!                              └─► per match: spawn DeliveryPool::dispatch
//!                                                └─► get_instance() ─► DeliveryManager mailbox
//!                                                                       └─► Deliver::deliver_signal
//!
//! Event flow:
//!   Router / Managers / Pool ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!
//! Shutdown path:
//!   shutdown() / run_until_signal()
//!     └─► Bus.publish(ShutdownRequested)
//!     └─► runtime_token.cancel()      → every manager stops at its next step
//!     └─► pool.shutdown(cfg.grace)
//!            ├─ all joined   → AllStoppedWithin
//!            └─ grace passed → GraceExceeded, RuntimeError::GraceExceeded
//! ```
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use specterflow::{DeliverFn, Engine, PatternSpec, Signal};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::builder(DeliverFn::arc(|signal, specter| async move {
//!         println!("{specter} <- {}", signal.id());
//!         Ok(())
//!     }))
//!     .build();
//!
//!     engine
//!         .register("billing", PatternSpec::new().field("kind", json!("invoice.*")))
//!         .await?;
//!
//!     let mut payload = serde_json::Map::new();
//!     payload.insert("kind".into(), json!("invoice.paid"));
//!     assert_eq!(engine.publish(Signal::new("finance.v1", payload)).await, 1);
//!
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::core::builder::EngineBuilder;
use crate::core::config::EngineConfig;
use crate::core::pool::DeliveryPool;
use crate::core::router::SignalRouter;
use crate::core::shutdown;
use crate::delivery::{DeliverRef, RecordSnapshot};
use crate::error::{EngineError, RegistrationError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::index::{Subscription, SubscriptionId, SubscriptionIndex};
use crate::patterns::PatternSpec;
use crate::signals::{Signal, SpecterId};
use crate::subscribers::SubscriberSet;

/// Signal-distribution engine.
pub struct Engine {
    cfg: EngineConfig,
    bus: Bus,
    index: Arc<SubscriptionIndex>,
    router: SignalRouter,
    pool: Arc<DeliveryPool>,
    runtime_token: CancellationToken,
    listener_token: CancellationToken,
}

impl Engine {
    /// Starts building an engine that delivers through `capability`.
    pub fn builder(capability: DeliverRef) -> EngineBuilder {
        EngineBuilder::new(capability)
    }

    pub(crate) fn new_internal(cfg: EngineConfig, bus: Bus, subs: Arc<SubscriberSet>, capability: DeliverRef) -> Self {
        let runtime_token = CancellationToken::new();
        let listener_token = CancellationToken::new();
        let index = Arc::new(SubscriptionIndex::new());
        let pool = DeliveryPool::start(&cfg, capability, bus.clone(), runtime_token.clone());
        let router = SignalRouter::new(Arc::clone(&index), pool.clone(), bus.clone());

        let engine = Self {
            cfg,
            bus,
            index,
            router,
            pool,
            runtime_token,
            listener_token,
        };
        engine.subscriber_listener(subs);
        engine
    }

    /// Forwards bus events to the subscriber set until the engine shuts down,
    /// then drains what is already buffered.
    fn subscriber_listener(&self, subs: Arc<SubscriberSet>) {
        if subs.is_empty() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let stop = self.listener_token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => subs.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        while let Ok(ev) = rx.try_recv() {
                            subs.emit(&ev);
                        }
                        break;
                    }
                }
            }
        });
    }

    /// Publishes a signal. Returns the number of deliveries initiated.
    ///
    /// Fire-and-forget: no deduplication on `signal.id`, and delivery outcomes
    /// never reach the producer.
    pub async fn publish(&self, signal: Signal) -> usize {
        self.bus
            .publish(Event::new(EventKind::SignalPublished).with_signal(signal.id()));
        self.router.route(&signal).await
    }

    /// Registers a subscription for `specter_id`.
    ///
    /// Fails fast on an invalid specter id or an uncompilable pattern; nothing
    /// is inserted in that case.
    pub async fn register(
        &self,
        specter_id: impl Into<String>,
        spec: PatternSpec,
    ) -> Result<SubscriptionId, RegistrationError> {
        let specter_id = SpecterId::new(specter_id)?;
        let pattern = spec.compile()?;
        let sub = self.index.register(pattern, specter_id).await;
        self.bus.publish(
            Event::new(EventKind::SubscriptionAdded)
                .with_subscription(sub.id().as_arc())
                .with_specter(sub.specter_id().as_arc()),
        );
        Ok(sub.id().clone())
    }

    /// Removes one subscription. Returns `false` if it was not registered.
    pub async fn unregister(&self, id: &SubscriptionId) -> bool {
        match self.index.unregister(id).await {
            Some(sub) => {
                self.publish_removed(&sub);
                true
            }
            None => false,
        }
    }

    /// Removes every subscription of a specter; returns the removed ids.
    ///
    /// An invalid specter id owns nothing, so the result is empty.
    pub async fn remove_by_specter(&self, specter_id: &str) -> Vec<SubscriptionId> {
        let Ok(specter_id) = SpecterId::new(specter_id) else {
            return Vec::new();
        };
        let removed = self.index.remove_by_specter(&specter_id).await;
        removed
            .iter()
            .map(|sub| {
                self.publish_removed(sub);
                sub.id().clone()
            })
            .collect()
    }

    fn publish_removed(&self, sub: &Subscription) {
        self.bus.publish(
            Event::new(EventKind::SubscriptionRemoved)
                .with_subscription(sub.id().as_arc())
                .with_specter(sub.specter_id().as_arc()),
        );
    }

    /// All live subscriptions, in registration order.
    pub async fn subscriptions(&self) -> Vec<Arc<Subscription>> {
        self.index.list().await
    }

    /// Names of delivery instances currently running.
    pub fn instances(&self) -> Vec<String> {
        self.pool.instances()
    }

    /// Read-only view of one instance's pending deliveries.
    pub async fn pending(&self, instance: &str) -> Result<Vec<RecordSnapshot>, EngineError> {
        self.pool.pending(instance).await
    }

    /// New receiver of runtime events published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn index(&self) -> &Arc<SubscriptionIndex> {
        &self.index
    }

    pub fn router(&self) -> &SignalRouter {
        &self.router
    }

    pub fn pool(&self) -> &Arc<DeliveryPool> {
        &self.pool
    }

    /// Stops every delivery instance, waiting up to `cfg.grace`.
    ///
    /// Pending records are dropped. Idempotent.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        if !self.runtime_token.is_cancelled() {
            self.bus.publish(Event::new(EventKind::ShutdownRequested));
            self.runtime_token.cancel();
        }
        let res = self.pool.shutdown(self.cfg.grace).await;
        self.listener_token.cancel();
        res
    }

    /// Waits for SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere), then shuts down.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        shutdown::wait_for_shutdown_signal().await?;
        self.shutdown().await
    }
}
