//! # SignalRouter: match a signal and fan it out.
//!
//! The router is stateless per call. It holds a reference to the
//! [`SubscriptionIndex`] and to a [`Dispatch`] target; every
//! [`route`](SignalRouter::route) queries the index and starts one independent
//! dispatch task per matching subscription, then returns without waiting for
//! any outcome. Routers are cheap to clone and safe to run concurrently.
//!
//! ```text
//! route(signal)
//!   ├─► index.find_matching_subscriptions(signal)   (priority desc, then registration order)
//!   ├─► publish SignalRouted { count }
//!   └─► for each subscription:
//!         payload' = pattern.apply_transformations(signal)
//!         spawn dispatch(payload', specter_id)    ─► DispatchFailed on error
//! ```
//!
//! Dispatch tasks are spawned in match order; completion order across
//! specters is unspecified.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::events::{Bus, Event, EventKind};
use crate::index::SubscriptionIndex;
use crate::signals::{Signal, SpecterId};

/// Hands one (signal, specter) pair to whatever delivers it.
///
/// [`DeliveryPool`](crate::DeliveryPool) implements this by picking an
/// instance; tests and embedders may supply their own.
#[async_trait]
pub trait Dispatch: Send + Sync + 'static {
    /// Starts delivery. Returns once the work is accepted, not once delivered.
    async fn dispatch(&self, signal: Arc<Signal>, specter_id: SpecterId) -> Result<(), EngineError>;
}

/// Stateless fan-out coordinator.
#[derive(Clone)]
pub struct SignalRouter {
    index: Arc<SubscriptionIndex>,
    dispatch: Arc<dyn Dispatch>,
    bus: Bus,
}

impl SignalRouter {
    /// Creates a router over `index` delivering through `dispatch`.
    pub fn new(index: Arc<SubscriptionIndex>, dispatch: Arc<dyn Dispatch>, bus: Bus) -> Self {
        Self { index, dispatch, bus }
    }

    /// Routes through the router's own dispatch target.
    ///
    /// Returns the number of matching subscriptions (deliveries initiated).
    pub async fn route(&self, signal: &Signal) -> usize {
        self.route_with(signal, Arc::clone(&self.dispatch)).await
    }

    /// Routes through an explicit dispatch target for this call only.
    pub async fn route_with(&self, signal: &Signal, dispatch: Arc<dyn Dispatch>) -> usize {
        let matches = self.index.find_matching_subscriptions(signal).await;
        self.bus.publish(
            Event::new(EventKind::SignalRouted)
                .with_signal(signal.id())
                .with_count(matches.len()),
        );
        if matches.is_empty() {
            return 0;
        }

        let shared = Arc::new(signal.clone());
        for sub in &matches {
            let payload = if sub.pattern().has_transformations() {
                Arc::new(sub.pattern().apply_transformations(signal))
            } else {
                Arc::clone(&shared)
            };
            let specter_id = sub.specter_id().clone();
            let dispatch = Arc::clone(&dispatch);
            let bus = self.bus.clone();

            tokio::spawn(async move {
                if let Err(err) = dispatch.dispatch(Arc::clone(&payload), specter_id.clone()).await {
                    tracing::warn!(signal = payload.id(), specter = %specter_id, error = %err, "dispatch failed");
                    bus.publish(
                        Event::new(EventKind::DispatchFailed)
                            .with_signal(payload.id())
                            .with_specter(specter_id.as_str())
                            .with_reason(err.as_label()),
                    );
                }
            });
        }
        matches.len()
    }

    /// Index this router reads from.
    pub fn index(&self) -> &Arc<SubscriptionIndex> {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{PatternSpec, Transform};
    use crate::signals::Fields;
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    struct Recorder(mpsc::UnboundedSender<(String, Arc<Signal>)>);

    #[async_trait]
    impl Dispatch for Recorder {
        async fn dispatch(&self, signal: Arc<Signal>, specter_id: SpecterId) -> Result<(), EngineError> {
            let _ = self.0.send((specter_id.to_string(), signal));
            Ok(())
        }
    }

    struct Refuser;

    #[async_trait]
    impl Dispatch for Refuser {
        async fn dispatch(&self, _signal: Arc<Signal>, _specter_id: SpecterId) -> Result<(), EngineError> {
            Err(EngineError::PoolClosed)
        }
    }

    fn fields(v: Value) -> Fields {
        match v {
            Value::Object(m) => m,
            _ => Fields::new(),
        }
    }

    async fn subscribe(index: &SubscriptionIndex, specter: &str, spec: PatternSpec) {
        index
            .register(spec.compile().unwrap(), SpecterId::new(specter).unwrap())
            .await;
    }

    #[tokio::test]
    async fn fans_out_to_every_match_and_reports_count() {
        let index = Arc::new(SubscriptionIndex::new());
        subscribe(&index, "low", PatternSpec::new().field("kind", json!("order")).priority(1)).await;
        subscribe(&index, "high", PatternSpec::new().field("kind", json!("order")).priority(9)).await;
        subscribe(&index, "other", PatternSpec::new().field("kind", json!("refund"))).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let router = SignalRouter::new(index, Arc::new(Recorder(tx)), Bus::new(16));

        let n = router
            .route(&Signal::new("orders", fields(json!({"kind": "order"}))))
            .await;
        assert_eq!(n, 2);

        let mut got = vec![rx.recv().await.unwrap().0, rx.recv().await.unwrap().0];
        got.sort();
        assert_eq!(got, vec!["high", "low"]);
    }

    #[tokio::test]
    async fn no_match_dispatches_nothing() {
        let index = Arc::new(SubscriptionIndex::new());
        subscribe(&index, "a", PatternSpec::new().field("kind", json!("x"))).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let router = SignalRouter::new(index, Arc::new(Recorder(tx)), Bus::new(16));

        assert_eq!(router.route(&Signal::new("s", fields(json!({"kind": "y"})))).await, 0);
        drop(router);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn transformations_apply_per_subscription() {
        let index = Arc::new(SubscriptionIndex::new());
        let upper = Transform::new(|v| match v {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other.clone(),
        });
        subscribe(&index, "plain", PatternSpec::new()).await;
        subscribe(&index, "shout", PatternSpec::new().transform("msg", upper)).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let router = SignalRouter::new(index, Arc::new(Recorder(tx)), Bus::new(16));
        router.route(&Signal::new("s", fields(json!({"msg": "hi"})))).await;

        let mut seen = Vec::new();
        for _ in 0..2 {
            let (specter, signal) = rx.recv().await.unwrap();
            seen.push((specter, signal.payload()["msg"].clone()));
        }
        seen.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(seen, vec![("plain".to_owned(), json!("hi")), ("shout".to_owned(), json!("HI"))]);
    }

    #[tokio::test]
    async fn dispatch_errors_become_events() {
        let index = Arc::new(SubscriptionIndex::new());
        subscribe(&index, "a", PatternSpec::new()).await;
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let router = SignalRouter::new(index, Arc::new(Refuser), bus);

        let signal = Signal::new("s", Fields::new()).with_id("sig-9");
        assert_eq!(router.route(&signal).await, 1);

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::SignalRouted);
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::DispatchFailed);
        assert_eq!(ev.signal.as_deref(), Some("sig-9"));
        assert_eq!(ev.specter.as_deref(), Some("a"));
        assert_eq!(ev.reason.as_deref(), Some("engine_pool_closed"));
    }
}
