use std::sync::Arc;

use crate::{
    core::{config::EngineConfig, engine::Engine},
    delivery::DeliverRef,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Engine`].
pub struct EngineBuilder {
    cfg: EngineConfig,
    capability: DeliverRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl EngineBuilder {
    /// Creates a builder with default configuration.
    pub fn new(capability: DeliverRef) -> Self {
        Self {
            cfg: EngineConfig::default(),
            capability,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: EngineConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (routing, delivery outcomes,
    /// instance lifecycle) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds and starts the engine.
    ///
    /// Must be called inside a Tokio runtime: this spawns the subscriber
    /// workers, the pool supervisors and every delivery manager.
    pub fn build(self) -> Engine {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::with_bus(self.subscribers, bus.clone()));
        Engine::new_internal(self.cfg, bus, subs, self.capability)
    }
}
