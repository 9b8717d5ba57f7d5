//! # Example: One-for-one supervision of delivery managers
//!
//! A specter whose capability panics crashes the instance that carried the
//! delivery. The pool restarts that instance with empty state; the other
//! instance keeps its pending records.
//!
//! ```text
//! cargo run --example crash_isolation
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use specterflow::{DeliverFn, DeliveryError, Engine, EngineConfig, Event, EventKind, Signal, SpecterId, Subscribe};
use tracing_subscriber::EnvFilter;

/// Prints instance lifecycle events only.
struct Lifecycle;

#[async_trait::async_trait]
impl Subscribe for Lifecycle {
    async fn on_event(&self, ev: &Event) {
        if matches!(
            ev.kind,
            EventKind::InstanceStarted | EventKind::InstanceCrashed | EventKind::InstanceRestarted
        ) {
            println!(
                "[lifecycle] {:?} instance={} lost={:?} reason={:?}",
                ev.kind,
                ev.instance.as_deref().unwrap_or("-"),
                ev.count,
                ev.reason.as_deref()
            );
        }
    }

    fn name(&self) -> &'static str {
        "lifecycle"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let capability = DeliverFn::arc(|_signal, specter| async move {
        match specter.as_str() {
            "volatile" => panic!("volatile specter blew up"),
            _ => Err(DeliveryError::failed("offline")),
        }
    });

    let engine = Engine::builder(capability)
        .with_config(EngineConfig {
            pool_size: 2,
            ..EngineConfig::default()
        })
        .with_subscribers(vec![Arc::new(Lifecycle) as Arc<dyn Subscribe>])
        .build();
    let pool = engine.pool().clone();

    let signal = Arc::new(Signal::new("demo.v1", serde_json::Map::new()).with_metadata("origin", json!("demo")));
    pool.deliver_named("delivery-0", signal.clone(), SpecterId::new("offline")?).await?;
    pool.deliver_named("delivery-1", signal.clone(), SpecterId::new("offline")?).await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    for name in engine.instances() {
        println!("{name}: {} pending", engine.pending(&name).await?.len());
    }

    println!("-- delivering to the volatile specter through delivery-1");
    pool.deliver_named("delivery-1", signal, SpecterId::new("volatile")?).await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    for name in engine.instances() {
        println!("{name}: {} pending", engine.pending(&name).await?.len());
    }

    engine.shutdown().await?;
    Ok(())
}
