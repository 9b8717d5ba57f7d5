//! # Example: Pattern fan-out with retries
//!
//! Three specters subscribe with different patterns. One of them is flaky and
//! refuses its first two deliveries; watch the retry events in the log.
//!
//! ```text
//! RUST_LOG=debug cargo run --example fanout
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::json;
use specterflow::{
    DeliverFn, DeliveryError, Engine, EngineConfig, PatternSpec, RetryPolicy, Signal, Subscribe, Transform,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = EngineConfig {
        retry: RetryPolicy {
            interval: Duration::from_millis(300),
            max_retries: 3,
            timeout: Duration::from_secs(5),
            ..RetryPolicy::default()
        },
        pool_size: 2,
        ..EngineConfig::default()
    };

    let refusals = Arc::new(AtomicU32::new(0));
    let capability = {
        let refusals = refusals.clone();
        DeliverFn::arc(move |signal, specter| {
            let refusals = refusals.clone();
            async move {
                if specter.as_str() == "pager" && refusals.fetch_add(1, Ordering::SeqCst) < 2 {
                    return Err(DeliveryError::Unreachable {
                        reason: "pager gateway warming up".into(),
                    });
                }
                println!("[{specter}] <- {} {}", signal.id(), serde_json::Value::Object(signal.payload().clone()));
                Ok(())
            }
        })
    };

    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(specterflow::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    let engine = Engine::builder(capability)
        .with_config(cfg)
        .with_subscribers(subs)
        .build();

    engine.register("archive", PatternSpec::new()).await?;
    engine
        .register(
            "pager",
            PatternSpec::new()
                .field("severity", json!("~r/^(high|critical)$/i"))
                .priority(10),
        )
        .await?;
    engine
        .register(
            "eu-dashboard",
            PatternSpec::new()
                .field("region", json!("eu-*"))
                .transform("host", Transform::new(|_| json!("<redacted>"))),
        )
        .await?;

    for (severity, region) in [("low", "eu-west"), ("CRITICAL", "us-east"), ("high", "eu-north")] {
        let mut payload = serde_json::Map::new();
        payload.insert("severity".into(), json!(severity));
        payload.insert("region".into(), json!(region));
        payload.insert("host".into(), json!("db-7.internal"));
        let routed = engine.publish(Signal::new("monitoring.alert.v1", payload)).await;
        println!("published severity={severity} region={region} -> {routed} deliveries");
    }

    tokio::time::sleep(Duration::from_secs(2)).await;
    println!("pager refusals: {}", refusals.load(Ordering::SeqCst));

    engine.shutdown().await?;
    Ok(())
}
