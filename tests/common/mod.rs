#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use specterflow::{
    DeliverFn, DeliverRef, DeliveryError, Engine, EngineConfig, Event, EventKind, Fields, RetryPolicy,
    Signal,
};
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Capability that fails its first `failures` calls and records call times.
pub struct Flaky {
    pub calls: Arc<AtomicU32>,
    pub times: Arc<Mutex<Vec<Instant>>>,
    pub cap: DeliverRef,
}

impl Flaky {
    pub fn new(failures: u32) -> Self {
        let calls = Arc::new(AtomicU32::new(0));
        let times = Arc::new(Mutex::new(Vec::new()));
        let (c, t) = (calls.clone(), times.clone());
        let cap: DeliverRef = DeliverFn::arc(move |_signal, _specter| {
            let n = c.fetch_add(1, Ordering::SeqCst);
            t.lock().unwrap().push(Instant::now());
            async move {
                if n < failures {
                    Err(DeliveryError::failed(format!("attempt {} refused", n + 1)))
                } else {
                    Ok(())
                }
            }
        });
        Self { calls, times, cap }
    }

    pub fn always_failing() -> Self {
        Self::new(u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Call times as offsets from `origin`.
    pub fn offsets(&self, origin: Instant) -> Vec<Duration> {
        self.times
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.duration_since(origin))
            .collect()
    }
}

pub fn config(interval_s: u64, max_retries: u32, timeout_s: u64) -> EngineConfig {
    EngineConfig {
        retry: RetryPolicy {
            interval: Duration::from_secs(interval_s),
            max_retries,
            timeout: Duration::from_secs(timeout_s),
            ..RetryPolicy::default()
        },
        pool_size: 1,
        ..EngineConfig::default()
    }
}

pub fn engine(cap: DeliverRef, cfg: EngineConfig) -> Engine {
    Engine::builder(cap).with_config(cfg).build()
}

pub fn fields(v: Value) -> Fields {
    match v {
        Value::Object(m) => m,
        _ => Fields::new(),
    }
}

pub fn signal(v: Value) -> Signal {
    Signal::new("test.v1", fields(v))
}

/// Everything currently buffered in `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

pub fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

/// Asserts `actual` is within 50ms after `expected_s` seconds.
pub fn assert_near(actual: Duration, expected_s: u64) {
    let expected = Duration::from_secs(expected_s);
    assert!(
        actual >= expected && actual <= expected + Duration::from_millis(50),
        "expected ~{expected:?}, got {actual:?}"
    );
}
