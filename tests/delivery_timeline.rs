mod common;

use std::time::Duration;

use common::*;
use serde_json::json;
use specterflow::{EventKind, PatternSpec, RetryPolicy};
use tokio::time::{Instant, sleep};

#[tokio::test(start_paused = true)]
async fn retry_then_succeed_stops_retrying() {
    let flaky = Flaky::new(2);
    let engine = engine(flaky.cap.clone(), config(5, 3, 30));
    engine.register("a", PatternSpec::new()).await.unwrap();
    let mut rx = engine.events();

    let origin = Instant::now();
    assert_eq!(engine.publish(signal(json!({"n": 1}))).await, 1);
    sleep(Duration::from_secs(120)).await;

    assert_eq!(flaky.calls(), 3);
    let offsets = flaky.offsets(origin);
    assert_near(offsets[0], 0);
    assert_near(offsets[1], 5);
    assert_near(offsets[2], 10);
    assert!(engine.pending("delivery-0").await.unwrap().is_empty());

    let events = drain(&mut rx);
    assert_eq!(count(&events, EventKind::DeliveryFailed), 2);
    assert_eq!(count(&events, EventKind::RetryScheduled), 2);
    assert_eq!(count(&events, EventKind::DeliverySucceeded), 1);
    assert_eq!(count(&events, EventKind::DeliveryTimedOut), 0);
    assert_eq!(count(&events, EventKind::RetriesExhausted), 0);

    let succeeded = events
        .iter()
        .position(|e| e.kind == EventKind::DeliverySucceeded)
        .unwrap();
    assert!(events[succeeded..]
        .iter()
        .all(|e| e.kind != EventKind::DeliveryAttempted && e.kind != EventKind::RetryScheduled));
    assert_eq!(events[succeeded].attempt, Some(3));
}

#[tokio::test(start_paused = true)]
async fn timeout_removes_record_with_retries_left() {
    let flaky = Flaky::always_failing();
    let engine = engine(flaky.cap.clone(), config(5, 10, 12));
    engine.register("a", PatternSpec::new()).await.unwrap();
    let mut rx = engine.events();

    engine.publish(signal(json!({}))).await;

    sleep(Duration::from_secs(11)).await;
    let pending = engine.pending("delivery-0").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].retry_count, 2);
    assert_eq!(pending[0].specter_id.as_str(), "a");

    sleep(Duration::from_secs(2)).await;
    assert!(engine.pending("delivery-0").await.unwrap().is_empty());

    // The retry armed at t=10s fires at t=15s and must find nothing.
    sleep(Duration::from_secs(60)).await;
    assert_eq!(flaky.calls(), 3);

    let events = drain(&mut rx);
    assert_eq!(count(&events, EventKind::DeliveryTimedOut), 1);
    assert_eq!(count(&events, EventKind::RetriesExhausted), 0);
    assert_eq!(count(&events, EventKind::DeliveryAttempted), 3);
    let timed_out = events
        .iter()
        .find(|e| e.kind == EventKind::DeliveryTimedOut)
        .unwrap();
    assert_eq!(timed_out.timeout_ms, Some(12_000));
    assert_eq!(timed_out.instance.as_deref(), Some("delivery-0"));
}

#[tokio::test(start_paused = true)]
async fn exhaustion_happens_before_a_longer_timeout() {
    let flaky = Flaky::always_failing();
    let engine = engine(flaky.cap.clone(), config(5, 3, 60));
    engine.register("a", PatternSpec::new()).await.unwrap();
    let mut rx = engine.events();

    let origin = Instant::now();
    engine.publish(signal(json!({}))).await;
    sleep(Duration::from_secs(19)).await;
    assert_eq!(engine.pending("delivery-0").await.unwrap().len(), 1);

    sleep(Duration::from_secs(2)).await;
    assert!(engine.pending("delivery-0").await.unwrap().is_empty());

    sleep(Duration::from_secs(120)).await;
    assert_eq!(flaky.calls(), 4);
    let offsets = flaky.offsets(origin);
    for (i, expected) in [0, 5, 10, 15].into_iter().enumerate() {
        assert_near(offsets[i], expected);
    }

    let events = drain(&mut rx);
    assert_eq!(count(&events, EventKind::RetriesExhausted), 1);
    assert_eq!(count(&events, EventKind::DeliveryTimedOut), 0);
    let exhausted = events
        .iter()
        .find(|e| e.kind == EventKind::RetriesExhausted)
        .unwrap();
    assert_eq!(exhausted.attempt, Some(3));
}

#[tokio::test(start_paused = true)]
async fn zero_retry_budget_means_single_attempt() {
    let flaky = Flaky::always_failing();
    let engine = engine(flaky.cap.clone(), config(5, 0, 30));
    engine.register("a", PatternSpec::new()).await.unwrap();

    engine.publish(signal(json!({}))).await;
    sleep(Duration::from_secs(60)).await;
    assert_eq!(flaky.calls(), 1);
    assert!(engine.pending("delivery-0").await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn same_id_published_twice_is_delivered_twice() {
    let flaky = Flaky::new(0);
    let engine = engine(flaky.cap.clone(), config(5, 3, 30));
    engine.register("a", PatternSpec::new()).await.unwrap();

    let s = signal(json!({"k": "v"})).with_id("dup");
    engine.publish(s.clone()).await;
    engine.publish(s).await;
    sleep(Duration::from_millis(10)).await;

    assert_eq!(flaky.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn failures_for_many_signals_are_tracked_independently() {
    let flaky = Flaky::always_failing();
    let engine = engine(flaky.cap.clone(), config(5, 3, 30));
    engine.register("a", PatternSpec::new()).await.unwrap();
    engine.register("b", PatternSpec::new()).await.unwrap();

    engine.publish(signal(json!({"n": 1})).with_id("s1")).await;
    engine.publish(signal(json!({"n": 2})).with_id("s2")).await;
    sleep(Duration::from_millis(10)).await;

    let pending = engine.pending("delivery-0").await.unwrap();
    assert_eq!(pending.len(), 4);
    let mut pairs: Vec<(String, String)> = pending
        .iter()
        .map(|r| (r.signal_id.clone(), r.specter_id.to_string()))
        .collect();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![
            ("s1".into(), "a".into()),
            ("s1".into(), "b".into()),
            ("s2".into(), "a".into()),
            ("s2".into(), "b".into()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn multi_year_timeout_keeps_the_instance_alive() {
    let flaky = Flaky::always_failing();
    let engine = engine(flaky.cap.clone(), config(5, 3, 5 * 365 * 24 * 3600));
    engine.register("a", PatternSpec::new()).await.unwrap();
    let mut rx = engine.events();

    engine.publish(signal(json!({}))).await;
    sleep(Duration::from_secs(1)).await;

    let pending = engine.pending("delivery-0").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].retry_count, 0);

    sleep(Duration::from_secs(120)).await;
    assert_eq!(flaky.calls(), 4);
    assert!(engine.pending("delivery-0").await.unwrap().is_empty());

    let events = drain(&mut rx);
    assert_eq!(count(&events, EventKind::InstanceCrashed), 0);
    assert_eq!(count(&events, EventKind::RetriesExhausted), 1);
    assert_eq!(count(&events, EventKind::DeliveryTimedOut), 0);
}

#[tokio::test(start_paused = true)]
async fn capped_timeout_still_fires() {
    let flaky = Flaky::always_failing();
    let engine = engine(flaky.cap.clone(), config(5, u32::MAX, 5 * 365 * 24 * 3600));
    engine.register("a", PatternSpec::new()).await.unwrap();
    let mut rx = engine.events();

    engine.publish(signal(json!({}))).await;
    sleep(Duration::from_secs(60)).await;
    assert_eq!(engine.pending("delivery-0").await.unwrap().len(), 1);

    tokio::time::advance(RetryPolicy::MAX_DELAY).await;
    sleep(Duration::from_secs(10)).await;
    assert!(engine.pending("delivery-0").await.unwrap().is_empty());

    let events = drain(&mut rx);
    assert_eq!(count(&events, EventKind::InstanceCrashed), 0);
    assert_eq!(count(&events, EventKind::DeliveryTimedOut), 1);
    let timed_out = events
        .iter()
        .find(|e| e.kind == EventKind::DeliveryTimedOut)
        .unwrap();
    // 365 days in ms saturates the compact u32 field.
    assert_eq!(timed_out.timeout_ms, Some(u32::MAX));
}
