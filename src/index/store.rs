//! # SubscriptionIndex: concurrent subscription store.
//!
//! Maps subscriptions to specters and answers "which specters want this
//! signal" queries.
//!
//! ## Architecture
//! ```text
//! register(pattern, specter)
//!   ├─ literal pattern (scalar exact fields only)
//!   │     └─► literal[(field, value)] += id      (inverted index)
//!   └─ anything else (empty / wildcard / regex / structured values)
//!         └─► scan += id                          (linear fallback)
//!
//! find_matching(signal)
//!   ├─ for each indexed field f: literal[(f, signal[f])]  → hits (no re-check)
//!   ├─ for each id in scan: pattern.matches(signal)       → hits
//!   └─ sort by (priority desc, registration seq asc)
//! ```
//!
//! ## Rules
//! - All state sits behind **one** `RwLock`: inserts and deletes are atomic,
//!   readers always see a consistent snapshot.
//! - A literal hit is a full match: with OR semantics across exact fields one
//!   equal field is enough, and literal patterns have no other predicates.
//! - Results hold one entry per matching subscription; a specter with two
//!   matching subscriptions appears twice.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::index::subscription::{Subscription, SubscriptionId};
use crate::patterns::Pattern;
use crate::signals::{Signal, SpecterId};

/// `(field, canonical scalar value)` key of the inverted index.
type LiteralKey = (String, String);

#[derive(Default)]
struct IndexState {
    /// Next registration sequence number.
    next_seq: u64,
    /// All live subscriptions by id.
    by_id: HashMap<SubscriptionId, Arc<Subscription>>,
    /// Literal subscriptions by `(field, value)`.
    literal: HashMap<LiteralKey, Vec<SubscriptionId>>,
    /// Reference counts of field names present in `literal`.
    literal_fields: HashMap<String, usize>,
    /// Subscriptions evaluated by linear scan, keyed by registration seq.
    scan: BTreeMap<u64, SubscriptionId>,
    /// Subscription ids owned by each specter.
    by_specter: HashMap<SpecterId, Vec<SubscriptionId>>,
}

/// Concurrent store of subscriptions.
///
/// Cheap to share behind an `Arc`; many registrants and many routers may use
/// it at the same time.
#[derive(Default)]
pub struct SubscriptionIndex {
    state: RwLock<IndexState>,
}

impl SubscriptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a subscription atomically and returns it.
    pub async fn register(&self, pattern: Pattern, specter_id: SpecterId) -> Arc<Subscription> {
        let keys = literal_keys(&pattern);
        let id = SubscriptionId::generate();

        let mut st = self.state.write().await;
        let seq = st.next_seq;
        st.next_seq += 1;

        let sub = Arc::new(Subscription::new(id.clone(), pattern, specter_id.clone(), seq));

        match keys {
            Some(keys) => {
                for key in keys {
                    *st.literal_fields.entry(key.0.clone()).or_insert(0) += 1;
                    st.literal.entry(key).or_default().push(id.clone());
                }
            }
            None => {
                st.scan.insert(seq, id.clone());
            }
        }
        st.by_specter.entry(specter_id).or_default().push(id.clone());
        st.by_id.insert(id, Arc::clone(&sub));
        sub
    }

    /// Removes one subscription. Returns it if it was registered.
    pub async fn unregister(&self, id: &SubscriptionId) -> Option<Arc<Subscription>> {
        let mut st = self.state.write().await;
        let sub = st.detach(id)?;
        if let Some(ids) = st.by_specter.get_mut(sub.specter_id()) {
            ids.retain(|other| other != id);
            if ids.is_empty() {
                st.by_specter.remove(sub.specter_id());
            }
        }
        Some(sub)
    }

    /// Removes every subscription owned by `specter_id` in one step.
    pub async fn remove_by_specter(&self, specter_id: &SpecterId) -> Vec<Arc<Subscription>> {
        let mut st = self.state.write().await;
        let ids = st.by_specter.remove(specter_id).unwrap_or_default();
        ids.iter().filter_map(|id| st.detach(id)).collect()
    }

    /// Specter ids of all matching subscriptions, best first.
    pub async fn find_matching(&self, signal: &Signal) -> Vec<SpecterId> {
        self.find_matching_subscriptions(signal)
            .await
            .into_iter()
            .map(|sub| sub.specter_id().clone())
            .collect()
    }

    /// All matching subscriptions ordered by descending priority, ties by
    /// registration order.
    pub async fn find_matching_subscriptions(&self, signal: &Signal) -> Vec<Arc<Subscription>> {
        let st = self.state.read().await;
        let mut seen: HashSet<u64> = HashSet::new();
        let mut hits: Vec<Arc<Subscription>> = Vec::new();

        for field in st.literal_fields.keys() {
            let Some(value) = signal.field(field) else {
                continue;
            };
            let Some(canon) = canonical(&value) else {
                continue;
            };
            let Some(ids) = st.literal.get(&(field.clone(), canon)) else {
                continue;
            };
            for id in ids {
                if let Some(sub) = st.by_id.get(id) {
                    if seen.insert(sub.seq()) {
                        hits.push(Arc::clone(sub));
                    }
                }
            }
        }

        for id in st.scan.values() {
            if let Some(sub) = st.by_id.get(id) {
                if sub.pattern().matches(signal).is_some() && seen.insert(sub.seq()) {
                    hits.push(Arc::clone(sub));
                }
            }
        }
        drop(st);

        hits.sort_by_key(|sub| (Reverse(sub.priority()), sub.seq()));
        hits
    }

    /// Snapshot of every subscription in registration order.
    pub async fn list(&self) -> Vec<Arc<Subscription>> {
        let st = self.state.read().await;
        let mut all: Vec<Arc<Subscription>> = st.by_id.values().cloned().collect();
        all.sort_by_key(|sub| sub.seq());
        all
    }

    pub async fn get(&self, id: &SubscriptionId) -> Option<Arc<Subscription>> {
        self.state.read().await.by_id.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.by_id.is_empty()
    }
}

impl IndexState {
    /// Drops `id` from every structure except `by_specter`.
    fn detach(&mut self, id: &SubscriptionId) -> Option<Arc<Subscription>> {
        let sub = self.by_id.remove(id)?;
        match literal_keys(sub.pattern()) {
            Some(keys) => {
                for key in keys {
                    if let Some(ids) = self.literal.get_mut(&key) {
                        ids.retain(|other| other != id);
                        if ids.is_empty() {
                            self.literal.remove(&key);
                        }
                    }
                    if let Some(count) = self.literal_fields.get_mut(&key.0) {
                        *count -= 1;
                        if *count == 0 {
                            self.literal_fields.remove(&key.0);
                        }
                    }
                }
            }
            None => {
                self.scan.remove(&sub.seq());
            }
        }
        Some(sub)
    }
}

/// Inverted-index keys for a literal pattern, `None` if it must be scanned.
fn literal_keys(pattern: &Pattern) -> Option<Vec<LiteralKey>> {
    if !pattern.is_literal() {
        return None;
    }
    pattern
        .exact()
        .iter()
        .map(|(field, value)| canonical(value).map(|canon| (field.clone(), canon)))
        .collect()
}

/// Canonical text for scalar JSON values. Arrays and objects have none: their
/// equality does not survive serialization (object key order).
fn canonical(value: &Value) -> Option<String> {
    match value {
        Value::Array(_) | Value::Object(_) => None,
        scalar => Some(scalar.to_string()),
    }
}
