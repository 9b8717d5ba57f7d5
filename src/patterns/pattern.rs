//! # Compiled subscription patterns.
//!
//! A [`Pattern`] is built once from a raw field map and never changes.
//! Compilation partitions the raw fields:
//! ```text
//! raw value                          → bucket
//! ─────────────────────────────────────────────────
//! "~r/<expr>/<flags>"  (flags ⊆ imsx) → regexes   (compiled, may fail)
//! string containing '*' or '?'       → wildcards (glob)
//! anything else                      → exact     (JSON equality)
//! ```
//!
//! ## Matching
//! [`Pattern::matches`] evaluates three predicates; all must hold:
//! - **exact**: empty, or *at least one* exact field equals the signal's value;
//! - **wildcard**: every wildcard field is present, a string, and glob-matches;
//! - **regex**: every regex field is present, a string, and matches (search, not anchored).
//!
//! The exact predicate is an OR across fields: `{status: "open", region: "eu"}`
//! matches a signal with `{status: "open", region: "us"}`.

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::error::PatternError;
use crate::patterns::glob::Glob;
use crate::patterns::transform::Transform;
use crate::signals::{Fields, Signal, payload_key};

/// Registration-time description of a subscription pattern.
///
/// Bundles the raw field map with the priority and transformations and is
/// turned into a [`Pattern`] by [`PatternSpec::compile`].
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use specterflow::PatternSpec;
///
/// let spec = PatternSpec::new()
///     .field("status", json!("open"))
///     .field("region", json!("e*"))
///     .field("title", json!("~r/^urgent/i"))
///     .priority(10);
///
/// let pattern = spec.compile().unwrap();
/// assert_eq!(pattern.priority(), 10);
/// assert_eq!(pattern.exact().len(), 1);
/// assert_eq!(pattern.wildcards().len(), 1);
/// assert_eq!(pattern.regexes().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PatternSpec {
    raw: Fields,
    priority: i64,
    transformations: Vec<(String, Transform)>,
}

impl PatternSpec {
    /// Empty pattern: matches every signal with priority `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing raw field map.
    pub fn from_fields(raw: Fields) -> Self {
        Self {
            raw,
            ..Self::default()
        }
    }

    /// Adds (or replaces) one raw field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.raw.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Adds (or replaces) the transformation applied to payload field `name`.
    ///
    /// `name` is a payload key, bare or as `payload.<key>`; both spellings
    /// address the same field.
    #[must_use]
    pub fn transform(mut self, name: impl Into<String>, t: Transform) -> Self {
        let name: String = name.into();
        let name = payload_key(&name).to_string();
        self.transformations.retain(|(n, _)| *n != name);
        self.transformations.push((name, t));
        self
    }

    /// Compiles the raw fields; fails on malformed regex fields.
    pub fn compile(self) -> Result<Pattern, PatternError> {
        Pattern::compile(&self.raw, self.priority, self.transformations)
    }
}

/// Compiled, immutable matching structure.
#[derive(Clone, Debug)]
pub struct Pattern {
    exact: Fields,
    wildcards: Vec<(String, Glob)>,
    regexes: Vec<(String, Regex)>,
    priority: i64,
    transformations: Vec<(String, Transform)>,
}

impl Pattern {
    /// Partitions `raw` into exact, wildcard and regex buckets.
    pub fn compile(
        raw: &Fields,
        priority: i64,
        transformations: Vec<(String, Transform)>,
    ) -> Result<Self, PatternError> {
        let mut exact = Fields::new();
        let mut wildcards = Vec::new();
        let mut regexes = Vec::new();

        for (field, value) in raw {
            match value.as_str() {
                Some(text) => {
                    if let Some((expr, flags)) = split_regex_literal(text) {
                        regexes.push((field.clone(), build_regex(field, expr, flags)?));
                    } else if Glob::is_glob(text) {
                        wildcards.push((field.clone(), Glob::new(text)));
                    } else {
                        exact.insert(field.clone(), value.clone());
                    }
                }
                None => {
                    exact.insert(field.clone(), value.clone());
                }
            }
        }

        Ok(Self {
            exact,
            wildcards,
            regexes,
            priority,
            transformations,
        })
    }

    /// Evaluates the pattern; returns the priority on a match.
    pub fn matches(&self, signal: &Signal) -> Option<i64> {
        let hit = self.exact_holds(signal) && self.wildcards_hold(signal) && self.regexes_hold(signal);
        hit.then_some(self.priority)
    }

    /// Returns a copy of `signal` with this pattern's transformations applied
    /// to the payload. Fields missing from the payload are left alone.
    pub fn apply_transformations(&self, signal: &Signal) -> Signal {
        let mut out = signal.clone();
        for (field, t) in &self.transformations {
            if let Some(v) = out.payload.get_mut(payload_key(field)) {
                *v = t.apply(v);
            }
        }
        out
    }

    #[inline]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    #[inline]
    pub fn exact(&self) -> &Fields {
        &self.exact
    }

    #[inline]
    pub fn wildcards(&self) -> &[(String, Glob)] {
        &self.wildcards
    }

    #[inline]
    pub fn regexes(&self) -> &[(String, Regex)] {
        &self.regexes
    }

    #[inline]
    pub fn has_transformations(&self) -> bool {
        !self.transformations.is_empty()
    }

    /// True when matching depends only on literal equality (non-empty exact
    /// bucket, no wildcard or regex fields). Such patterns can be served from
    /// an inverted index.
    pub fn is_literal(&self) -> bool {
        !self.exact.is_empty() && self.wildcards.is_empty() && self.regexes.is_empty()
    }

    fn exact_holds(&self, signal: &Signal) -> bool {
        self.exact.is_empty()
            || self
                .exact
                .iter()
                .any(|(field, want)| signal.field(field).is_some_and(|got| *got == *want))
    }

    fn wildcards_hold(&self, signal: &Signal) -> bool {
        self.wildcards.iter().all(|(field, glob)| {
            signal
                .field(field)
                .is_some_and(|got| got.as_str().is_some_and(|s| glob.is_match(s)))
        })
    }

    fn regexes_hold(&self, signal: &Signal) -> bool {
        self.regexes.iter().all(|(field, re)| {
            signal
                .field(field)
                .is_some_and(|got| got.as_str().is_some_and(|s| re.is_match(s)))
        })
    }
}

/// Splits `~r/<expr>/<flags>` into `(expr, flags)`.
///
/// Only alphabetic flag suffixes count; anything else is not a regex literal.
fn split_regex_literal(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix("~r/")?;
    let end = body.rfind('/')?;
    let (expr, flags) = (&body[..end], &body[end + 1..]);
    flags
        .chars()
        .all(|c| c.is_ascii_alphabetic())
        .then_some((expr, flags))
}

fn build_regex(field: &str, expr: &str, flags: &str) -> Result<Regex, PatternError> {
    let mut builder = RegexBuilder::new(expr);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(PatternError::UnsupportedFlag {
                    field: field.to_string(),
                    flag: other,
                });
            }
        };
    }
    builder.build().map_err(|source| PatternError::InvalidRegex {
        field: field.to_string(),
        pattern: expr.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signal(payload: Value) -> Signal {
        Signal::new("test.v1", payload.as_object().cloned().unwrap_or_default())
    }

    fn compile(raw: Value) -> Pattern {
        PatternSpec::from_fields(raw.as_object().cloned().unwrap_or_default())
            .compile()
            .unwrap()
    }

    #[test]
    fn empty_pattern_matches_everything_with_its_priority() {
        let p = PatternSpec::new().priority(7).compile().unwrap();
        assert_eq!(p.matches(&signal(json!({}))), Some(7));
        assert_eq!(p.matches(&signal(json!({"x": [1, 2]}))), Some(7));
    }

    #[test]
    fn compile_partitions_fields() {
        let p = compile(json!({
            "status": "open",
            "count": 3,
            "region": "e?",
            "title": "~r/^inc-\\d+$/",
        }));
        assert_eq!(p.exact().len(), 2);
        assert_eq!(p.wildcards().len(), 1);
        assert_eq!(p.regexes().len(), 1);
        assert!(!p.is_literal());
    }

    #[test]
    fn regex_literal_wins_over_wildcard_characters() {
        let p = compile(json!({"name": "~r/a*b?/"}));
        assert_eq!(p.regexes().len(), 1);
        assert!(p.wildcards().is_empty());
    }

    #[test]
    fn exact_fields_are_or_combined() {
        let p = compile(json!({"status": "open", "region": "eu"}));
        assert!(p.matches(&signal(json!({"status": "open", "region": "us"}))).is_some());
        assert!(p.matches(&signal(json!({"status": "closed", "region": "eu"}))).is_some());
        assert!(p.matches(&signal(json!({"status": "closed", "region": "us"}))).is_none());
        assert!(p.matches(&signal(json!({}))).is_none());
    }

    #[test]
    fn exact_compares_json_values() {
        let p = compile(json!({"count": 3, "flags": {"hot": true}}));
        assert!(p.matches(&signal(json!({"count": 3}))).is_some());
        assert!(p.matches(&signal(json!({"flags": {"hot": true}}))).is_some());
        assert!(p.matches(&signal(json!({"count": "3"}))).is_none());
    }

    #[test]
    fn wildcards_require_every_field_as_string() {
        let p = compile(json!({"topic": "order.*", "region": "e?"}));
        assert!(p.matches(&signal(json!({"topic": "order.created", "region": "eu"}))).is_some());
        assert!(p.matches(&signal(json!({"topic": "order.created"}))).is_none());
        assert!(p.matches(&signal(json!({"topic": "order.created", "region": 42}))).is_none());
    }

    #[test]
    fn regexes_require_every_field_as_string() {
        let p = compile(json!({"title": "~r/urgent/i", "code": "~r/^E\\d{3}$/"}));
        assert!(p.matches(&signal(json!({"title": "Very URGENT", "code": "E042"}))).is_some());
        assert!(p.matches(&signal(json!({"title": "urgent", "code": "E42"}))).is_none());
        assert!(p.matches(&signal(json!({"title": "urgent"}))).is_none());
        assert!(p.matches(&signal(json!({"title": 1, "code": "E042"}))).is_none());
    }

    #[test]
    fn all_three_predicates_must_hold() {
        let p = compile(json!({"status": "open", "topic": "t.*", "title": "~r/x/"}));
        assert!(p.matches(&signal(json!({"status": "open", "topic": "t.a", "title": "x"}))).is_some());
        assert!(p.matches(&signal(json!({"status": "open", "topic": "u.a", "title": "x"}))).is_none());
        assert!(p.matches(&signal(json!({"status": "shut", "topic": "t.a", "title": "x"}))).is_none());
    }

    #[test]
    fn envelope_fields_are_addressable() {
        let p = compile(json!({"schema_id": "test.*"}));
        assert!(p.matches(&signal(json!({}))).is_some());
    }

    #[test]
    fn malformed_regex_fails_compilation() {
        let err = PatternSpec::new()
            .field("x", json!("~r/(unclosed/"))
            .compile()
            .unwrap_err();
        assert_eq!(err.as_label(), "pattern_invalid_regex");
    }

    #[test]
    fn unknown_regex_flag_fails_compilation() {
        let err = PatternSpec::new()
            .field("x", json!("~r/abc/q"))
            .compile()
            .unwrap_err();
        assert!(matches!(err, PatternError::UnsupportedFlag { flag: 'q', .. }));
    }

    #[test]
    fn non_literal_tilde_strings_stay_exact() {
        let p = compile(json!({"path": "~r/home/dir 2"}));
        assert_eq!(p.exact().len(), 1);
        assert!(p.regexes().is_empty());
    }

    #[test]
    fn transformations_touch_only_present_fields() {
        let p = PatternSpec::new()
            .transform("amount", Transform::new(|v| json!(v.as_i64().unwrap_or(0) * 100)))
            .transform("missing", Transform::new(|_| json!("boom")))
            .compile()
            .unwrap();

        let original = signal(json!({"amount": 5, "currency": "eur"}));
        let out = p.apply_transformations(&original);

        assert_eq!(out.payload().get("amount"), Some(&json!(500)));
        assert_eq!(out.payload().get("currency"), Some(&json!("eur")));
        assert!(out.payload().get("missing").is_none());
        assert_eq!(out.id(), original.id());
        assert_eq!(original.payload().get("amount"), Some(&json!(5)));
    }

    #[test]
    fn transformations_accept_payload_paths() {
        let p = PatternSpec::new()
            .field("payload.amount", json!(5))
            .transform("payload.amount", Transform::new(|v| json!(v.as_i64().unwrap_or(0) + 1)))
            .compile()
            .unwrap();

        let original = signal(json!({"amount": 5}));
        assert!(p.matches(&original).is_some());
        let out = p.apply_transformations(&original);
        assert_eq!(out.payload().get("amount"), Some(&json!(6)));
        assert!(out.payload().get("payload.amount").is_none());
    }

    #[test]
    fn prefixed_and_bare_transform_keys_are_one_field() {
        let p = PatternSpec::new()
            .transform("amount", Transform::new(|_| json!(1)))
            .transform("payload.amount", Transform::new(|_| json!(2)))
            .compile()
            .unwrap();
        let out = p.apply_transformations(&signal(json!({"amount": 0})));
        assert_eq!(out.payload().get("amount"), Some(&json!(2)));
    }

    #[test]
    fn later_transform_for_same_field_replaces_earlier() {
        let p = PatternSpec::new()
            .transform("n", Transform::new(|_| json!(1)))
            .transform("n", Transform::new(|_| json!(2)))
            .compile()
            .unwrap();
        let out = p.apply_transformations(&signal(json!({"n": 0})));
        assert_eq!(out.payload().get("n"), Some(&json!(2)));
    }
}
