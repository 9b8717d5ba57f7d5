//! # Field transformations.
//!
//! A [`Transform`] rewrites one payload value. Transformations are attached to
//! a pattern at registration time and applied to a signal copy when the
//! subscription matches.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Shared, thread-safe value rewrite.
///
/// ## Example
/// ```rust
/// use serde_json::{json, Value};
/// use specterflow::Transform;
///
/// let upper = Transform::new(|v: &Value| match v.as_str() {
///     Some(s) => Value::String(s.to_uppercase()),
///     None => v.clone(),
/// });
/// assert_eq!(upper.apply(&json!("eu")), json!("EU"));
/// ```
#[derive(Clone)]
pub struct Transform {
    f: Arc<dyn Fn(&Value) -> Value + Send + Sync>,
}

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    #[inline]
    pub fn apply(&self, value: &Value) -> Value {
        (self.f)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}
