//! Pattern compilation and matching.
//!
//! ## Contents
//! - [`PatternSpec`] registration-time description (raw fields, priority, transforms)
//! - [`Pattern`]     compiled exact / wildcard / regex buckets
//! - [`Transform`]   payload value rewrite applied on match
//! - [`glob_match`]  the `*` / `?` wildcard language

mod glob;
mod pattern;
mod transform;

pub use glob::{Glob, glob_match};
pub use pattern::{Pattern, PatternSpec};
pub use transform::Transform;
