//! # Built-in subscribers
//!
//! Small, self-contained implementations useful for demos and operations.

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
