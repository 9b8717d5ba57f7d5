//! Signal queue abstraction.
//!
//! A pluggable FIFO buffer for signals, for producers that want to decouple
//! publishing from routing. The engine does not wire a queue in by default.
//!
//! ## Contents
//! - [`SignalQueue`] async trait: `push`, `pop`, `len`, `cleanup`
//! - [`MemoryQueue`] in-memory FIFO, optionally bounded via [`MemoryQueueOptions`]
//!
//! ## Lifecycle
//! ```text
//! MemoryQueue::new(opts) ─► push / pop / len ... ─► cleanup()
//!                                                    └─► every later call: Err(QueueError::Closed)
//! ```

mod memory;
mod signal_queue;

pub use memory::{MemoryQueue, MemoryQueueOptions};
pub use signal_queue::SignalQueue;
