//! # In-memory signal queue.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::QueueError;
use crate::queue::SignalQueue;
use crate::signals::Signal;

/// Options for [`MemoryQueue::new`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryQueueOptions {
    /// Maximum number of buffered signals (`None` = unbounded).
    pub capacity: Option<usize>,
}

impl MemoryQueueOptions {
    /// Bounded queue holding at most `capacity` signals.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
        }
    }
}

/// FIFO backed by a `VecDeque`. `None` inside the lock means cleaned up.
#[derive(Debug)]
pub struct MemoryQueue {
    items: Mutex<Option<VecDeque<Signal>>>,
    capacity: Option<usize>,
}

impl MemoryQueue {
    pub fn new(opts: MemoryQueueOptions) -> Self {
        Self {
            items: Mutex::new(Some(VecDeque::new())),
            capacity: opts.capacity,
        }
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new(MemoryQueueOptions::default())
    }
}

#[async_trait]
impl SignalQueue for MemoryQueue {
    async fn push(&self, signal: Signal) -> Result<(), QueueError> {
        let mut guard = self.items.lock().await;
        let items = guard.as_mut().ok_or(QueueError::Closed)?;
        if let Some(capacity) = self.capacity {
            if items.len() >= capacity {
                return Err(QueueError::Full { capacity });
            }
        }
        items.push_back(signal);
        Ok(())
    }

    async fn pop(&self) -> Result<Option<Signal>, QueueError> {
        let mut guard = self.items.lock().await;
        let items = guard.as_mut().ok_or(QueueError::Closed)?;
        Ok(items.pop_front())
    }

    async fn len(&self) -> Result<usize, QueueError> {
        let guard = self.items.lock().await;
        guard.as_ref().map(VecDeque::len).ok_or(QueueError::Closed)
    }

    async fn cleanup(&self) -> Result<(), QueueError> {
        let mut guard = self.items.lock().await;
        guard.take().map(drop).ok_or(QueueError::Closed)
    }
}
