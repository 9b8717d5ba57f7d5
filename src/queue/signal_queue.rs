use async_trait::async_trait;

use crate::error::QueueError;
use crate::signals::Signal;

/// # FIFO buffer of signals.
///
/// Initialisation is the implementation's constructor. After
/// [`cleanup`](SignalQueue::cleanup) every operation, including a second
/// `cleanup`, fails with [`QueueError::Closed`].
///
/// # Example
/// ```
/// use specterflow::{MemoryQueue, MemoryQueueOptions, Signal, SignalQueue, QueueError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), QueueError> {
/// let q = MemoryQueue::new(MemoryQueueOptions::default());
/// q.push(Signal::new("s", Default::default()).with_id("a")).await?;
/// assert_eq!(q.len().await?, 1);
/// assert_eq!(q.pop().await?.map(|s| s.id().to_owned()), Some("a".to_owned()));
/// q.cleanup().await?;
/// assert_eq!(q.len().await, Err(QueueError::Closed));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SignalQueue: Send + Sync + 'static {
    /// Appends a signal at the tail.
    async fn push(&self, signal: Signal) -> Result<(), QueueError>;

    /// Removes the head, or `None` when empty.
    async fn pop(&self) -> Result<Option<Signal>, QueueError>;

    /// Number of buffered signals.
    async fn len(&self) -> Result<usize, QueueError>;

    /// Releases the queue. Buffered signals are dropped.
    async fn cleanup(&self) -> Result<(), QueueError>;

    async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }
}
