//! Queue collaborator abstraction consumed by processors.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::QueueError;

/// Maximum number of messages a single receive call may return.
pub const MAX_RECEIVE_BATCH: usize = 10;

/// A message delivered by a queue collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    /// Queue-assigned message identifier, stable across redeliveries.
    pub id: String,
    /// Message payload.
    pub body: String,
    /// Handle for this particular delivery; required to delete or hide it.
    pub receipt_handle: String,
}

/// Operations against a durable message source with at-least-once delivery.
///
/// Messages that are received but not deleted become visible again once their
/// visibility timeout expires.
#[async_trait]
pub trait QueueClient: Send + Sync + 'static {
    /// Receive up to `max_messages` (capped at [`MAX_RECEIVE_BATCH`]),
    /// long-polling for at most `wait` when the queue is empty.
    async fn receive_messages(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    /// Acknowledge a delivery by removing the message from the queue.
    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError>;

    /// Reset the visibility timeout of an in-flight delivery.
    async fn change_message_visibility(
        &self,
        receipt_handle: &str,
        timeout_secs: u32,
    ) -> Result<(), QueueError>;

    /// Publish a single message.
    async fn send_message(&self, body: &str) -> Result<(), QueueError>;

    /// Publish several messages in one call. An empty batch is a no-op.
    async fn send_messages(&self, bodies: &[String]) -> Result<(), QueueError>;

    /// Approximate number of messages available for receipt.
    async fn approximate_message_count(&self) -> Result<usize, QueueError>;
}

/// Clamp a requested batch size into the range a receive call accepts.
#[must_use]
pub fn clamp_batch(max_messages: usize) -> usize {
    max_messages.clamp(1, MAX_RECEIVE_BATCH)
}
