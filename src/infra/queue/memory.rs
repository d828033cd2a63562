//! In-memory queue with visibility timeouts and long-polling.
//!
//! Mirrors the delivery semantics of a hosted queue closely enough for local
//! runs and tests: a received message is hidden for the visibility timeout and
//! reappears with a fresh receipt handle unless it is deleted first.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use uuid::Uuid;

use crate::core::queue::clamp_batch;
use crate::core::{QueueClient, QueueError, QueueMessage};

/// Visibility timeout applied to received messages unless overridden.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

struct StoredMessage {
    id: String,
    body: String,
    visible_at: Instant,
    receipt_handle: Option<String>,
    receive_count: u32,
}

/// In-memory queue shared between producers and worker units.
pub struct InMemoryQueue {
    visibility_timeout: Duration,
    max_depth: Option<usize>,
    messages: Mutex<VecDeque<StoredMessage>>,
    arrivals: Notify,
    next_id: AtomicU64,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    /// Create an unbounded queue with the default visibility timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
            max_depth: None,
            messages: Mutex::new(VecDeque::new()),
            arrivals: Notify::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Set how long a received message stays hidden.
    #[must_use]
    pub const fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Reject sends once `max_depth` messages are stored.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Messages stored, visible or in flight.
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Whether the queue holds no messages at all.
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// How many times the message with `id` has been delivered.
    pub fn receive_count(&self, id: &str) -> Option<u32> {
        self.messages
            .lock()
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.receive_count)
    }

    fn push(&self, bodies: impl IntoIterator<Item = String>) -> Result<(), QueueError> {
        let now = Instant::now();
        {
            let mut messages = self.messages.lock();
            let incoming: Vec<String> = bodies.into_iter().collect();
            if let Some(max_depth) = self.max_depth {
                if messages.len() + incoming.len() > max_depth {
                    return Err(QueueError::InvalidRequest(format!(
                        "queue full: max depth {max_depth} reached"
                    )));
                }
            }
            for body in incoming {
                let id = format!("msg-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
                messages.push_back(StoredMessage {
                    id,
                    body,
                    visible_at: now,
                    receipt_handle: None,
                    receive_count: 0,
                });
            }
        }
        self.arrivals.notify_waiters();
        Ok(())
    }

    /// Hide and return up to `max` visible messages, plus the earliest instant
    /// at which a hidden message becomes visible again.
    fn take_visible(&self, max: usize, now: Instant) -> (Vec<QueueMessage>, Option<Instant>) {
        let mut messages = self.messages.lock();
        let mut batch = Vec::new();
        let mut next_visible: Option<Instant> = None;

        for stored in messages.iter_mut() {
            if stored.visible_at <= now && batch.len() < max {
                let receipt_handle = Uuid::new_v4().to_string();
                stored.visible_at = now + self.visibility_timeout;
                stored.receipt_handle = Some(receipt_handle.clone());
                stored.receive_count += 1;
                batch.push(QueueMessage {
                    id: stored.id.clone(),
                    body: stored.body.clone(),
                    receipt_handle,
                });
            } else if stored.visible_at > now {
                next_visible = Some(next_visible.map_or(stored.visible_at, |t| t.min(stored.visible_at)));
            }
        }

        (batch, next_visible)
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn receive_messages(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let max = clamp_batch(max_messages);
        let deadline = Instant::now() + wait;

        loop {
            let arrival = self.arrivals.notified();
            tokio::pin!(arrival);
            arrival.as_mut().enable();

            let now = Instant::now();
            let (batch, next_visible) = self.take_visible(max, now);
            if !batch.is_empty() || now >= deadline {
                return Ok(batch);
            }

            let wake_at = next_visible.map_or(deadline, |t| t.min(deadline));
            tokio::select! {
                () = &mut arrival => {}
                () = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut messages = self.messages.lock();
        let position = messages
            .iter()
            .position(|m| m.receipt_handle.as_deref() == Some(receipt_handle))
            .ok_or_else(|| QueueError::ReceiptNotFound(receipt_handle.to_string()))?;
        messages.remove(position);
        Ok(())
    }

    async fn change_message_visibility(
        &self,
        receipt_handle: &str,
        timeout_secs: u32,
    ) -> Result<(), QueueError> {
        {
            let mut messages = self.messages.lock();
            let stored = messages
                .iter_mut()
                .find(|m| m.receipt_handle.as_deref() == Some(receipt_handle))
                .ok_or_else(|| QueueError::ReceiptNotFound(receipt_handle.to_string()))?;
            stored.visible_at = Instant::now() + Duration::from_secs(u64::from(timeout_secs));
        }
        if timeout_secs == 0 {
            self.arrivals.notify_waiters();
        }
        Ok(())
    }

    async fn send_message(&self, body: &str) -> Result<(), QueueError> {
        self.push([body.to_string()])
    }

    async fn send_messages(&self, bodies: &[String]) -> Result<(), QueueError> {
        if bodies.is_empty() {
            return Ok(());
        }
        self.push(bodies.iter().cloned())
    }

    async fn approximate_message_count(&self) -> Result<usize, QueueError> {
        let now = Instant::now();
        Ok(self
            .messages
            .lock()
            .iter()
            .filter(|m| m.visible_at <= now)
            .count())
    }
}
