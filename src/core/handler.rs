//! Handler traits invoked by execution units, and handler middleware.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{AppResult, QueueClient};

/// Business-processing collaborator.
///
/// Called once per delivered message. Messages may be delivered more than once
/// and in any order, so implementations must be idempotent.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use queue_worker_pool::core::{AppResult, MessageService};
/// use tokio_util::sync::CancellationToken;
///
/// struct AlbumImporter;
///
/// #[async_trait]
/// impl MessageService for AlbumImporter {
///     async fn process_message(&self, _lifetime: &CancellationToken, payload: &str) -> AppResult<()> {
///         let album: serde_json::Value = serde_json::from_str(payload)?;
///         tracing::info!(%album, "importing album");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MessageService: Send + Sync + 'static {
    /// Process one message payload.
    ///
    /// Returning an error leaves the message on the queue; it becomes eligible
    /// for redelivery once its visibility timeout expires.
    async fn process_message(&self, lifetime: &CancellationToken, payload: &str) -> AppResult<()>;
}

#[async_trait]
impl<S> MessageService for Arc<S>
where
    S: MessageService + ?Sized,
{
    async fn process_message(&self, lifetime: &CancellationToken, payload: &str) -> AppResult<()> {
        (**self).process_message(lifetime, payload).await
    }
}

/// One iteration of work performed by an execution unit.
///
/// Units call `handle` repeatedly until their lifetime is cancelled. Returning
/// an error (or panicking) terminates the unit as a fault; the pool then
/// schedules a replacement.
#[async_trait]
pub trait MessageHandler<Q>: Send + Sync + 'static
where
    Q: QueueClient + ?Sized,
{
    /// Run a single iteration against `queue`.
    async fn handle(&self, lifetime: &CancellationToken, queue: &Q) -> AppResult<()>;
}

#[async_trait]
impl<Q, H> MessageHandler<Q> for Arc<H>
where
    Q: QueueClient + ?Sized,
    H: MessageHandler<Q> + ?Sized,
{
    async fn handle(&self, lifetime: &CancellationToken, queue: &Q) -> AppResult<()> {
        (**self).handle(lifetime, queue).await
    }
}

/// Middleware that logs around every iteration of the wrapped handler.
///
/// The inner result is forwarded unchanged.
#[derive(Debug, Clone)]
pub struct Traced<H> {
    name: &'static str,
    inner: H,
}

impl<H> Traced<H> {
    /// Wrap `inner`, tagging log lines with `name`.
    pub const fn new(name: &'static str, inner: H) -> Self {
        Self { name, inner }
    }

    /// The wrapped handler.
    pub const fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<Q, H> MessageHandler<Q> for Traced<H>
where
    Q: QueueClient + ?Sized,
    H: MessageHandler<Q>,
{
    async fn handle(&self, lifetime: &CancellationToken, queue: &Q) -> AppResult<()> {
        debug!(handler = self.name, "before message processing");
        let started = Instant::now();
        let result = self.inner.handle(lifetime, queue).await;
        debug!(
            handler = self.name,
            elapsed_ms = started.elapsed().as_millis(),
            ok = result.is_ok(),
            "after message processing"
        );
        result
    }
}
