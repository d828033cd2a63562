//! Processors bind a queue collaborator to the handler loop run by each unit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::queue::clamp_batch;
use super::{AppResult, MessageHandler, MessageService, QueueClient, UnitFault, MAX_RECEIVE_BATCH};

/// Default long-poll wait for a receive call.
pub const DEFAULT_LONG_POLL_WAIT: Duration = Duration::from_secs(20);
/// Default pause after a receive call returns nothing.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_secs(1);

/// Drives one execution unit.
#[async_trait]
pub trait Processor: Send + Sync + 'static {
    /// Queue collaborator handed to handlers.
    type Queue: QueueClient + ?Sized;

    /// Invoke `handler` repeatedly until `lifetime` is cancelled, then signal
    /// `unit_done` and return.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitFault`] when the handler fails; the unit ends there.
    async fn process(
        &self,
        lifetime: &CancellationToken,
        unit_done: &UnboundedSender<()>,
        handler: &dyn MessageHandler<Self::Queue>,
    ) -> Result<(), UnitFault>;
}

/// Tuning for the default receive/process/delete handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorSettings {
    /// Messages requested per receive call, at most [`MAX_RECEIVE_BATCH`].
    pub max_messages: usize,
    /// Long-poll wait passed to the queue.
    pub long_poll_wait: Duration,
    /// Pause before polling again after an empty or failed receive.
    pub idle_interval: Duration,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            max_messages: MAX_RECEIVE_BATCH,
            long_poll_wait: DEFAULT_LONG_POLL_WAIT,
            idle_interval: DEFAULT_IDLE_INTERVAL,
        }
    }
}

impl ProcessorSettings {
    /// Set messages requested per receive; clamped to `1..=MAX_RECEIVE_BATCH`.
    #[must_use]
    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = clamp_batch(max_messages);
        self
    }

    /// Set the long-poll wait.
    #[must_use]
    pub const fn with_long_poll_wait(mut self, wait: Duration) -> Self {
        self.long_poll_wait = wait;
        self
    }

    /// Set the idle pause.
    #[must_use]
    pub const fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }
}

/// Processor over a queue collaborator and a business service.
pub struct QueueProcessor<Q, S>
where
    Q: QueueClient + ?Sized,
    S: MessageService + ?Sized,
{
    queue: Arc<Q>,
    service: Arc<S>,
    settings: ProcessorSettings,
}

impl<Q, S> QueueProcessor<Q, S>
where
    Q: QueueClient + ?Sized,
    S: MessageService + ?Sized,
{
    /// Create a processor.
    pub fn new(queue: Arc<Q>, service: Arc<S>, settings: ProcessorSettings) -> Self {
        Self {
            queue,
            service,
            settings,
        }
    }

    /// The queue collaborator.
    pub const fn queue(&self) -> &Arc<Q> {
        &self.queue
    }

    /// Settings used by [`Self::default_handler`].
    pub const fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    /// The receive/process/delete handler bound to this processor's service.
    #[must_use]
    pub fn default_handler(&self) -> Arc<DefaultMessageHandler<S>> {
        Arc::new(DefaultMessageHandler::new(
            Arc::clone(&self.service),
            self.settings.clone(),
        ))
    }
}

#[async_trait]
impl<Q, S> Processor for QueueProcessor<Q, S>
where
    Q: QueueClient + ?Sized,
    S: MessageService + ?Sized,
{
    type Queue = Q;

    async fn process(
        &self,
        lifetime: &CancellationToken,
        unit_done: &UnboundedSender<()>,
        handler: &dyn MessageHandler<Q>,
    ) -> Result<(), UnitFault> {
        loop {
            if lifetime.is_cancelled() {
                debug!("lifetime cancelled, unit completing");
                if unit_done.send(()).is_err() {
                    debug!("supervisor stopped listening for completions");
                }
                return Ok(());
            }

            handler.handle(lifetime, self.queue.as_ref()).await?;

            // Handlers that never suspend would otherwise starve sibling tasks.
            tokio::task::yield_now().await;
        }
    }
}

/// Receive a batch, hand each message to the service, delete what succeeded.
///
/// Failed messages stay on the queue and are redelivered after their
/// visibility timeout, so delivery to the service is at-least-once.
pub struct DefaultMessageHandler<S>
where
    S: MessageService + ?Sized,
{
    service: Arc<S>,
    settings: ProcessorSettings,
}

impl<S> DefaultMessageHandler<S>
where
    S: MessageService + ?Sized,
{
    /// Create a handler for `service`.
    pub fn new(service: Arc<S>, settings: ProcessorSettings) -> Self {
        Self { service, settings }
    }

    async fn idle(&self, lifetime: &CancellationToken) {
        tokio::select! {
            () = tokio::time::sleep(self.settings.idle_interval) => {}
            () = lifetime.cancelled() => {}
        }
    }
}

#[async_trait]
impl<Q, S> MessageHandler<Q> for DefaultMessageHandler<S>
where
    Q: QueueClient + ?Sized,
    S: MessageService + ?Sized,
{
    async fn handle(&self, lifetime: &CancellationToken, queue: &Q) -> AppResult<()> {
        let messages = match queue
            .receive_messages(self.settings.max_messages, self.settings.long_poll_wait)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "failed to receive messages");
                self.idle(lifetime).await;
                return Ok(());
            }
        };

        if messages.is_empty() {
            self.idle(lifetime).await;
            return Ok(());
        }

        debug!(count = messages.len(), "received messages");

        for message in messages {
            if let Err(e) = self.service.process_message(lifetime, &message.body).await {
                warn!(
                    message_id = %message.id,
                    error = %e,
                    "message processing failed, leaving it for redelivery"
                );
                continue;
            }

            if let Err(e) = queue.delete_message(&message.receipt_handle).await {
                error!(message_id = %message.id, error = %e, "failed to delete message");
            }
        }

        Ok(())
    }
}
