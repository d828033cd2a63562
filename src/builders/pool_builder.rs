//! Builders to construct a worker pool from configuration.

use std::sync::Arc;

use crate::config::WorkerConfig;
use crate::core::{MessageService, PoolError, QueueClient, QueueProcessor, WorkerPool};

/// Validate `cfg` and build a pool whose units consume `queue` and hand
/// payloads to `service`, running on the ambient tokio runtime.
///
/// # Errors
///
/// Returns [`PoolError::Config`] if the configuration is invalid.
pub fn build_worker_pool<Q, S>(
    cfg: &WorkerConfig,
    queue: Arc<Q>,
    service: Arc<S>,
) -> Result<WorkerPool<QueueProcessor<Q, S>>, PoolError>
where
    Q: QueueClient + ?Sized,
    S: MessageService + ?Sized,
{
    cfg.validate()?;

    let processor = QueueProcessor::new(queue, service, cfg.to_processor_settings());
    Ok(WorkerPool::new(cfg.to_pool_config(), processor))
}
