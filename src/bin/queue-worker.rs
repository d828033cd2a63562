//! Queue worker process: consumes an SQS queue until SIGINT or SIGTERM.
//!
//! Configuration comes from the environment (and `.env` when present); see
//! [`WorkerConfig::from_env`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use queue_worker_pool::builders::build_worker_pool;
use queue_worker_pool::config::WorkerConfig;
use queue_worker_pool::core::{AppResult, MessageService, Traced};
use queue_worker_pool::infra::SqsQueue;
use queue_worker_pool::runtime::run_until_signal;
use queue_worker_pool::util::init_tracing;

/// Logs each payload, decoding it as JSON when possible.
struct LoggingService;

#[async_trait]
impl MessageService for LoggingService {
    async fn process_message(&self, _lifetime: &CancellationToken, payload: &str) -> AppResult<()> {
        match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(value) => info!(payload = %value, "processing message"),
            Err(_) => info!(payload, "processing raw message"),
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = WorkerConfig::from_env()?;
    let queue = Arc::new(SqsQueue::connect(&cfg.queue).await);
    let pool = build_worker_pool(&cfg, queue, Arc::new(LoggingService))?;
    let handler = Traced::new("queue-worker", pool.processor().default_handler());

    let stats = run_until_signal(&pool, CancellationToken::new(), handler).await?;
    info!(spawned_units = stats.spawned_units, "worker has stopped");
    Ok(())
}
