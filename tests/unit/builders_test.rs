//! Tests for builder modules

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use queue_worker_pool::builders::build_worker_pool;
use queue_worker_pool::config::{PoolOptions, QueueOptions, WorkerConfig};
use queue_worker_pool::core::{AppResult, ConfigError, MessageService, PoolError, PoolState};
use queue_worker_pool::infra::InMemoryQueue;
use tokio_util::sync::CancellationToken;

struct NoopService;

#[async_trait]
impl MessageService for NoopService {
    async fn process_message(&self, _lifetime: &CancellationToken, _payload: &str) -> AppResult<()> {
        Ok(())
    }
}

fn config(concurrency: usize) -> WorkerConfig {
    WorkerConfig {
        pool: PoolOptions {
            concurrency,
            retry_interval_ms: 200,
            wait_time_ms: 1_500,
        },
        queue: QueueOptions {
            queue_url: "memory://albums".to_string(),
            region: "local".to_string(),
            max_messages: 4,
            ..QueueOptions::default()
        },
    }
}

#[tokio::test]
async fn test_build_worker_pool_applies_config() {
    let pool = build_worker_pool(&config(3), Arc::new(InMemoryQueue::new()), Arc::new(NoopService)).unwrap();

    assert_eq!(pool.config().concurrency, 3);
    assert_eq!(pool.config().retry_interval, Duration::from_millis(200));
    assert_eq!(pool.config().wait_time, Duration::from_millis(1_500));
    assert_eq!(pool.processor().settings().max_messages, 4);
    assert_eq!(pool.state(), PoolState::Idle);
}

#[test]
fn test_build_worker_pool_rejects_invalid_config() {
    let result = build_worker_pool(&config(0), Arc::new(InMemoryQueue::new()), Arc::new(NoopService));
    assert!(matches!(
        result,
        Err(PoolError::Config(ConfigError::Invalid {
            key: "WORKER_CONCURRENCY",
            ..
        }))
    ));
}
