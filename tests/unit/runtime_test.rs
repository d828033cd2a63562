//! Tests for runtime adapters

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use queue_worker_pool::core::{
    AppResult, MessageService, PoolConfig, PoolError, ProcessorSettings, QueueProcessor, Spawn,
    WorkerPool,
};
use queue_worker_pool::infra::InMemoryQueue;
use queue_worker_pool::runtime::{run_until, TokioSpawner};
use tokio_util::sync::CancellationToken;

struct NoopService;

#[async_trait]
impl MessageService for NoopService {
    async fn process_message(&self, _lifetime: &CancellationToken, _payload: &str) -> AppResult<()> {
        Ok(())
    }
}

fn pool(concurrency: usize) -> WorkerPool<QueueProcessor<InMemoryQueue, NoopService>> {
    let settings = ProcessorSettings::default()
        .with_long_poll_wait(Duration::from_millis(50))
        .with_idle_interval(Duration::from_millis(10));
    WorkerPool::new(
        PoolConfig::new(concurrency).with_wait_time(Duration::from_secs(5)),
        QueueProcessor::new(Arc::new(InMemoryQueue::new()), Arc::new(NoopService), settings),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_ambient_spawner_spawn() {
    let (tx, rx) = tokio::sync::oneshot::channel();
    TokioSpawner::ambient().spawn(async move {
        tx.send("ran").unwrap();
    });
    assert_eq!(rx.await.unwrap(), "ran");
}

#[tokio::test(start_paused = true)]
async fn test_run_until_shutdown_future() {
    let pool = pool(2);
    let handler = pool.processor().default_handler();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = stop_tx.send(());
    });

    let stats = run_until(&pool, CancellationToken::new(), handler, async {
        let _ = stop_rx.await;
    })
    .await
    .unwrap();

    assert_eq!(stats.completed_units, 2);
    assert!(pool.is_done());
}

#[tokio::test(start_paused = true)]
async fn test_run_until_ends_on_external_cancel() {
    let pool = pool(1);
    let lifetime = CancellationToken::new();
    let cancel = lifetime.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let stats = run_until(
        &pool,
        lifetime,
        pool.processor().default_handler(),
        std::future::pending::<()>(),
    )
    .await
    .unwrap();
    assert_eq!(stats.completed_units, 1);
}

#[tokio::test]
async fn test_run_until_rejects_started_pool() {
    let pool = pool(1);
    let lifetime = CancellationToken::new();
    pool.start(lifetime.clone(), pool.processor().default_handler()).unwrap();

    let result = run_until(&pool, lifetime.clone(), pool.processor().default_handler(), async {}).await;
    assert!(matches!(result, Err(PoolError::AlreadyStarted)));

    lifetime.cancel();
    pool.done().await;
}
