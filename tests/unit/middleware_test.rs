//! Tests for handler middleware

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use queue_worker_pool::core::{
    AppResult, DefaultMessageHandler, MessageHandler, MessageService, ProcessorSettings, QueueClient,
    Traced,
};
use queue_worker_pool::infra::InMemoryQueue;
use tokio_util::sync::CancellationToken;

struct Scripted {
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl MessageHandler<InMemoryQueue> for Scripted {
    async fn handle(&self, _lifetime: &CancellationToken, _queue: &InMemoryQueue) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("scripted failure");
        }
        Ok(())
    }
}

struct Recorder {
    seen: parking_lot::Mutex<Vec<String>>,
}

#[async_trait]
impl MessageService for Recorder {
    async fn process_message(&self, _lifetime: &CancellationToken, payload: &str) -> AppResult<()> {
        self.seen.lock().push(payload.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_traced_forwards_ok() {
    let traced = Traced::new(
        "ok",
        Scripted {
            fail: false,
            calls: AtomicUsize::new(0),
        },
    );
    let queue = InMemoryQueue::new();
    traced.handle(&CancellationToken::new(), &queue).await.unwrap();
    assert_eq!(traced.inner().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_traced_forwards_error_unchanged() {
    let traced = Traced::new(
        "failing",
        Scripted {
            fail: true,
            calls: AtomicUsize::new(0),
        },
    );
    let queue = InMemoryQueue::new();
    let err = traced
        .handle(&CancellationToken::new(), &queue)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "scripted failure");
}

#[tokio::test]
async fn test_traced_wraps_default_handler() {
    let service = Arc::new(Recorder {
        seen: parking_lot::Mutex::new(Vec::new()),
    });
    let handler = Traced::new(
        "albums",
        Arc::new(DefaultMessageHandler::new(
            Arc::clone(&service),
            ProcessorSettings::default().with_long_poll_wait(Duration::ZERO),
        )),
    );
    let queue = InMemoryQueue::new();
    queue.send_message(r#"{"title":"Blue Train"}"#).await.unwrap();

    handler.handle(&CancellationToken::new(), &queue).await.unwrap();

    assert_eq!(service.seen.lock().as_slice(), [r#"{"title":"Blue Train"}"#]);
    assert!(queue.is_empty(), "processed message is deleted");
    assert_eq!(queue.approximate_message_count().await.unwrap(), 0);
}
