//! Tests for the in-memory queue backend

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use queue_worker_pool::core::{QueueClient, QueueError};
use queue_worker_pool::infra::InMemoryQueue;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_consumers_get_distinct_messages() {
    let queue = Arc::new(InMemoryQueue::new());
    let bodies: Vec<String> = (0..100).map(|i| format!("album-{i}")).collect();
    queue.send_messages(&bodies).await.unwrap();

    let mut consumers = Vec::new();
    for _ in 0..4 {
        let queue = Arc::clone(&queue);
        consumers.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            loop {
                let batch = queue.receive_messages(10, Duration::ZERO).await.unwrap();
                if batch.is_empty() {
                    break;
                }
                for message in batch {
                    queue.delete_message(&message.receipt_handle).await.unwrap();
                    seen.push(message.id);
                }
            }
            seen
        }));
    }

    let mut all = Vec::new();
    for consumer in consumers {
        all.extend(consumer.await.unwrap());
    }
    let distinct: HashSet<_> = all.iter().collect();
    assert_eq!(all.len(), 100);
    assert_eq!(distinct.len(), 100);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_empty_batch_send_is_noop() {
    let queue = InMemoryQueue::new().with_max_depth(1);
    queue.send_messages(&[]).await.unwrap();
    assert!(queue.is_empty());
    assert_eq!(queue.approximate_message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_approximate_count_excludes_in_flight() {
    let queue = InMemoryQueue::new();
    queue
        .send_messages(&["a".to_string(), "b".to_string(), "c".to_string()])
        .await
        .unwrap();
    assert_eq!(queue.approximate_message_count().await.unwrap(), 3);

    let batch = queue.receive_messages(2, Duration::ZERO).await.unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(queue.approximate_message_count().await.unwrap(), 1);
    assert_eq!(queue.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_extended_visibility_delays_redelivery() {
    let queue = InMemoryQueue::new().with_visibility_timeout(Duration::from_secs(1));
    queue.send_message("slow job").await.unwrap();
    let batch = queue.receive_messages(1, Duration::ZERO).await.unwrap();

    queue
        .change_message_visibility(&batch[0].receipt_handle, 60)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(queue.receive_messages(1, Duration::ZERO).await.unwrap().is_empty());

    tokio::time::sleep(Duration::from_secs(60)).await;
    let again = queue.receive_messages(1, Duration::ZERO).await.unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(queue.receive_count(&again[0].id), Some(2));
}

#[tokio::test]
async fn test_change_visibility_unknown_receipt() {
    let queue = InMemoryQueue::new();
    let result = queue.change_message_visibility("missing", 10).await;
    assert!(matches!(result, Err(QueueError::ReceiptNotFound(handle)) if handle == "missing"));
}
