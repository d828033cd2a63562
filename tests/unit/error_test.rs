//! Tests for error types

use queue_worker_pool::core::{ConfigError, PoolError, QueueError, UnitFault, PROCESSOR_FAULT_MESSAGE};

#[test]
fn test_queue_error_display() {
    let err = QueueError::Transport("connection reset".to_string());
    assert_eq!(format!("{err}"), "queue transport error: connection reset");

    let err = QueueError::ReceiptNotFound("rh-1".to_string());
    assert_eq!(format!("{err}"), "receipt handle not found: rh-1");
}

#[test]
fn test_unit_fault_from_handler_error() {
    let fault = UnitFault::from(anyhow::anyhow!("album import failed"));
    assert_eq!(format!("{fault}"), "album import failed");
}

#[test]
fn test_unit_fault_sentinel_message() {
    assert_eq!(format!("{}", UnitFault::Unknown), PROCESSOR_FAULT_MESSAGE);
}

#[test]
fn test_config_error_display() {
    let err = ConfigError::Missing("SQS_QUEUE_URL");
    assert_eq!(format!("{err}"), "missing required setting: SQS_QUEUE_URL");

    let err = ConfigError::Invalid {
        key: "WORKER_CONCURRENCY",
        reason: "must be greater than 0".to_string(),
    };
    assert_eq!(
        format!("{err}"),
        "invalid setting `WORKER_CONCURRENCY`: must be greater than 0"
    );
}

#[test]
fn test_pool_error_wraps_config_error() {
    let err: PoolError = ConfigError::Missing("AWS_REGION").into();
    assert!(matches!(err, PoolError::Config(ConfigError::Missing("AWS_REGION"))));
    assert_eq!(
        format!("{err}"),
        "invalid configuration: missing required setting: AWS_REGION"
    );
    assert_eq!(format!("{}", PoolError::AlreadyStarted), "worker pool already started");
}
