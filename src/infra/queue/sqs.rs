//! Amazon SQS backend built on `aws-sdk-sqs`.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::config::Credentials;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::{QueueAttributeName, SendMessageBatchRequestEntry};
use aws_sdk_sqs::Client;
use tracing::{debug, info};

use crate::config::QueueOptions;
use crate::core::queue::clamp_batch;
use crate::core::{QueueClient, QueueError, QueueMessage, MAX_RECEIVE_BATCH};

/// SQS long-poll waits are capped by the service at 20 seconds.
pub const MAX_LONG_POLL_SECS: u64 = 20;

fn transport(err: impl std::error::Error) -> QueueError {
    QueueError::Transport(DisplayErrorContext(err).to_string())
}

fn to_i32(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Queue client bound to a single SQS queue URL.
#[derive(Clone, Debug)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    /// Wrap an existing SDK client.
    #[must_use]
    pub fn from_client(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Build a client from queue options: region, optional endpoint override,
    /// optional static credentials, and an operation timeout.
    pub async fn connect(options: &QueueOptions) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(options.region.clone()))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(options.http_timeout_secs))
                    .build(),
            );

        if let (Some(key_id), Some(secret)) = (&options.access_key_id, &options.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.clone(),
                None,
                None,
                "queue-worker-static",
            ));
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_sqs::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &options.endpoint {
            builder = builder.endpoint_url(endpoint.clone());
        }

        info!(
            queue_url = %options.queue_url,
            region = %options.region,
            endpoint = options.endpoint.as_deref().unwrap_or("default"),
            "sqs client configured"
        );
        Self::from_client(Client::from_conf(builder.build()), options.queue_url.clone())
    }

    /// The queue this client reads from and writes to.
    #[must_use]
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl QueueClient for SqsQueue {
    async fn receive_messages(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let max = i32::try_from(clamp_batch(max_messages)).unwrap_or(1);
        let wait_secs = to_i32(wait.as_secs().min(MAX_LONG_POLL_SECS));

        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max)
            .wait_time_seconds(wait_secs)
            .send()
            .await
            .map_err(transport)?;

        let messages = output
            .messages()
            .iter()
            .filter_map(|message| {
                let Some(receipt_handle) = message.receipt_handle() else {
                    debug!("dropping sqs message without receipt handle");
                    return None;
                };
                Some(QueueMessage {
                    id: message.message_id().unwrap_or_default().to_string(),
                    body: message.body().unwrap_or_default().to_string(),
                    receipt_handle: receipt_handle.to_string(),
                })
            })
            .collect();
        Ok(messages)
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) if service.is_receipt_handle_is_invalid() => {
                    QueueError::ReceiptNotFound(receipt_handle.to_string())
                }
                _ => transport(err),
            })?;
        Ok(())
    }

    async fn change_message_visibility(
        &self,
        receipt_handle: &str,
        timeout_secs: u32,
    ) -> Result<(), QueueError> {
        self.client
            .change_message_visibility()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .visibility_timeout(to_i32(u64::from(timeout_secs)))
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service)
                    if service.is_receipt_handle_is_invalid() || service.is_message_not_inflight() =>
                {
                    QueueError::ReceiptNotFound(receipt_handle.to_string())
                }
                _ => transport(err),
            })?;
        Ok(())
    }

    async fn send_message(&self, body: &str) -> Result<(), QueueError> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(transport)?;
        Ok(())
    }

    async fn send_messages(&self, bodies: &[String]) -> Result<(), QueueError> {
        for chunk in bodies.chunks(MAX_RECEIVE_BATCH) {
            let entries = chunk
                .iter()
                .enumerate()
                .map(|(index, body)| {
                    SendMessageBatchRequestEntry::builder()
                        .id(index.to_string())
                        .message_body(body)
                        .build()
                        .map_err(|err| QueueError::InvalidRequest(err.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let output = self
                .client
                .send_message_batch()
                .queue_url(&self.queue_url)
                .set_entries(Some(entries))
                .send()
                .await
                .map_err(transport)?;

            if let Some(failed) = output.failed().first() {
                return Err(QueueError::Transport(format!(
                    "{} of {} batch entries rejected, first: {}",
                    output.failed().len(),
                    chunk.len(),
                    failed.message().unwrap_or(failed.code())
                )));
            }
        }
        Ok(())
    }

    async fn approximate_message_count(&self) -> Result<usize, QueueError> {
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(transport)?;

        let raw = output
            .attributes()
            .and_then(|attributes| attributes.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .ok_or_else(|| QueueError::Transport("queue depth attribute missing".to_string()))?;
        raw.parse()
            .map_err(|_| QueueError::Transport(format!("unparseable queue depth: {raw}")))
    }
}
