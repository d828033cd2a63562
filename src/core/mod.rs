//! Core supervision abstractions: pool, processors, handlers, queue contract.

pub mod error;
pub mod handler;
pub mod processor;
pub mod queue;
pub mod spawn;
pub mod worker_pool;

pub use error::{AppResult, ConfigError, PoolError, QueueError, UnitFault, PROCESSOR_FAULT_MESSAGE};
pub use handler::{MessageHandler, MessageService, Traced};
pub use processor::{DefaultMessageHandler, Processor, ProcessorSettings, QueueProcessor};
pub use queue::{QueueClient, QueueMessage, MAX_RECEIVE_BATCH};
pub use spawn::Spawn;
pub use worker_pool::{PoolConfig, PoolState, PoolStats, WorkerPool};
