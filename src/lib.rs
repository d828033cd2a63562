//! # Queue Worker Pool
//!
//! A supervised worker pool for queue consumers.
//!
//! A fixed number of execution units each run a message handler in a loop
//! until the pool's lifetime is cancelled. Units are isolated from one
//! another: a unit whose handler errors or panics is reported to a supervisor
//! and replaced after a retry interval, while its siblings keep running.
//! Shutdown is coordinated and bounded by a wait time.
//!
//! ## Key Features
//!
//! - **Fault isolation**: handler errors and panics stay inside the unit
//! - **Fixed-delay respawn**: failed units are replaced after `retry_interval`
//! - **Bounded shutdown**: `done()` resolves once every unit has completed or
//!   `wait_time` has elapsed
//! - **Default queue handler**: receive, process, delete on success, idle when
//!   the queue is empty
//! - **Backends**: an in-memory queue with visibility timeouts, and Amazon SQS
//!   behind the `sqs` feature
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use queue_worker_pool::builders::build_worker_pool;
//! use queue_worker_pool::config::WorkerConfig;
//! use queue_worker_pool::core::Traced;
//! use queue_worker_pool::infra::InMemoryQueue;
//! use queue_worker_pool::runtime::run_until_signal;
//! use tokio_util::sync::CancellationToken;
//!
//! let cfg = WorkerConfig::from_env()?;
//! let pool = build_worker_pool(&cfg, Arc::new(InMemoryQueue::new()), Arc::new(my_service))?;
//! let handler = Traced::new("albums", pool.processor().default_handler());
//! let stats = run_until_signal(&pool, CancellationToken::new(), handler).await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Supervision abstractions: pool, processors, handlers, queue contract.
pub mod core;
/// Configuration models for the pool and its queue.
pub mod config;
/// Builders to construct worker pools from configuration.
pub mod builders;
/// Queue backends.
pub mod infra;
/// Runtime adapters: spawning and shutdown.
pub mod runtime;
/// Shared utilities.
pub mod util;
