//! Supervised worker pool that keeps a fixed number of execution units running.
//!
//! Each unit repeatedly invokes a [`MessageHandler`](crate::core::MessageHandler)
//! through a [`Processor`](crate::core::Processor) until the pool's lifetime
//! token is cancelled. A unit that fails is replaced after `retry_interval`;
//! shutdown waits at most `wait_time` for units to report completion.
//!
//! # Lifecycle
//!
//! `Idle` → `Running` (on `start`) → `ShuttingDown` (lifetime cancelled) →
//! `Done` (all units completed, or `wait_time` elapsed). A pool is started at
//! most once.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use queue_worker_pool::core::{PoolConfig, ProcessorSettings, QueueProcessor, Traced, WorkerPool};
//! use queue_worker_pool::infra::InMemoryQueue;
//! use tokio_util::sync::CancellationToken;
//!
//! let processor = QueueProcessor::new(Arc::new(InMemoryQueue::new()), Arc::new(my_service), ProcessorSettings::default());
//! let handler = Traced::new("albums", processor.default_handler());
//! let pool = WorkerPool::new(
//!     PoolConfig::new(4)
//!         .with_retry_interval(Duration::from_secs(5))
//!         .with_wait_time(Duration::from_secs(10)),
//!     processor,
//! );
//!
//! let lifetime = CancellationToken::new();
//! pool.start(lifetime.clone(), handler)?;
//! // ... later
//! lifetime.cancel();
//! pool.done().await;
//! ```

mod supervisor;

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use supervisor::WorkerPool;

/// Default delay before a failed unit is replaced.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);
/// Default upper bound on graceful shutdown.
pub const DEFAULT_WAIT_TIME: Duration = Duration::from_secs(10);

/// Pool sizing and timing.
///
/// Values are taken as given; the pool performs no validation. A
/// `concurrency` of zero yields a pool that runs nothing and reports done as
/// soon as its lifetime is cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of execution units kept alive.
    pub concurrency: usize,
    /// Delay before spawning a replacement for a failed unit.
    pub retry_interval: Duration,
    /// Maximum time to wait for units to complete after cancellation.
    pub wait_time: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            wait_time: DEFAULT_WAIT_TIME,
        }
    }
}

impl PoolConfig {
    /// Config with `concurrency` units and default timings.
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Self::default()
        }
    }

    /// Set the unit count.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the respawn delay.
    #[must_use]
    pub const fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Set the shutdown bound.
    #[must_use]
    pub const fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }
}

/// Lifecycle state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PoolState {
    /// Constructed, not started.
    Idle = 0,
    /// Units are running.
    Running = 1,
    /// Lifetime cancelled; waiting for units to complete.
    ShuttingDown = 2,
    /// Terminal.
    Done = 3,
}

impl PoolState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::ShuttingDown,
            _ => Self::Done,
        }
    }
}

/// Point-in-time view of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Configured unit count.
    pub concurrency: usize,
    /// Units currently executing.
    pub live_units: usize,
    /// Units spawned since start, replacements included.
    pub spawned_units: usize,
    /// Units that terminated abnormally.
    pub faults: usize,
    /// Replacement units spawned after faults.
    pub respawns: usize,
    /// Completion signals counted during shutdown.
    pub completed_units: usize,
    /// Lifecycle state.
    pub state: PoolState,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug)]
pub(crate) struct PoolCounters {
    pub live_units: AtomicUsize,
    pub spawned_units: AtomicUsize,
    pub faults: AtomicUsize,
    pub respawns: AtomicUsize,
    pub completed_units: AtomicUsize,
    pub state: AtomicU8,
}

impl Default for PoolCounters {
    fn default() -> Self {
        Self {
            live_units: AtomicUsize::new(0),
            spawned_units: AtomicUsize::new(0),
            faults: AtomicUsize::new(0),
            respawns: AtomicUsize::new(0),
            completed_units: AtomicUsize::new(0),
            state: AtomicU8::new(PoolState::Idle as u8),
        }
    }
}

impl PoolCounters {
    pub fn state(&self) -> PoolState {
        PoolState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: PoolState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, concurrency: usize) -> PoolStats {
        PoolStats {
            concurrency,
            live_units: self.live_units.load(Ordering::Acquire),
            spawned_units: self.spawned_units.load(Ordering::Acquire),
            faults: self.faults.load(Ordering::Acquire),
            respawns: self.respawns.load(Ordering::Acquire),
            completed_units: self.completed_units.load(Ordering::Acquire),
            state: self.state(),
        }
    }
}
