//! Supervisor: spawns units, replaces failed ones, coordinates shutdown.
//!
//! Coordination is message passing only: units report faults and completions
//! over unbounded channels, counters are atomics, and the done-condition is a
//! cancellation token broadcast to every waiter.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::core::{MessageHandler, PoolError, Processor, QueueClient, Spawn, UnitFault};
use crate::runtime::TokioSpawner;

use super::{PoolConfig, PoolCounters, PoolState, PoolStats};

/// State shared by the pool handle, its units, and both supervisory loops.
struct Shared<P, S> {
    config: PoolConfig,
    processor: P,
    spawner: S,
    counters: PoolCounters,
    started: AtomicBool,
    next_unit_id: AtomicU64,
    done: CancellationToken,
}

/// Everything a unit needs for one `start` call.
struct UnitContext<Q>
where
    Q: QueueClient + ?Sized,
{
    lifetime: CancellationToken,
    handler: Arc<dyn MessageHandler<Q>>,
    faults: UnboundedSender<UnitFault>,
    completions: UnboundedSender<()>,
}

/// Supervised pool of execution units.
///
/// See the [module documentation](super) for the lifecycle.
pub struct WorkerPool<P, S = TokioSpawner>
where
    P: Processor,
    S: Spawn,
{
    shared: Arc<Shared<P, S>>,
}

impl<P> WorkerPool<P, TokioSpawner>
where
    P: Processor,
{
    /// Create a pool whose units run on the ambient tokio runtime.
    ///
    /// `start` must then be called from within that runtime.
    pub fn new(config: PoolConfig, processor: P) -> Self {
        Self::with_spawner(config, processor, TokioSpawner::ambient())
    }
}

impl<P, S> WorkerPool<P, S>
where
    P: Processor,
    S: Spawn,
{
    /// Create a pool that places its tasks through `spawner`.
    pub fn with_spawner(config: PoolConfig, processor: P, spawner: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                processor,
                spawner,
                counters: PoolCounters::default(),
                started: AtomicBool::new(false),
                next_unit_id: AtomicU64::new(0),
                done: CancellationToken::new(),
            }),
        }
    }

    /// Spawn `concurrency` units running `handler`, plus the fault and
    /// shutdown supervisors. Units stop once `lifetime` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AlreadyStarted`] if the pool was started before;
    /// nothing is spawned in that case.
    pub fn start<H>(&self, lifetime: CancellationToken, handler: H) -> Result<(), PoolError>
    where
        H: MessageHandler<P::Queue>,
    {
        if self.shared.started.swap(true, Ordering::AcqRel) {
            warn!("worker pool start called more than once");
            return Err(PoolError::AlreadyStarted);
        }

        let config = &self.shared.config;
        if config.concurrency == 0 {
            warn!("worker pool started with zero concurrency; no units will run");
        }

        let (faults_tx, faults_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(UnitContext {
            lifetime: lifetime.clone(),
            handler: Arc::new(handler) as Arc<dyn MessageHandler<P::Queue>>,
            faults: faults_tx,
            completions: completions_tx,
        });

        self.shared.counters.set_state(PoolState::Running);

        self.shared.spawner.spawn(
            Self::supervise_faults(Arc::clone(&self.shared), Arc::clone(&ctx), faults_rx)
                .instrument(info_span!("fault_supervisor")),
        );
        self.shared.spawner.spawn(
            Self::coordinate_shutdown(Arc::clone(&self.shared), lifetime, completions_rx)
                .instrument(info_span!("shutdown_coordinator")),
        );

        for _ in 0..config.concurrency {
            Self::spawn_unit(&self.shared, &ctx);
        }

        info!(
            concurrency = config.concurrency,
            retry_interval_ms = config.retry_interval.as_millis(),
            wait_time_ms = config.wait_time.as_millis(),
            "worker pool started"
        );
        Ok(())
    }

    /// A future that resolves once the pool is done.
    ///
    /// May be requested any number of times, before or after completion.
    #[must_use]
    pub fn done(&self) -> WaitForCancellationFutureOwned {
        self.shared.done.clone().cancelled_owned()
    }

    /// Whether the pool has reached its terminal state.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.shared.done.is_cancelled()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PoolState {
        self.shared.counters.state()
    }

    /// Snapshot of unit counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.shared.counters.snapshot(self.shared.config.concurrency)
    }

    /// Pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// The processor driving each unit.
    #[must_use]
    pub fn processor(&self) -> &P {
        &self.shared.processor
    }

    /// Run one unit inside a fault boundary.
    ///
    /// A handler error or panic never crosses the boundary: it becomes a
    /// [`UnitFault`] sent to the fault supervisor, and the unit ends.
    fn spawn_unit(shared: &Arc<Shared<P, S>>, ctx: &Arc<UnitContext<P::Queue>>) {
        let unit_id = shared.next_unit_id.fetch_add(1, Ordering::Relaxed);
        shared.counters.live_units.fetch_add(1, Ordering::AcqRel);
        shared.counters.spawned_units.fetch_add(1, Ordering::AcqRel);

        let spawner = shared.spawner.clone();
        let shared = Arc::clone(shared);
        let ctx = Arc::clone(ctx);
        let unit = async move {
            debug!("unit started");
            let outcome = AssertUnwindSafe(shared.processor.process(
                &ctx.lifetime,
                &ctx.completions,
                ctx.handler.as_ref(),
            ))
            .catch_unwind()
            .await;
            shared.counters.live_units.fetch_sub(1, Ordering::AcqRel);

            let fault = match outcome {
                Ok(Ok(())) => {
                    debug!("unit completed");
                    return;
                }
                Ok(Err(fault)) => fault,
                Err(payload) => UnitFault::from_panic(payload),
            };

            shared.counters.faults.fetch_add(1, Ordering::AcqRel);
            error!(error = %fault, "unit terminated abnormally");
            if ctx.faults.send(fault).is_err() {
                debug!("fault supervisor gone, unit will not be replaced");
            }
        };

        spawner.spawn(unit.instrument(info_span!("unit", unit_id)));
    }

    /// Replace each failed unit after `retry_interval`, until done.
    ///
    /// Retries are unbounded and the delay never grows.
    async fn supervise_faults(
        shared: Arc<Shared<P, S>>,
        ctx: Arc<UnitContext<P::Queue>>,
        mut faults: UnboundedReceiver<UnitFault>,
    ) {
        loop {
            let fault = tokio::select! {
                biased;
                () = shared.done.cancelled() => break,
                report = faults.recv() => match report {
                    Some(fault) => fault,
                    None => break,
                },
            };

            debug!(
                error = %fault,
                retry_interval_ms = shared.config.retry_interval.as_millis(),
                "scheduling replacement unit"
            );

            tokio::select! {
                biased;
                () = shared.done.cancelled() => break,
                () = tokio::time::sleep(shared.config.retry_interval) => {}
            }

            shared.counters.respawns.fetch_add(1, Ordering::AcqRel);
            Self::spawn_unit(&shared, &ctx);
        }
        debug!("fault supervisor stopped");
    }

    /// After `lifetime` is cancelled, count completions until every unit has
    /// reported or `wait_time` has elapsed, then mark the pool done.
    ///
    /// Units still running at the deadline are abandoned, not aborted.
    async fn coordinate_shutdown(
        shared: Arc<Shared<P, S>>,
        lifetime: CancellationToken,
        mut completions: UnboundedReceiver<()>,
    ) {
        lifetime.cancelled().await;
        shared.counters.set_state(PoolState::ShuttingDown);

        let target = shared.config.concurrency;
        info!(
            units = target,
            wait_time_ms = shared.config.wait_time.as_millis(),
            "lifetime cancelled, waiting for units to complete"
        );

        if target > 0 {
            let deadline = tokio::time::sleep(shared.config.wait_time);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    biased;
                    Some(()) = completions.recv() => {
                        let completed = shared.counters.completed_units.fetch_add(1, Ordering::AcqRel) + 1;
                        debug!(completed, target, "unit reported completion");
                        if completed >= target {
                            info!("all units completed");
                            break;
                        }
                    }
                    () = &mut deadline => {
                        warn!(
                            completed = shared.counters.completed_units.load(Ordering::Acquire),
                            target,
                            "shutdown wait elapsed, abandoning outstanding units"
                        );
                        break;
                    }
                }
            }
        }

        shared.counters.set_state(PoolState::Done);
        shared.done.cancel();
        info!("worker pool done");
    }
}
