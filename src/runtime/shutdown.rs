//! Signal-driven shutdown for long-running worker processes.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::{MessageHandler, PoolError, PoolStats, Processor, Spawn, WorkerPool};

/// Resolve on SIGINT (Ctrl-C) or, on unix, SIGTERM.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}

/// Start `pool` with `handler`, cancel `lifetime` once `shutdown` resolves, and
/// wait for the pool to finish.
///
/// Cancelling `lifetime` from elsewhere also ends the run.
///
/// # Errors
///
/// Returns [`PoolError::AlreadyStarted`] if the pool was started before.
pub async fn run_until<P, S, H, F>(
    pool: &WorkerPool<P, S>,
    lifetime: CancellationToken,
    handler: H,
    shutdown: F,
) -> Result<PoolStats, PoolError>
where
    P: Processor,
    S: Spawn,
    H: MessageHandler<P::Queue>,
    F: std::future::Future<Output = ()> + Send,
{
    pool.start(lifetime.clone(), handler)?;
    info!("worker running, waiting for shutdown signal");

    tokio::select! {
        () = shutdown => {
            info!("shutting down worker");
            lifetime.cancel();
        }
        () = lifetime.cancelled() => {}
    }

    pool.done().await;
    let stats = pool.stats();
    info!(
        completed_units = stats.completed_units,
        faults = stats.faults,
        respawns = stats.respawns,
        "worker stopped"
    );
    Ok(stats)
}

/// [`run_until`] driven by [`wait_for_shutdown_signal`].
///
/// # Errors
///
/// Returns [`PoolError::AlreadyStarted`] if the pool was started before.
pub async fn run_until_signal<P, S, H>(
    pool: &WorkerPool<P, S>,
    lifetime: CancellationToken,
    handler: H,
) -> Result<PoolStats, PoolError>
where
    P: Processor,
    S: Spawn,
    H: MessageHandler<P::Queue>,
{
    run_until(pool, lifetime, handler, wait_for_shutdown_signal()).await
}
