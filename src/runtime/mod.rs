//! Runtime adapters: task spawning and process shutdown.

pub mod shutdown;
pub mod tokio_spawner;

pub use shutdown::{run_until, run_until_signal, wait_for_shutdown_signal};
pub use tokio_spawner::TokioSpawner;
