//! Runtime abstraction for placing execution units and supervisory loops.

use std::future::Future;

/// Abstraction for spawning a detached task on a runtime.
pub trait Spawn: Clone + Send + Sync + 'static {
    /// Spawn a future that runs to completion independently of the caller.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
