//! Queue backends.

pub mod memory;
#[cfg(feature = "sqs")]
pub mod sqs;

pub use memory::InMemoryQueue;
#[cfg(feature = "sqs")]
pub use sqs::SqsQueue;
