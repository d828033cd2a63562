//! Error types for queue access, unit faults, and pool lifecycle.

use std::any::Any;

use thiserror::Error;

/// Message used when a unit dies without any recoverable error value.
pub const PROCESSOR_FAULT_MESSAGE: &str = "panic error from processor";

/// Errors produced by queue collaborators.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The call to the queue service could not complete.
    #[error("queue transport error: {0}")]
    Transport(String),
    /// The receipt handle is unknown or no longer valid.
    #[error("receipt handle not found: {0}")]
    ReceiptNotFound(String),
    /// The request was rejected before reaching the queue.
    #[error("invalid queue request: {0}")]
    InvalidRequest(String),
}

/// Abnormal termination of an execution unit.
///
/// Produced at the unit boundary and consumed once by the supervisor, which
/// schedules a replacement unit.
#[derive(Debug, Error)]
pub enum UnitFault {
    /// The handler returned an error, or panicked with an `anyhow::Error`.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
    /// The handler panicked with a message.
    #[error("processor panicked: {0}")]
    Panic(String),
    /// The handler panicked with a payload that carries no error value.
    #[error("{}", PROCESSOR_FAULT_MESSAGE)]
    Unknown,
}

impl UnitFault {
    /// Convert a caught panic payload into a fault, keeping the original value
    /// when it is an error or a message.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<anyhow::Error>() {
            Ok(err) => return Self::Handler(*err),
            Err(other) => other,
        };
        let payload = match payload.downcast::<String>() {
            Ok(msg) => return Self::Panic(*msg),
            Err(other) => other,
        };
        match payload.downcast::<&'static str>() {
            Ok(msg) => Self::Panic((*msg).to_string()),
            Err(_) => Self::Unknown,
        }
    }
}

/// Configuration problems detected by [`crate::config`] validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting was not provided.
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    /// A setting was present but unusable.
    #[error("invalid setting `{key}`: {reason}")]
    Invalid {
        /// Setting name.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// The configuration document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Errors returned by [`crate::core::WorkerPool`] operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// `start` was called on a pool that has already been started.
    #[error("worker pool already started")]
    AlreadyStarted,
    /// The pool could not be built from configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Application-facing result using anyhow for business collaborators.
pub type AppResult<T> = Result<T, anyhow::Error>;
