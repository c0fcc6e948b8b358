//! Error types for the cafe simulation.

use thiserror::Error;

use crate::types::OrderId;

/// Top-level error for a simulation run.
#[derive(Error, Debug)]
pub enum SimError {
    /// Startup configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An order arrived after shutdown was signaled
    #[error("Order {order} placed after the queue was shut down")]
    QueueClosed { order: OrderId },

    /// The OS refused to start a worker thread
    #[error("Failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked before it could be joined
    #[error("{role} {id} panicked")]
    TaskPanicked { role: &'static str, id: u64 },
}

/// Configuration values the blocking protocol has no defined behavior for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("customers must be > 0")]
    ZeroCustomers,

    #[error("baristas must be > 0")]
    ZeroBaristas,

    #[error("queue capacity must be > 0 (a zero-capacity queue blocks every customer forever)")]
    ZeroCapacity,

    #[error("steps per order must be > 0")]
    ZeroSteps,
}

pub type Result<T> = std::result::Result<T, SimError>;
