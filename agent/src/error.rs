//! Agent error types

use thiserror::Error;

/// Failures of a transport sink
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport {0} is not open")]
    NotOpen(String),

    #[error("I/O error on transport {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the capture pipeline
#[derive(Debug, Error)]
pub enum AgentError {
    /// The sink reported not ready at startup. Fatal, never retried.
    #[error("transport {0} is not ready")]
    TransportNotReady(String),

    #[error("capture adapter lock poisoned")]
    Poisoned,
}
