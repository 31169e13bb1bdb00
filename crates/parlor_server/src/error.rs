//! Server-level error types.

use thiserror::Error;

/// Failures surfaced by the relay server itself (as opposed to engine
/// request errors, which travel back to clients as structured acks).
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding, listening or serving the transport failed.
    #[error("network error: {0}")]
    Network(String),

    /// Anything else that should stop the server.
    #[error("internal error: {0}")]
    Internal(String),
}
