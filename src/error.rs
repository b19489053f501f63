//! Error types for the relay.
//!
//! Nothing here is fatal to the bridge. Pump steps return these errors so
//! callers can observe what was dropped; the runtime logs them and keeps
//! polling.

use thiserror::Error;

/// Errors raised while translating the controller transport header.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// The controller returned fewer bytes than the header occupies.
    #[error("controller packet of {len} bytes is shorter than the transport header")]
    Underflow {
        /// Length of the offending buffer.
        len: usize,
    },
}

/// Errors surfaced by a single pump step.
#[derive(Debug, Error)]
pub enum RelayError<E> {
    /// The controller driver failed to read or accept a packet.
    #[error("controller transport error: {0}")]
    Controller(#[source] E),

    /// A controller packet could not be translated for the host.
    #[error(transparent)]
    Header(#[from] HeaderError),
}

impl<E> RelayError<E> {
    /// Reason label used in logs and metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Controller(_) => "controller_error",
            Self::Header(_) => "header_underflow",
        }
    }
}

/// Errors that stop the bridge runtime.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A relay context panicked or was aborted.
    #[error("relay task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
