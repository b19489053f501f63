//! Directional relay pumps.
//!
//! [`UpstreamPump`] frames the host byte stream and submits each packet to
//! the controller behind the transport header. [`DownstreamPump`] takes
//! packets the controller has already framed, strips the header, and writes
//! them to the host. Each pump owns its buffers; the two share no state, so
//! they can run on separate contexts without locking each other.
//!
//! A step is a single bounded, non-blocking attempt. Callers invoke it in a
//! loop and use the returned [`Progress`] to decide how long to wait before
//! the next attempt.

mod downstream;
#[cfg(test)]
mod tests;
mod upstream;

pub use downstream::DownstreamPump;
pub use upstream::UpstreamPump;

/// Outcome of a single pump step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Nothing was available; the step changed no state.
    Idle,
    /// Bytes moved but no packet finished crossing the bridge.
    Advanced,
    /// A packet of `len` bytes (transport header excluded) was relayed.
    Relayed {
        /// Packet length without the transport header.
        len: usize,
    },
}

impl Progress {
    /// Whether the step made no progress at all.
    #[must_use]
    pub const fn is_idle(self) -> bool { matches!(self, Self::Idle) }
}
