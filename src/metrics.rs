//! Metric helpers for `hci_bridge`.
//!
//! This module defines metric names and simple helper functions wrapping
//! the [`metrics`](https://docs.rs/metrics) crate. Without the `metrics`
//! feature every helper compiles to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking relayed packets.
pub const PACKETS_RELAYED: &str = "hci_bridge_packets_relayed_total";
/// Name of the counter tracking discarded unsupported indicator bytes.
pub const UNSUPPORTED_TAGS: &str = "hci_bridge_unsupported_tags_total";
/// Name of the counter tracking packets cut to the buffer capacity.
pub const PACKETS_TRUNCATED: &str = "hci_bridge_packets_truncated_total";
/// Name of the counter tracking packets dropped without being relayed.
pub const PACKETS_DISCARDED: &str = "hci_bridge_packets_discarded_total";

/// Direction of relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Packets framed from the host stream and submitted to the controller.
    HostToController,
    /// Packets read from the controller and written to the host.
    ControllerToHost,
}

impl Direction {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::HostToController => "host_to_controller",
            Direction::ControllerToHost => "controller_to_host",
        }
    }
}

/// Why a packet was dropped instead of relayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// Declared length exceeded the buffer under the discard policy.
    Oversized,
    /// A partial host packet exceeded the stall timeout.
    Stalled,
    /// The controller refused the submission.
    WriteFailed,
    /// A controller packet was shorter than the transport header.
    HeaderUnderflow,
}

impl DiscardReason {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oversized => "oversized",
            Self::Stalled => "stalled",
            Self::WriteFailed => "write_failed",
            Self::HeaderUnderflow => "header_underflow",
        }
    }
}

/// Record a relayed packet for the given direction.
pub fn inc_relayed(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(PACKETS_RELAYED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a discarded unsupported indicator byte.
pub fn inc_unsupported_tags() {
    #[cfg(feature = "metrics")]
    counter!(UNSUPPORTED_TAGS).increment(1);
}

/// Record a packet truncated to the buffer capacity.
pub fn inc_truncated() {
    #[cfg(feature = "metrics")]
    counter!(PACKETS_TRUNCATED).increment(1);
}

/// Record a packet dropped for `reason`.
pub fn inc_discarded(reason: DiscardReason) {
    #[cfg(feature = "metrics")]
    counter!(PACKETS_DISCARDED, "reason" => reason.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}
