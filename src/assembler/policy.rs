//! Policies for packets whose declared length exceeds the assembly buffer.

/// How the assembler reacts when `1 + preamble + payload` exceeds capacity.
///
/// The host stack never legitimately sends such a packet when the buffer is
/// sized for the controller's advertised limits, so either policy only ever
/// fires on a corrupted or hostile stream. Both are counted in
/// [`PACKETS_TRUNCATED`](crate::metrics::PACKETS_TRUNCATED) or
/// [`PACKETS_DISCARDED`](crate::metrics::PACKETS_DISCARDED).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OversizePolicy {
    /// Hand off the first `capacity` bytes as a packet flagged
    /// [truncated](crate::packet::Packet::is_truncated).
    ///
    /// The undelivered tail stays in the source and is parsed as if it
    /// started a new packet, so the stream is usually desynchronised until
    /// an unsupported tag or a lucky boundary realigns it.
    #[default]
    Truncate,

    /// Consume and drop exactly the declared packet without handing it off.
    ///
    /// The stream stays aligned: the byte after the oversized packet is read
    /// as the next indicator.
    Discard,
}

impl OversizePolicy {
    /// Returns the policy name as a static string for metrics and logging.
    ///
    /// # Examples
    ///
    /// ```
    /// use hci_bridge::assembler::OversizePolicy;
    ///
    /// assert_eq!(OversizePolicy::Truncate.as_str(), "truncate");
    /// assert_eq!(OversizePolicy::Discard.as_str(), "discard");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Truncate => "truncate",
            Self::Discard => "discard",
        }
    }
}
