//! Bridge configuration.
//!
//! [`BridgeConfig`] sizes the per-direction buffers, selects the oversize
//! policy, and tunes how the two relay contexts poll.

use std::time::Duration;

use crate::{assembler::OversizePolicy, packet::MAX_PREAMBLE_LEN};

/// Default assembly buffer size.
///
/// The controller advertises a 1021 byte ACL payload limit; with the 4 byte
/// ACL preamble and the indicator that is 1026 bytes, comfortably below this.
pub const DEFAULT_BUFFER_CAPACITY: usize = 2048;

/// Smallest buffer accepted: the indicator plus the longest preamble.
pub const MIN_BUFFER_CAPACITY: usize = 1 + MAX_PREAMBLE_LEN;

/// Largest buffer that can ever be filled: an ACL packet with a 16-bit length.
pub const MAX_BUFFER_CAPACITY: usize = 1 + MAX_PREAMBLE_LEN + u16::MAX as usize;

pub(crate) fn clamp_buffer_capacity(value: usize) -> usize {
    value.clamp(MIN_BUFFER_CAPACITY, MAX_BUFFER_CAPACITY)
}

/// Polling cadence for a relay context.
///
/// After a step that made progress the context yields and polls again at
/// once. After an idle step it sleeps for `idle_delay`; a zero delay only
/// yields, which turns the context into a pure busy-poll loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause taken after a step that moved no bytes.
    pub idle_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            idle_delay: Duration::from_micros(500),
        }
    }
}

impl PollConfig {
    /// Upper bound applied by [`normalized`](Self::normalized).
    pub const MAX_IDLE_DELAY: Duration = Duration::from_millis(100);

    /// Clamp the idle delay so a misconfiguration cannot starve the relay.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use hci_bridge::config::PollConfig;
    ///
    /// let cfg = PollConfig {
    ///     idle_delay: Duration::from_secs(5),
    /// };
    /// assert_eq!(cfg.normalized().idle_delay, PollConfig::MAX_IDLE_DELAY);
    /// ```
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.idle_delay = self.idle_delay.min(Self::MAX_IDLE_DELAY);
        self
    }
}

/// Configuration shared by both relay directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    buffer_capacity: usize,
    oversize_policy: OversizePolicy,
    stall_timeout: Option<Duration>,
    poll: PollConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            oversize_policy: OversizePolicy::default(),
            stall_timeout: None,
            poll: PollConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Configuration with default values.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Set the per-direction buffer size, clamped to
    /// [`MIN_BUFFER_CAPACITY`]..=[`MAX_BUFFER_CAPACITY`].
    ///
    /// ```
    /// use hci_bridge::config::{BridgeConfig, MIN_BUFFER_CAPACITY};
    ///
    /// let cfg = BridgeConfig::new().with_buffer_capacity(1);
    /// assert_eq!(cfg.buffer_capacity(), MIN_BUFFER_CAPACITY);
    /// ```
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = clamp_buffer_capacity(capacity);
        self
    }

    /// Choose how oversized host packets are handled.
    #[must_use]
    pub fn with_oversize_policy(mut self, policy: OversizePolicy) -> Self {
        self.oversize_policy = policy;
        self
    }

    /// Abandon a partial host packet after `timeout` without new bytes.
    ///
    /// `None` (the default) waits forever, leaving the direction blocked
    /// until the host completes the packet.
    #[must_use]
    pub fn with_stall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Set the polling cadence; the value is [normalized](PollConfig::normalized).
    #[must_use]
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll.normalized();
        self
    }

    /// Per-direction buffer size in bytes.
    #[must_use]
    pub const fn buffer_capacity(&self) -> usize { self.buffer_capacity }

    /// Oversize handling policy.
    #[must_use]
    pub const fn oversize_policy(&self) -> OversizePolicy { self.oversize_policy }

    /// Stall timeout for partial host packets.
    #[must_use]
    pub const fn stall_timeout(&self) -> Option<Duration> { self.stall_timeout }

    /// Polling cadence for both contexts.
    #[must_use]
    pub const fn poll(&self) -> PollConfig { self.poll }
}
