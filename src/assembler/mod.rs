//! Incremental H4 packet assembly.
//!
//! [`Assembler`] turns a byte stream that arrives in arbitrary chunks into
//! discrete [`Packet`]s. Each call to [`Assembler::step`] reads only what the
//! source currently holds, never blocks, and hands off at most one packet.
//!
//! The state machine moves through four phases:
//!
//! - `Idle`: waiting for an indicator byte.
//! - `Preamble`: indicator consumed and kept in `buffer[0]`, waiting until
//!   the whole preamble can be read.
//! - `Payload`: length known, copying payload bytes into the buffer.
//! - `Draining`: dropping the remainder of an oversized packet under
//!   [`OversizePolicy::Discard`].
//!
//! An unsupported indicator costs exactly one byte: it is reported and
//! discarded, and scanning resumes at the next byte.

mod policy;

use std::{fmt, sync::Arc};

use bytes::Bytes;
use log::{debug, warn};
pub use policy::OversizePolicy;

use crate::{
    config::{BridgeConfig, clamp_buffer_capacity},
    diagnostic::{DiagnosticSink, LABEL_TRUNCATED, LABEL_UNSUPPORTED, NoopDiagnostics},
    metrics::{self, DiscardReason},
    packet::{Packet, PacketKind},
    transport::ByteSource,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Preamble { kind: PacketKind, have: usize },
    Payload { kind: PacketKind, truncated: bool },
    Draining { remaining: usize },
}

/// Per-direction packet reassembly state.
///
/// The buffer is allocated once and reused for every packet. Outside of an
/// assembly `expected_len` and `received_len` are both zero, and
/// `received_len <= expected_len <= capacity` holds at all times.
pub struct Assembler {
    buffer: Box<[u8]>,
    expected_len: usize,
    received_len: usize,
    phase: Phase,
    policy: OversizePolicy,
    consumed: u64,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for Assembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembler")
            .field("capacity", &self.buffer.len())
            .field("expected_len", &self.expected_len)
            .field("received_len", &self.received_len)
            .field("phase", &self.phase)
            .field("policy", &self.policy)
            .field("consumed", &self.consumed)
            .finish_non_exhaustive()
    }
}

impl Assembler {
    /// Create an assembler with a buffer of `capacity` bytes.
    ///
    /// The capacity is clamped so the indicator and the longest preamble
    /// always fit.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; clamp_buffer_capacity(capacity)].into_boxed_slice(),
            expected_len: 0,
            received_len: 0,
            phase: Phase::Idle,
            policy: OversizePolicy::default(),
            consumed: 0,
            diagnostics: Arc::new(NoopDiagnostics),
        }
    }

    /// Create an assembler sized and configured from `config`.
    #[must_use]
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.buffer_capacity()).with_policy(config.oversize_policy())
    }

    /// Replace the oversize policy.
    #[must_use]
    pub fn with_policy(mut self, policy: OversizePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Route unsupported tags and truncations to `diagnostics`.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Advance assembly with whatever `source` holds right now.
    ///
    /// Returns `Some(packet)` when this call completed a packet; the state
    /// is then back to idle. Returns `None` when more bytes are needed, when
    /// an unsupported indicator byte was discarded, or while an oversized
    /// packet is being drained.
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use hci_bridge::assembler::Assembler;
    ///
    /// let mut assembler = Assembler::new(64);
    /// let mut source = BytesMut::from(&[0x01_u8][..]);
    /// assert!(assembler.step(&mut source).is_none());
    ///
    /// source.extend_from_slice(&[0x00, 0x00, 0x02, 0xaa, 0xbb]);
    /// let packet = assembler.step(&mut source).expect("packet completes");
    /// assert_eq!(packet.as_bytes(), &[0x01, 0x00, 0x00, 0x02, 0xaa, 0xbb]);
    /// ```
    pub fn step<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Option<Packet> {
        if matches!(self.phase, Phase::Draining { .. }) {
            self.drain(source);
            return None;
        }

        if !self.is_in_progress() {
            let kind = match self.pending_kind() {
                Some(kind) => kind,
                None => self.read_indicator(source)?,
            };
            if !self.read_preamble(kind, source) {
                return None;
            }
        }

        self.fill(source);
        self.take_complete()
    }

    /// Abandon any partial packet and return to the initial state.
    ///
    /// Returns the number of already consumed bytes that were dropped.
    pub fn reset(&mut self) -> usize {
        let dropped = match self.phase {
            Phase::Idle | Phase::Draining { .. } => 0,
            Phase::Preamble { have, .. } => 1 + have,
            Phase::Payload { .. } => self.received_len,
        };
        self.clear();
        dropped
    }

    /// Buffer size in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize { self.buffer.len() }

    /// Bytes required to complete the current packet, or zero.
    #[must_use]
    pub const fn expected_len(&self) -> usize { self.expected_len }

    /// Bytes of the current packet held in the buffer, or zero.
    #[must_use]
    pub const fn received_len(&self) -> usize { self.received_len }

    /// Whether the preamble has been read and payload is being collected.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool { matches!(self.phase, Phase::Payload { .. }) }

    /// Whether no byte of a future packet has been consumed.
    #[must_use]
    pub const fn is_idle(&self) -> bool { matches!(self.phase, Phase::Idle) }

    /// Whether the rest of an oversized packet is being dropped.
    #[must_use]
    pub const fn is_draining(&self) -> bool { matches!(self.phase, Phase::Draining { .. }) }

    /// Kind of the packet whose preamble is still awaited.
    #[must_use]
    pub const fn pending_kind(&self) -> Option<PacketKind> {
        match self.phase {
            Phase::Preamble { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Total bytes consumed from sources over the assembler's lifetime.
    ///
    /// Grows whenever a step makes progress, including discarded bytes.
    #[must_use]
    pub const fn consumed(&self) -> u64 { self.consumed }

    /// Active oversize policy.
    #[must_use]
    pub const fn policy(&self) -> OversizePolicy { self.policy }

    fn read_indicator<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Option<PacketKind> {
        if source.available() < 1 || source.read(&mut self.buffer[..1]) == 0 {
            return None;
        }
        self.consumed += 1;
        let tag = self.buffer[0];
        let Some(kind) = PacketKind::from_tag(tag) else {
            debug!("discarding unsupported packet indicator: tag={tag:#04x}");
            self.diagnostics.trace(LABEL_UNSUPPORTED, &[tag]);
            metrics::inc_unsupported_tags();
            return None;
        };
        self.phase = Phase::Preamble { kind, have: 0 };
        Some(kind)
    }

    /// Read the preamble once it is fully available and size the packet.
    ///
    /// Returns `true` when payload collection may start.
    fn read_preamble<S: ByteSource + ?Sized>(&mut self, kind: PacketKind, source: &mut S) -> bool {
        let preamble_len = kind.preamble_len();
        let Phase::Preamble { have, .. } = self.phase else {
            return false;
        };
        if source.available() < preamble_len - have {
            return false;
        }
        let read = source.read(&mut self.buffer[1 + have..=preamble_len]);
        self.consumed += read as u64;
        let have = have + read;
        if have < preamble_len {
            self.phase = Phase::Preamble { kind, have };
            return false;
        }

        let header_len = 1 + preamble_len;
        let total = header_len + kind.payload_len(&self.buffer[1..header_len]);
        let capacity = self.capacity();
        let truncated = total > capacity;
        if truncated {
            self.diagnostics
                .trace(LABEL_TRUNCATED, &self.buffer[..header_len]);
            match self.policy {
                OversizePolicy::Truncate => {
                    warn!(
                        "truncating oversized packet: kind={kind}, declared={total}, \
                         capacity={capacity}"
                    );
                    metrics::inc_truncated();
                }
                OversizePolicy::Discard => {
                    warn!(
                        "discarding oversized packet: kind={kind}, declared={total}, \
                         capacity={capacity}"
                    );
                    metrics::inc_discarded(DiscardReason::Oversized);
                    self.clear();
                    self.phase = Phase::Draining {
                        remaining: total - header_len,
                    };
                    self.drain(source);
                    return false;
                }
            }
        }

        self.expected_len = total.min(capacity);
        self.received_len = header_len;
        self.phase = Phase::Payload { kind, truncated };
        true
    }

    fn fill<S: ByteSource + ?Sized>(&mut self, source: &mut S) {
        if self.received_len == self.expected_len {
            return;
        }
        let read = source.read(&mut self.buffer[self.received_len..self.expected_len]);
        self.received_len += read;
        self.consumed += read as u64;
    }

    fn drain<S: ByteSource + ?Sized>(&mut self, source: &mut S) {
        let Phase::Draining { mut remaining } = self.phase else {
            return;
        };
        while remaining > 0 {
            let chunk = remaining.min(self.buffer.len());
            let read = source.read(&mut self.buffer[..chunk]);
            if read == 0 {
                break;
            }
            remaining -= read;
            self.consumed += read as u64;
        }
        self.phase = if remaining == 0 {
            Phase::Idle
        } else {
            Phase::Draining { remaining }
        };
    }

    fn take_complete(&mut self) -> Option<Packet> {
        let Phase::Payload { kind, truncated } = self.phase else {
            return None;
        };
        if self.received_len != self.expected_len {
            return None;
        }
        let bytes = Bytes::copy_from_slice(&self.buffer[..self.expected_len]);
        self.clear();
        Some(Packet::new(kind, bytes, truncated))
    }

    fn clear(&mut self) {
        self.expected_len = 0;
        self.received_len = 0;
        self.phase = Phase::Idle;
    }
}
