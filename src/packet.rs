//! H4 packet kinds and the assembled [`Packet`] value.
//!
//! The host side speaks the UART (H4) encoding: a single packet indicator
//! byte followed by the HCI packet. Only the indicator and the length field
//! inside the preamble are ever interpreted; everything else is relayed
//! verbatim.

use std::fmt;

use bytes::Bytes;

use crate::byte_order::read_le_u16;

/// Longest preamble of any supported kind.
pub const MAX_PREAMBLE_LEN: usize = 4;

/// Packet indicator values accepted from the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// HCI command: opcode (2 bytes) and a 1-byte parameter length.
    Command,
    /// HCI ACL data: handle and flags (2 bytes) and a 2-byte data length.
    Acl,
    /// HCI synchronous data: handle and flags (2 bytes) and a 1-byte length.
    Sco,
}

impl PacketKind {
    /// Map an indicator byte to a supported kind.
    ///
    /// Returns `None` for any tag outside the closed set.
    ///
    /// ```
    /// use hci_bridge::packet::PacketKind;
    ///
    /// assert_eq!(PacketKind::from_tag(0x02), Some(PacketKind::Acl));
    /// assert_eq!(PacketKind::from_tag(0x04), None);
    /// ```
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::Command),
            0x02 => Some(Self::Acl),
            0x03 => Some(Self::Sco),
            _ => None,
        }
    }

    /// The indicator byte for this kind.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Command => 0x01,
            Self::Acl => 0x02,
            Self::Sco => 0x03,
        }
    }

    /// Number of preamble bytes that follow the indicator.
    #[must_use]
    pub const fn preamble_len(self) -> usize {
        match self {
            Self::Command | Self::Sco => 3,
            Self::Acl => 4,
        }
    }

    /// Decode the payload length carried by `preamble`.
    ///
    /// `preamble` must hold at least [`preamble_len`](Self::preamble_len)
    /// bytes; only the length field is read.
    ///
    /// ```
    /// use hci_bridge::packet::PacketKind;
    ///
    /// assert_eq!(PacketKind::Command.payload_len(&[0x03, 0x0c, 0x00]), 0);
    /// assert_eq!(PacketKind::Acl.payload_len(&[0x10, 0x00, 0x00, 0x02]), 512);
    /// ```
    #[must_use]
    pub fn payload_len(self, preamble: &[u8]) -> usize {
        match self {
            Self::Command | Self::Sco => usize::from(preamble[2]),
            Self::Acl => usize::from(read_le_u16([preamble[2], preamble[3]])),
        }
    }

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Acl => "acl",
            Self::Sco => "sco",
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", self.as_str(), self.tag())
    }
}

/// A complete packet handed off by the assembler.
///
/// The bytes include the indicator, preamble, and payload exactly as they
/// appeared on the wire, unless [`is_truncated`](Self::is_truncated)
/// reports that the declared length exceeded the assembly buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    kind: PacketKind,
    bytes: Bytes,
    truncated: bool,
}

impl Packet {
    pub(crate) fn new(kind: PacketKind, bytes: Bytes, truncated: bool) -> Self {
        Self {
            kind,
            bytes,
            truncated,
        }
    }

    /// Kind decoded from the indicator byte.
    #[must_use]
    pub const fn kind(&self) -> PacketKind { self.kind }

    /// Borrow the on-wire bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    /// Consume the packet, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.bytes }

    /// Total length including the indicator byte.
    #[must_use]
    pub fn len(&self) -> usize { self.bytes.len() }

    /// Always `false`: a packet holds at least its indicator byte.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// Whether the declared length did not fit and the tail was cut off.
    #[must_use]
    pub const fn is_truncated(&self) -> bool { self.truncated }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] { &self.bytes }
}
