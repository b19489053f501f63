//! Helpers for explicit HCI byte-order conversions.
//!
//! HCI length and handle fields are little-endian on the wire. These helpers
//! keep Clippy expectations scoped to the conversion points so framing code
//! can stay explicit about endianness without repeating lint annotations.

/// Serialise a `u16` in HCI byte order (little-endian).
///
/// # Examples
///
/// ```
/// use hci_bridge::byte_order::write_le_u16;
///
/// assert_eq!(write_le_u16(0x0c03), [0x03, 0x0c]);
/// ```
#[must_use]
pub fn write_le_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "HCI length fields are little-endian."
    )]
    value.to_le_bytes()
}

/// Parse an HCI-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use hci_bridge::byte_order::read_le_u16;
///
/// assert_eq!(read_le_u16([0x00, 0x02]), 512);
/// ```
#[must_use]
pub fn read_le_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "HCI length fields are little-endian."
    )]
    u16::from_le_bytes(bytes)
}
