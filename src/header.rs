//! Controller transport header translation.
//!
//! The controller driver expects every packet to be preceded by a fixed
//! three-byte header reserved for its own lower layer, and returns packets
//! carrying the same header. The bridge adds it on the way in and strips it
//! on the way out.

use bytes::BufMut;

use crate::error::HeaderError;

/// Length of the controller transport header.
pub const TRANSPORT_HEADER_LEN: usize = 3;

/// Header bytes prepended to every packet submitted to the controller.
pub const TRANSPORT_HEADER: [u8; TRANSPORT_HEADER_LEN] = [0; TRANSPORT_HEADER_LEN];

/// Write the transport header followed by `packet` into `out`.
///
/// ```
/// use bytes::BytesMut;
/// use hci_bridge::header::prepend_header;
///
/// let mut out = BytesMut::new();
/// prepend_header(&[0x01, 0x03, 0x0c, 0x00], &mut out);
/// assert_eq!(&out[..], &[0, 0, 0, 0x01, 0x03, 0x0c, 0x00]);
/// ```
pub fn prepend_header<B: BufMut>(packet: &[u8], out: &mut B) {
    out.put_slice(&TRANSPORT_HEADER);
    out.put_slice(packet);
}

/// Borrow the packet following the transport header.
///
/// A buffer holding only the header yields an empty packet.
///
/// # Errors
///
/// Returns [`HeaderError::Underflow`] when `buf` is shorter than the header.
///
/// ```
/// use hci_bridge::header::strip_header;
///
/// assert_eq!(strip_header(&[0, 0, 0, 0x04, 0x0e]).unwrap(), &[0x04, 0x0e]);
/// assert!(strip_header(&[0, 0]).is_err());
/// ```
pub fn strip_header(buf: &[u8]) -> Result<&[u8], HeaderError> {
    buf.get(TRANSPORT_HEADER_LEN..)
        .ok_or(HeaderError::Underflow { len: buf.len() })
}
