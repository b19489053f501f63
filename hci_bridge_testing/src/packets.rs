//! Builders and strategies for H4 traffic.

use bytes::{BufMut, BytesMut};
use hci_bridge::{byte_order::write_le_u16, header::prepend_header};
use proptest::{
    collection::vec,
    prelude::{Strategy, any, prop_oneof},
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner},
};

/// Build an H4 command packet with `opcode` and `params`.
///
/// # Panics
///
/// Panics if `params` exceeds the 1-byte length field.
#[must_use]
pub fn command(opcode: u16, params: &[u8]) -> Vec<u8> {
    let len = u8::try_from(params.len()).expect("command parameters fit a u8 length");
    let mut buf = BytesMut::with_capacity(4 + params.len());
    buf.put_u8(0x01);
    buf.put_slice(&write_le_u16(opcode));
    buf.put_u8(len);
    buf.put_slice(params);
    buf.to_vec()
}

/// Build an H4 ACL packet for `handle` carrying `data`.
///
/// # Panics
///
/// Panics if `data` exceeds the 2-byte length field.
#[must_use]
pub fn acl(handle: u16, data: &[u8]) -> Vec<u8> {
    let len = u16::try_from(data.len()).expect("ACL data fits a u16 length");
    let mut buf = BytesMut::with_capacity(5 + data.len());
    buf.put_u8(0x02);
    buf.put_slice(&write_le_u16(handle));
    buf.put_slice(&write_le_u16(len));
    buf.put_slice(data);
    buf.to_vec()
}

/// Build an H4 SCO packet for `handle` carrying `data`.
///
/// # Panics
///
/// Panics if `data` exceeds the 1-byte length field.
#[must_use]
pub fn sco(handle: u16, data: &[u8]) -> Vec<u8> {
    let len = u8::try_from(data.len()).expect("SCO data fits a u8 length");
    let mut buf = BytesMut::with_capacity(4 + data.len());
    buf.put_u8(0x03);
    buf.put_slice(&write_le_u16(handle));
    buf.put_u8(len);
    buf.put_slice(data);
    buf.to_vec()
}

/// Prefix `packet` with the controller transport header.
#[must_use]
pub fn framed(packet: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    prepend_header(packet, &mut buf);
    buf.to_vec()
}

/// Split `bytes` into chunks whose sizes cycle through `sizes`.
///
/// Zero sizes are treated as one so every chunk carries at least one byte.
/// An empty `sizes` yields the whole input as a single chunk.
#[must_use]
pub fn chunked(bytes: &[u8], sizes: &[usize]) -> Vec<Vec<u8>> {
    if sizes.is_empty() {
        return vec![bytes.to_vec()];
    }
    let mut chunks = Vec::new();
    let mut rest = bytes;
    for size in sizes.iter().copied().cycle() {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(size.max(1).min(rest.len()));
        chunks.push(head.to_vec());
        rest = tail;
    }
    chunks
}

/// A proptest runner seeded identically on every run.
#[must_use]
pub fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

/// Well-formed packets of any supported kind with at most `max_payload`
/// payload bytes.
pub fn packet_strategy(max_payload: usize) -> impl Strategy<Value = Vec<u8>> {
    let short = max_payload.min(usize::from(u8::MAX));
    let long = max_payload.min(usize::from(u16::MAX));
    prop_oneof![
        (any::<u16>(), vec(any::<u8>(), 0..=short))
            .prop_map(|(opcode, params)| command(opcode, &params)),
        (any::<u16>(), vec(any::<u8>(), 0..=long)).prop_map(|(handle, data)| acl(handle, &data)),
        (any::<u16>(), vec(any::<u8>(), 0..=short)).prop_map(|(handle, data)| sco(handle, &data)),
    ]
}

/// Non-empty chunk size patterns between one and `max_chunk` bytes.
pub fn chunk_sizes_strategy(max_chunk: usize) -> impl Strategy<Value = Vec<usize>> {
    vec(1..=max_chunk.max(1), 1..8)
}
