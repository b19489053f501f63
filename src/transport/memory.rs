//! In-memory transports for tests and demos.
//!
//! [`MemoryHost`] models the serial-like host channel as a pair of byte
//! queues. [`MemoryController`] models the controller driver as a queue of
//! header-prefixed packets in each direction. Both can be told to misbehave
//! (short writes, failed submissions) so relay policies can be exercised.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use thiserror::Error;

use super::{ByteSource, ControllerTransport, HostTransport};

/// Host channel backed by in-memory queues.
#[derive(Debug, Default)]
pub struct MemoryHost {
    inbound: BytesMut,
    outbound: BytesMut,
    write_window: Option<usize>,
    disconnected: bool,
    flushes: usize,
    services: usize,
}

impl MemoryHost {
    /// Create an empty host channel.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Make `bytes` available to the bridge as if the host had sent them.
    pub fn push_inbound(&mut self, bytes: &[u8]) { self.inbound.extend_from_slice(bytes); }

    /// Take everything the bridge has written towards the host so far.
    pub fn take_outbound(&mut self) -> Bytes { self.outbound.split().freeze() }

    /// Bytes written towards the host and not yet taken.
    #[must_use]
    pub fn outbound(&self) -> &[u8] { &self.outbound }

    /// Limit how many bytes a single `write` accepts; `None` accepts all.
    pub fn set_write_window(&mut self, window: Option<usize>) { self.write_window = window; }

    /// Attach (`true`) or detach (`false`) the simulated host.
    pub fn set_connected(&mut self, connected: bool) { self.disconnected = !connected; }

    /// Number of times the bridge flushed the channel.
    #[must_use]
    pub fn flush_count(&self) -> usize { self.flushes }

    /// Number of times the bridge serviced the channel.
    #[must_use]
    pub fn service_count(&self) -> usize { self.services }
}

impl ByteSource for MemoryHost {
    fn available(&self) -> usize { self.inbound.available() }

    fn read(&mut self, buf: &mut [u8]) -> usize { self.inbound.read(buf) }
}

impl HostTransport for MemoryHost {
    fn write(&mut self, buf: &[u8]) -> usize {
        let n = self.write_window.map_or(buf.len(), |w| w.min(buf.len()));
        self.outbound.extend_from_slice(&buf[..n]);
        n
    }

    fn flush(&mut self) { self.flushes += 1; }

    fn is_connected(&self) -> bool { !self.disconnected }

    fn service(&mut self) { self.services += 1; }
}

/// Errors raised by [`MemoryController`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MemoryControllerError {
    /// The controller was configured to reject submissions.
    #[error("controller rejected a {len} byte packet")]
    Rejected {
        /// Length of the refused buffer.
        len: usize,
    },

    /// A pending packet did not fit the caller's read buffer and was dropped.
    #[error("pending packet of {len} bytes exceeds read buffer of {capacity}")]
    PacketTooLarge {
        /// Length of the pending packet.
        len: usize,
        /// Size of the caller's buffer.
        capacity: usize,
    },
}

/// Controller driver backed by in-memory packet queues.
#[derive(Debug, Default)]
pub struct MemoryController {
    pending: VecDeque<Bytes>,
    submitted: Vec<Bytes>,
    reject_writes: bool,
}

impl MemoryController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Queue a header-prefixed packet for the bridge to read.
    pub fn push_packet(&mut self, packet: impl Into<Bytes>) { self.pending.push_back(packet.into()); }

    /// Take every header-prefixed packet the bridge submitted so far.
    pub fn take_submitted(&mut self) -> Vec<Bytes> { std::mem::take(&mut self.submitted) }

    /// Packets submitted and not yet taken.
    #[must_use]
    pub fn submitted(&self) -> &[Bytes] { &self.submitted }

    /// Number of packets still waiting to be read by the bridge.
    #[must_use]
    pub fn pending_len(&self) -> usize { self.pending.len() }

    /// Refuse (`true`) or accept (`false`) subsequent submissions.
    pub fn set_reject_writes(&mut self, reject: bool) { self.reject_writes = reject; }
}

impl ControllerTransport for MemoryController {
    type Error = MemoryControllerError;

    fn write(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        if self.reject_writes {
            return Err(MemoryControllerError::Rejected { len: buf.len() });
        }
        self.submitted.push(Bytes::copy_from_slice(buf));
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some(packet) = self.pending.pop_front() else {
            return Ok(0);
        };
        let len = packet.len();
        if len > buf.len() {
            return Err(MemoryControllerError::PacketTooLarge {
                len,
                capacity: buf.len(),
            });
        }
        buf[..len].copy_from_slice(&packet);
        Ok(len)
    }
}
