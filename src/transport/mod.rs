//! Transport abstractions for both sides of the bridge.
//!
//! The bridge never owns a real device. Callers implement
//! [`HostTransport`] for the serial-like channel to the host stack and
//! [`ControllerTransport`] for the channel to the radio controller. Every
//! method is a non-blocking attempt; a transport with nothing to offer
//! reports zero bytes rather than waiting.

use std::collections::VecDeque;

use bytes::{Buf, BytesMut};

pub mod memory;

pub use memory::{MemoryController, MemoryControllerError, MemoryHost};

/// A non-blocking source of bytes for the assembler.
pub trait ByteSource {
    /// Number of bytes that can be read right now.
    fn available(&self) -> usize;

    /// Copy up to `buf.len()` bytes into `buf`, returning how many were read.
    ///
    /// Never blocks; returns `0` when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

/// Host-facing serial-like channel.
///
/// Reads are exposed through [`ByteSource`]. `service` is the transport's
/// own bookkeeping hook and is invoked from both relay contexts, which the
/// runtime serialises through [`Shared`](crate::relay::Shared).
pub trait HostTransport: ByteSource {
    /// Queue `buf` for the host, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> usize;

    /// Push queued output towards the host without waiting for more data.
    fn flush(&mut self);

    /// Run the transport's internal bookkeeping.
    fn service(&mut self) {}

    /// Whether a host is attached. Host bytes are left unread while it is not.
    fn is_connected(&self) -> bool { true }
}

/// Controller-facing packet channel.
///
/// Every buffer crossing this interface starts with the fixed
/// [transport header](crate::header::TRANSPORT_HEADER).
pub trait ControllerTransport {
    /// Error raised by the controller driver.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Submit one header-prefixed packet in full.
    ///
    /// # Errors
    ///
    /// Returns the driver's error when the packet was not accepted.
    fn write(&mut self, buf: &[u8]) -> Result<(), Self::Error>;

    /// Read at most one header-prefixed packet into `buf`.
    ///
    /// Returns `Ok(0)` when no packet is pending.
    ///
    /// # Errors
    ///
    /// Returns the driver's error when the read failed.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl ByteSource for BytesMut {
    fn available(&self) -> usize { self.len() }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.len());
        self.copy_to_slice(&mut buf[..n]);
        n
    }
}

impl ByteSource for VecDeque<u8> {
    fn available(&self) -> usize { self.len() }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.len());
        for (slot, byte) in buf.iter_mut().zip(self.drain(..n)) {
            *slot = byte;
        }
        n
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn available(&self) -> usize { (**self).available() }

    fn read(&mut self, buf: &mut [u8]) -> usize { (**self).read(buf) }
}
