//! Controller to host relay.

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use log::debug;

use super::Progress;
use crate::{
    config::BridgeConfig,
    diagnostic::{DiagnosticSink, LABEL_TO_HOST, NoopDiagnostics},
    error::RelayError,
    header::{TRANSPORT_HEADER_LEN, strip_header},
    metrics::{self, DiscardReason, Direction},
    transport::{ControllerTransport, HostTransport},
};

/// Strips the transport header from controller packets and writes them to
/// the host.
///
/// The host may accept only part of a write. The unaccepted tail is kept and
/// delivered by later steps before any further controller packet is read, so
/// the host sees every packet byte-exact and in order.
pub struct DownstreamPump {
    rx: Box<[u8]>,
    pending: BytesMut,
    pending_len: usize,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl DownstreamPump {
    /// Create a pump able to read controller packets of up to
    /// `config.buffer_capacity()` bytes after the header.
    #[must_use]
    pub fn new(config: &BridgeConfig) -> Self {
        let capacity = config.buffer_capacity() + TRANSPORT_HEADER_LEN;
        Self {
            rx: vec![0; capacity].into_boxed_slice(),
            pending: BytesMut::with_capacity(capacity),
            pending_len: 0,
            diagnostics: Arc::new(NoopDiagnostics),
        }
    }

    /// Trace relayed packets to `diagnostics`.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Bytes of the current packet still waiting for the host.
    #[must_use]
    pub fn pending(&self) -> usize { self.pending.len() }

    /// Relay at most one controller packet to `host`.
    ///
    /// While part of an earlier packet is still pending, only that tail is
    /// offered to the host and the controller is not read.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Controller`] when the controller read failed and
    /// [`RelayError::Header`] when a packet was too short to carry the
    /// transport header; such a packet is dropped.
    pub fn step<C, H>(
        &mut self,
        controller: &mut C,
        host: &mut H,
    ) -> Result<Progress, RelayError<C::Error>>
    where
        C: ControllerTransport + ?Sized,
        H: HostTransport + ?Sized,
    {
        if !self.pending.is_empty() {
            return Ok(self.flush_pending(host));
        }
        match self.receive_from(controller)? {
            None => Ok(Progress::Idle),
            Some(_) => Ok(self.deliver_received(host)),
        }
    }

    /// Read one packet from `controller` and queue it for the host.
    ///
    /// Returns the packet length without the header, or `None` when the
    /// controller had nothing pending. Must only be called with nothing
    /// [pending](Self::pending).
    ///
    /// # Errors
    ///
    /// See [`step`](Self::step).
    pub fn receive_from<C>(
        &mut self,
        controller: &mut C,
    ) -> Result<Option<usize>, RelayError<C::Error>>
    where
        C: ControllerTransport + ?Sized,
    {
        debug_assert!(self.pending.is_empty(), "previous packet not delivered");
        let len = controller
            .read(&mut self.rx)
            .map_err(RelayError::Controller)?;
        if len == 0 {
            return Ok(None);
        }
        let packet = match strip_header(&self.rx[..len.min(self.rx.len())]) {
            Ok(packet) => packet,
            Err(err) => {
                metrics::inc_discarded(DiscardReason::HeaderUnderflow);
                return Err(err.into());
            }
        };
        self.diagnostics.trace(LABEL_TO_HOST, packet);
        self.pending.extend_from_slice(packet);
        self.pending_len = packet.len();
        Ok(Some(packet.len()))
    }

    /// Offer a freshly received packet to the host.
    ///
    /// A header-only packet completes without touching the host. Reading the
    /// packet counts as progress even when the host accepted nothing.
    pub fn deliver_received<H>(&mut self, host: &mut H) -> Progress
    where
        H: HostTransport + ?Sized,
    {
        if self.pending.is_empty() {
            metrics::inc_relayed(Direction::ControllerToHost);
            return Progress::Relayed { len: 0 };
        }
        match self.flush_pending(host) {
            Progress::Idle => Progress::Advanced,
            progress => progress,
        }
    }

    /// Offer the pending bytes to the host, flushing when any were accepted.
    pub fn flush_pending<H>(&mut self, host: &mut H) -> Progress
    where
        H: HostTransport + ?Sized,
    {
        let written = host.write(&self.pending).min(self.pending.len());
        if written == 0 {
            return Progress::Idle;
        }
        host.flush();
        self.pending.advance(written);
        if !self.pending.is_empty() {
            debug!(
                "host accepted partial write: written={written}, remaining={}",
                self.pending.len()
            );
            return Progress::Advanced;
        }
        metrics::inc_relayed(Direction::ControllerToHost);
        Progress::Relayed {
            len: self.pending_len,
        }
    }
}
