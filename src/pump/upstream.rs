//! Host to controller relay.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::BytesMut;
use log::warn;

use super::Progress;
use crate::{
    assembler::Assembler,
    config::BridgeConfig,
    diagnostic::{DiagnosticSink, LABEL_TO_CONTROLLER, NoopDiagnostics},
    error::RelayError,
    header::{TRANSPORT_HEADER_LEN, prepend_header},
    metrics::{self, DiscardReason, Direction},
    packet::Packet,
    transport::{ByteSource, ControllerTransport, HostTransport},
};

/// Frames the host byte stream and submits packets to the controller.
///
/// Submission is all-or-nothing: when the controller refuses a packet it is
/// dropped, counted under
/// [`DiscardReason::WriteFailed`](crate::metrics::DiscardReason::WriteFailed),
/// and the error is returned. The next packet is unaffected.
pub struct UpstreamPump {
    assembler: Assembler,
    tx: BytesMut,
    stall_timeout: Option<Duration>,
    last_progress: Instant,
    last_consumed: u64,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl UpstreamPump {
    /// Create a pump using `config`'s buffer size, oversize policy, and stall
    /// timeout.
    #[must_use]
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            assembler: Assembler::from_config(config),
            tx: BytesMut::with_capacity(config.buffer_capacity() + TRANSPORT_HEADER_LEN),
            stall_timeout: config.stall_timeout(),
            last_progress: Instant::now(),
            last_consumed: 0,
            diagnostics: Arc::new(NoopDiagnostics),
        }
    }

    /// Trace relayed packets, unsupported tags, and truncations to `diagnostics`.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.assembler = self.assembler.with_diagnostics(Arc::clone(&diagnostics));
        self.diagnostics = diagnostics;
        self
    }

    /// Borrow the assembler driving this direction.
    #[must_use]
    pub fn assembler(&self) -> &Assembler { &self.assembler }

    /// Assemble from `host` and submit any completed packet to `controller`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Controller`] when the controller refused the
    /// packet; that packet has been dropped.
    pub fn step<H, C>(
        &mut self,
        host: &mut H,
        controller: &mut C,
    ) -> Result<Progress, RelayError<C::Error>>
    where
        H: HostTransport + ?Sized,
        C: ControllerTransport + ?Sized,
    {
        self.step_at(host, controller, Instant::now())
    }

    /// [`step`](Self::step) with an explicit clock reading for stall detection.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Controller`] when the controller refused the
    /// packet; that packet has been dropped.
    pub fn step_at<H, C>(
        &mut self,
        host: &mut H,
        controller: &mut C,
        now: Instant,
    ) -> Result<Progress, RelayError<C::Error>>
    where
        H: HostTransport + ?Sized,
        C: ControllerTransport + ?Sized,
    {
        let consumed_before = self.assembler.consumed();
        match self.poll_host_at(host, now) {
            Some(packet) => self.submit(&packet, controller),
            None if self.assembler.consumed() == consumed_before => Ok(Progress::Idle),
            None => Ok(Progress::Advanced),
        }
    }

    /// Assemble from `host` while it is connected.
    ///
    /// A detached host is left untouched: its bytes stay in the source and
    /// the stall clock does not run.
    pub fn poll_host_at<H>(&mut self, host: &mut H, now: Instant) -> Option<Packet>
    where
        H: HostTransport + ?Sized,
    {
        if !host.is_connected() {
            self.last_progress = now;
            return None;
        }
        self.assemble_at(host, now)
    }

    /// Run one assembler step against `host`, then abandon a stalled packet
    /// when a stall timeout is configured.
    ///
    /// The tail of a packet discarded as oversized is never purged, so late
    /// bytes of it cannot be mistaken for new packets.
    pub fn assemble_at<H>(&mut self, host: &mut H, now: Instant) -> Option<Packet>
    where
        H: ByteSource + ?Sized,
    {
        let packet = self.assembler.step(host);
        if self.assembler.consumed() != self.last_consumed {
            self.last_consumed = self.assembler.consumed();
            self.last_progress = now;
        } else if let Some(timeout) = self.stall_timeout
            && !self.assembler.is_idle()
            && !self.assembler.is_draining()
            && now.saturating_duration_since(self.last_progress) >= timeout
        {
            let dropped = self.assembler.reset();
            warn!(
                "abandoning stalled host packet: dropped={dropped} bytes, timeout={timeout:?}"
            );
            metrics::inc_discarded(DiscardReason::Stalled);
        }
        packet
    }

    /// Prepend the transport header to `packet` and submit it.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Controller`] when the controller refused the
    /// packet; it is not retried.
    pub fn submit<C>(
        &mut self,
        packet: &Packet,
        controller: &mut C,
    ) -> Result<Progress, RelayError<C::Error>>
    where
        C: ControllerTransport + ?Sized,
    {
        self.tx.clear();
        prepend_header(packet.as_bytes(), &mut self.tx);
        if let Err(err) = controller.write(&self.tx) {
            metrics::inc_discarded(DiscardReason::WriteFailed);
            return Err(RelayError::Controller(err));
        }
        self.diagnostics
            .trace(LABEL_TO_CONTROLLER, packet.as_bytes());
        metrics::inc_relayed(Direction::HostToController);
        Ok(Progress::Relayed { len: packet.len() })
    }
}
