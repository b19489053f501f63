//! Serialised access to a transport used by both relay contexts.
//!
//! The host transport is read by one context and written by the other, and
//! its bookkeeping hook runs from both; the controller transport is likewise
//! split across directions. [`Shared`] wraps each in a mutex so every call
//! reaches the transport from exactly one context at a time. The helpers in
//! this module never hold two transport locks at once.

use std::{fmt, sync::PoisonError, time::Instant};

#[cfg(loom)]
use loom::sync::{Arc, Mutex};
#[cfg(not(loom))]
use std::sync::{Arc, Mutex};

use crate::{
    error::RelayError,
    pump::{DownstreamPump, Progress, UpstreamPump},
    transport::{ControllerTransport, HostTransport},
};

/// Cloneable handle granting exclusive, short-lived access to a transport.
pub struct Shared<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared").finish_non_exhaustive()
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Shared<T> {
    /// Wrap `value` for use from several contexts.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Run `f` with exclusive access to the wrapped value.
    ///
    /// A panic inside an earlier closure does not poison the handle; the
    /// transport is handed out as the panicking call left it.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

/// One iteration of the host to controller context.
///
/// Services the host, assembles from it while it is connected, then submits
/// any completed packet to the controller. The host lock is released before the controller lock
/// is taken.
///
/// # Errors
///
/// Returns the pump's error when the controller refused a packet.
pub fn poll_upstream_once<H, C>(
    pump: &mut UpstreamPump,
    host: &Shared<H>,
    controller: &Shared<C>,
) -> Result<Progress, RelayError<C::Error>>
where
    H: HostTransport,
    C: ControllerTransport,
{
    let now = Instant::now();
    let (packet, consumed_before) = host.with(|host| {
        host.service();
        let consumed_before = pump.assembler().consumed();
        (pump.poll_host_at(host, now), consumed_before)
    });
    match packet {
        Some(packet) => controller.with(|controller| pump.submit(&packet, controller)),
        None if pump.assembler().consumed() == consumed_before => Ok(Progress::Idle),
        None => Ok(Progress::Advanced),
    }
}

/// One iteration of the controller to host context.
///
/// Services the host, then relays at most one controller packet. The
/// controller lock is held only while reading; the host lock only while
/// servicing and writing.
///
/// # Errors
///
/// Returns the pump's error when the controller read failed or returned a
/// packet shorter than the transport header.
pub fn poll_downstream_once<H, C>(
    pump: &mut DownstreamPump,
    host: &Shared<H>,
    controller: &Shared<C>,
) -> Result<Progress, RelayError<C::Error>>
where
    H: HostTransport,
    C: ControllerTransport,
{
    host.with(|host| host.service());
    if pump.pending() > 0 {
        return Ok(host.with(|host| pump.flush_pending(host)));
    }
    let received = controller.with(|controller| pump.receive_from(controller))?;
    match received {
        None => Ok(Progress::Idle),
        Some(_) => Ok(host.with(|host| pump.deliver_received(host))),
    }
}
