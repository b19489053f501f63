//! Concurrent relay contexts.
//!
//! Each direction runs its own polling loop: service the host transport,
//! attempt one pump step, then yield or sleep according to
//! [`PollConfig`](crate::config::PollConfig). The pumps own their buffers;
//! only the transports are shared, through [`Shared`].

#[cfg(not(loom))]
mod runtime;
mod shared;

#[cfg(not(loom))]
pub use runtime::Bridge;
pub use shared::{Shared, poll_downstream_once, poll_upstream_once};
