#![doc(html_root_url = "https://docs.rs/hci_bridge/latest")]
//! Framing relay between an H4 host byte stream and an HCI controller channel.
//!
//! The host side speaks H4: an indicator byte followed by a command, ACL, or
//! SCO packet, delivered as an unframed stream. The controller side exchanges
//! whole packets behind a three byte transport header. The crate reassembles
//! host packets from arbitrary chunks, adds or strips the header, and runs
//! both directions concurrently.
//!
//! - [`assembler`] frames the host stream one packet at a time.
//! - [`pump`] drives a single direction with bounded, non-blocking steps.
//! - [`relay`] runs both directions on their own contexts.
//! - [`transport`] defines the seams to the host and controller drivers.

pub mod assembler;
pub mod byte_order;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod header;
pub mod metrics;
pub mod packet;
pub mod pump;
pub mod relay;
pub mod transport;

pub use assembler::{Assembler, OversizePolicy};
pub use config::{BridgeConfig, PollConfig};
pub use diagnostic::{DiagnosticSink, LogDiagnostics, NoopDiagnostics};
pub use error::{BridgeError, HeaderError, RelayError};
pub use packet::{Packet, PacketKind};
pub use pump::{DownstreamPump, Progress, UpstreamPump};
#[cfg(not(loom))]
pub use relay::Bridge;
pub use relay::Shared;
pub use transport::{ByteSource, ControllerTransport, HostTransport};
