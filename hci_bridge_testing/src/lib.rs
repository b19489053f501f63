//! Test utilities for `hci_bridge`.
//!
//! Builders for well-formed H4 packets, helpers that split a byte stream
//! into arbitrary chunks, deterministic proptest strategies, and a fixture
//! serialising access to the global [`logtest::Logger`].
//!
//! ```rust
//! use hci_bridge_testing::{chunked, command};
//!
//! let reset = command(0x0c03, &[]);
//! assert_eq!(reset, [0x01, 0x03, 0x0c, 0x00]);
//! assert_eq!(chunked(&reset, &[3, 1]), vec![vec![0x01, 0x03, 0x0c], vec![0x00]]);
//! ```

pub mod logging;
pub mod packets;

pub use logging::{LoggerHandle, logger};
pub use packets::{
    acl,
    chunk_sizes_strategy,
    chunked,
    command,
    deterministic_runner,
    framed,
    packet_strategy,
    sco,
};
