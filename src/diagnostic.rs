//! Optional human-readable trace channel.
//!
//! The relay reports unsupported tags, truncations, and every relayed packet
//! through a [`DiagnosticSink`]. The default sink does nothing, so tracing
//! never alters timing when disabled.

use std::fmt::Write as _;

use log::{Level, debug, log_enabled};

/// Label used when an unsupported indicator byte is discarded.
pub const LABEL_UNSUPPORTED: &str = "Unsupported: ";
/// Label used for packets relayed from the host to the controller.
pub const LABEL_TO_CONTROLLER: &str = "> ";
/// Label used for packets relayed from the controller to the host.
pub const LABEL_TO_HOST: &str = "< ";
/// Label used when an oversized packet is cut to the buffer capacity.
pub const LABEL_TRUNCATED: &str = "Truncated: ";

/// Log target used by [`LogDiagnostics`].
pub const TRACE_TARGET: &str = "hci_bridge::trace";

const BYTES_PER_LINE: usize = 16;

/// Receiver for `(label, bytes)` trace events.
///
/// Implementations must return promptly and must not block.
pub trait DiagnosticSink: Send + Sync {
    /// Record `bytes` under `label`.
    fn trace(&self, label: &str, bytes: &[u8]);
}

/// Sink that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDiagnostics;

impl DiagnosticSink for NoopDiagnostics {
    fn trace(&self, _label: &str, _bytes: &[u8]) {}
}

/// Sink that hex-dumps events through the `log` facade.
///
/// Each line carries the label followed by up to sixteen bytes, so long
/// packets span several records.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn trace(&self, label: &str, bytes: &[u8]) {
        if !log_enabled!(target: TRACE_TARGET, Level::Debug) {
            return;
        }
        for line in hex_lines(label, bytes) {
            debug!(target: TRACE_TARGET, "{line}");
        }
    }
}

/// Format `bytes` as labelled hex lines of at most sixteen bytes each.
///
/// An empty slice produces a single line holding only the label.
///
/// ```
/// use hci_bridge::diagnostic::hex_lines;
///
/// assert_eq!(hex_lines("> ", &[0x01, 0x03, 0x0c, 0x00]), vec!["> 01 03 0C 00"]);
/// ```
#[must_use]
pub fn hex_lines(label: &str, bytes: &[u8]) -> Vec<String> {
    if bytes.is_empty() {
        return vec![label.trim_end().to_owned()];
    }
    bytes
        .chunks(BYTES_PER_LINE)
        .map(|chunk| {
            let mut line = String::with_capacity(label.len() + chunk.len() * 3);
            line.push_str(label);
            for (i, byte) in chunk.iter().enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                let _ = write!(line, "{byte:02X}");
            }
            line
        })
        .collect()
}
