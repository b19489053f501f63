//! Runs the bridge against an in-memory controller that answers every
//! command with a Command Complete event.
//!
//! Traffic is hex-dumped through `tracing`, and the relay counters are
//! rendered in Prometheus text format before exiting.

use std::{sync::Arc, time::Duration};

use hci_bridge::{
    Bridge,
    BridgeConfig,
    LogDiagnostics,
    transport::{MemoryController, MemoryHost},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::oneshot;
use tracing::info;

/// Build a framed Command Complete event for the command in `submitted`.
fn command_complete(submitted: &[u8]) -> Option<Vec<u8>> {
    // header, indicator, opcode (2), length
    let opcode = submitted.get(4..6)?;
    let mut event = vec![0, 0, 0, 0x04, 0x0e, 0x04, 0x01];
    event.extend_from_slice(opcode);
    event.push(0x00);
    Some(event)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();
    let prometheus = PrometheusBuilder::new().install_recorder()?;

    let bridge = Bridge::new(MemoryHost::new(), MemoryController::new())
        .with_config(BridgeConfig::new().with_stall_timeout(Some(Duration::from_secs(1))))
        .with_diagnostics(Arc::new(LogDiagnostics));
    let host = bridge.host();
    let controller = bridge.controller();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(bridge.run_with_shutdown(async {
        let _ = stop_rx.await;
    }));

    // HCI_Reset, an unsupported byte, then HCI_Read_Local_Version_Information.
    host.with(|host| host.push_inbound(&[0x01, 0x03, 0x0c, 0x00, 0x7f, 0x01, 0x01, 0x10, 0x00]));

    let mut answered = 0;
    while answered < 2 {
        let submitted = controller.with(MemoryController::take_submitted);
        for packet in submitted {
            if let Some(event) = command_complete(&packet) {
                controller.with(|controller| controller.push_packet(event));
                answered += 1;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    while host.with(|host| host.outbound().len()) < 14 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let _ = stop_tx.send(());
    run.await??;

    let events = host.with(MemoryHost::take_outbound);
    info!(len = events.len(), "host received events");
    prometheus.run_upkeep();
    println!("{}", prometheus.render());
    Ok(())
}
