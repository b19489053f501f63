//! Unit tests for the directional pumps.

use std::time::{Duration, Instant};

use rstest::{fixture, rstest};

use super::*;
use crate::{
    assembler::OversizePolicy,
    config::BridgeConfig,
    error::{HeaderError, RelayError},
    header::TRANSPORT_HEADER,
    transport::{ByteSource, MemoryController, MemoryControllerError, MemoryHost},
};

#[fixture]
fn config() -> BridgeConfig { BridgeConfig::new().with_buffer_capacity(64) }

fn framed(packet: &[u8]) -> Vec<u8> {
    let mut buf = TRANSPORT_HEADER.to_vec();
    buf.extend_from_slice(packet);
    buf
}

#[rstest]
fn upstream_prepends_header_to_each_packet(config: BridgeConfig) {
    let mut pump = UpstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    host.push_inbound(&[0x01, 0x03, 0x0c, 0x00, 0x01, 0x01, 0x10, 0x00]);

    let first = pump.step(&mut host, &mut controller).expect("submit succeeds");
    let second = pump.step(&mut host, &mut controller).expect("submit succeeds");
    let third = pump.step(&mut host, &mut controller).expect("nothing to do");

    assert_eq!(first, Progress::Relayed { len: 4 });
    assert_eq!(second, Progress::Relayed { len: 4 });
    assert_eq!(third, Progress::Idle);
    assert_eq!(
        controller.take_submitted(),
        vec![
            framed(&[0x01, 0x03, 0x0c, 0x00]),
            framed(&[0x01, 0x01, 0x10, 0x00])
        ]
    );
}

#[rstest]
fn upstream_reports_partial_progress(config: BridgeConfig) {
    let mut pump = UpstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    host.push_inbound(&[0x02, 0x01, 0x00, 0x02, 0x00, 0xaa]);

    let progress = pump.step(&mut host, &mut controller).expect("no submission yet");

    assert_eq!(progress, Progress::Advanced);
    assert!(controller.submitted().is_empty());
    assert!(pump.assembler().is_in_progress());
}

#[rstest]
fn upstream_drops_packet_refused_by_controller(config: BridgeConfig) {
    let mut pump = UpstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    host.push_inbound(&[0x01, 0x03, 0x0c, 0x00]);
    controller.set_reject_writes(true);

    let err = pump
        .step(&mut host, &mut controller)
        .expect_err("controller refuses the packet");
    assert!(matches!(
        err,
        RelayError::Controller(MemoryControllerError::Rejected { len: 7 })
    ));

    controller.set_reject_writes(false);
    host.push_inbound(&[0x03, 0x01, 0x00, 0x00]);
    let progress = pump.step(&mut host, &mut controller).expect("next packet relays");

    assert_eq!(progress, Progress::Relayed { len: 4 });
    assert_eq!(
        controller.take_submitted(),
        vec![framed(&[0x03, 0x01, 0x00, 0x00])]
    );
}

#[test]
fn stalled_partial_packet_is_abandoned_after_timeout() {
    let config = BridgeConfig::new()
        .with_buffer_capacity(64)
        .with_stall_timeout(Some(Duration::from_millis(50)));
    let mut pump = UpstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    let start = Instant::now();
    host.push_inbound(&[0x01, 0x03]);

    pump.step_at(&mut host, &mut controller, start)
        .expect("partial preamble");
    pump.step_at(&mut host, &mut controller, start + Duration::from_millis(10))
        .expect("still waiting");
    assert_eq!(
        pump.assembler().pending_kind(),
        Some(crate::packet::PacketKind::Command)
    );

    pump.step_at(&mut host, &mut controller, start + Duration::from_millis(60))
        .expect("stall purge is not an error");
    assert!(pump.assembler().is_idle());
}

#[rstest]
fn without_timeout_partial_packet_waits_forever(config: BridgeConfig) {
    let mut pump = UpstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    let start = Instant::now();
    host.push_inbound(&[0x01]);

    pump.step_at(&mut host, &mut controller, start)
        .expect("partial packet");
    pump.step_at(&mut host, &mut controller, start + Duration::from_secs(3600))
        .expect("still waiting");

    assert!(!pump.assembler().is_idle());
}

#[rstest]
fn downstream_strips_header_and_flushes(config: BridgeConfig) {
    let mut pump = DownstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    controller.push_packet(framed(&[0x04, 0x0e, 0x04, 0x01, 0x03, 0x0c, 0x00]));

    let progress = pump.step(&mut controller, &mut host).expect("relay succeeds");

    assert_eq!(progress, Progress::Relayed { len: 7 });
    assert_eq!(host.outbound(), &[0x04, 0x0e, 0x04, 0x01, 0x03, 0x0c, 0x00]);
    assert_eq!(host.flush_count(), 1);
}

#[rstest]
fn downstream_header_only_packet_forwards_nothing(config: BridgeConfig) {
    let mut pump = DownstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    controller.push_packet(TRANSPORT_HEADER.to_vec());

    let progress = pump.step(&mut controller, &mut host).expect("no underflow");

    assert_eq!(progress, Progress::Relayed { len: 0 });
    assert!(host.outbound().is_empty());
    assert_eq!(host.flush_count(), 0);
}

#[rstest]
#[case::one_byte(vec![0])]
#[case::two_bytes(vec![0, 0])]
fn downstream_rejects_packets_shorter_than_header(
    config: BridgeConfig,
    #[case] packet: Vec<u8>,
) {
    let mut pump = DownstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    let len = packet.len();
    controller.push_packet(packet);
    controller.push_packet(framed(&[0x04, 0x05]));

    let err = pump
        .step(&mut controller, &mut host)
        .expect_err("short packet is rejected");
    assert!(matches!(
        err,
        RelayError::Header(HeaderError::Underflow { len: l }) if l == len
    ));

    let progress = pump.step(&mut controller, &mut host).expect("next packet relays");
    assert_eq!(progress, Progress::Relayed { len: 2 });
    assert_eq!(host.outbound(), &[0x04, 0x05]);
}

#[rstest]
fn empty_controller_read_is_idle(config: BridgeConfig) {
    let mut pump = DownstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();

    assert_eq!(
        pump.step(&mut controller, &mut host).expect("idle"),
        Progress::Idle
    );
}

#[rstest]
fn downstream_retries_partial_host_writes_in_order(config: BridgeConfig) {
    let mut pump = DownstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    host.set_write_window(Some(3));
    controller.push_packet(framed(&[1, 2, 3, 4, 5, 6, 7]));
    controller.push_packet(framed(&[8, 9]));

    let mut progress = Vec::new();
    for _ in 0..4 {
        progress.push(pump.step(&mut controller, &mut host).expect("relay succeeds"));
    }

    assert_eq!(
        progress,
        vec![
            Progress::Advanced,
            Progress::Advanced,
            Progress::Relayed { len: 7 },
            Progress::Relayed { len: 2 },
        ]
    );
    assert_eq!(host.outbound(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(host.flush_count(), 4);
    assert_eq!(pump.pending(), 0);
}

#[rstest]
fn blocked_host_keeps_controller_packets_queued(config: BridgeConfig) {
    let mut pump = DownstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    host.set_write_window(Some(0));
    controller.push_packet(framed(&[1, 2]));
    controller.push_packet(framed(&[3]));

    assert_eq!(
        pump.step(&mut controller, &mut host).expect("read succeeds"),
        Progress::Advanced
    );
    assert_eq!(
        pump.step(&mut controller, &mut host).expect("host still blocked"),
        Progress::Idle
    );
    assert_eq!(controller.pending_len(), 1);
    assert_eq!(pump.pending(), 2);

    host.set_write_window(None);
    pump.step(&mut controller, &mut host).expect("tail delivered");
    pump.step(&mut controller, &mut host).expect("next packet delivered");
    assert_eq!(host.outbound(), &[1, 2, 3]);
}

#[rstest]
fn detached_host_bytes_wait_for_reconnect(config: BridgeConfig) {
    let mut pump = UpstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    host.set_connected(false);
    host.push_inbound(&[0x01, 0x03, 0x0c, 0x00]);

    let progress = pump.step(&mut host, &mut controller).expect("nothing submitted");

    assert_eq!(progress, Progress::Idle);
    assert_eq!(host.available(), 4);
    assert!(pump.assembler().is_idle());
    assert_eq!(pump.assembler().consumed(), 0);

    host.set_connected(true);
    let progress = pump.step(&mut host, &mut controller).expect("packet relays");

    assert_eq!(progress, Progress::Relayed { len: 4 });
    assert_eq!(
        controller.take_submitted(),
        vec![framed(&[0x01, 0x03, 0x0c, 0x00])]
    );
}

#[test]
fn stall_timeout_spares_the_tail_of_a_discarded_packet() {
    let config = BridgeConfig::new()
        .with_buffer_capacity(16)
        .with_oversize_policy(OversizePolicy::Discard)
        .with_stall_timeout(Some(Duration::from_millis(50)));
    let mut pump = UpstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    let start = Instant::now();
    host.push_inbound(&[0x02, 0x01, 0x00, 0x20, 0x00]);
    host.push_inbound(&[0x01; 10]);

    pump.step_at(&mut host, &mut controller, start)
        .expect("oversized packet dropped");
    pump.step_at(&mut host, &mut controller, start + Duration::from_millis(60))
        .expect("drain waits for the tail");
    assert!(pump.assembler().is_draining());

    host.push_inbound(&[0x01; 22]);
    host.push_inbound(&[0x01, 0x03, 0x0c, 0x00]);
    let mut progress = Vec::new();
    for offset in [70, 80, 90] {
        progress.push(
            pump.step_at(
                &mut host,
                &mut controller,
                start + Duration::from_millis(offset),
            )
            .expect("no controller error"),
        );
    }

    assert_eq!(
        progress,
        vec![
            Progress::Advanced,
            Progress::Relayed { len: 4 },
            Progress::Idle
        ]
    );
    assert_eq!(
        controller.take_submitted(),
        vec![framed(&[0x01, 0x03, 0x0c, 0x00])]
    );
}

#[rstest]
fn oversized_controller_packet_does_not_block_later_packets(config: BridgeConfig) {
    let mut pump = DownstreamPump::new(&config);
    let mut host = MemoryHost::new();
    let mut controller = MemoryController::new();
    controller.push_packet(framed(&[0xee; 80]));
    controller.push_packet(framed(&[0x04, 0x05]));

    let err = pump
        .step(&mut controller, &mut host)
        .expect_err("packet exceeds the read buffer");
    assert!(matches!(
        err,
        RelayError::Controller(MemoryControllerError::PacketTooLarge { len: 83, .. })
    ));

    let progress = pump.step(&mut controller, &mut host).expect("next packet relays");
    assert_eq!(progress, Progress::Relayed { len: 2 });
    assert_eq!(host.outbound(), &[0x04, 0x05]);
}
