#![cfg(all(feature = "advanced-tests", not(loom)))]
//! Property-based fuzzing of interleaved relay steps.
//!
//! Random schedules of host arrivals, controller arrivals, host write
//! windows, and upstream/downstream steps must still deliver every packet
//! byte-exact and in order in both directions.

use hci_bridge::{
    BridgeConfig,
    DownstreamPump,
    UpstreamPump,
    transport::{MemoryController, MemoryHost},
};
use hci_bridge_testing::{framed, packet_strategy};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Action {
    HostBytes(usize),
    ControllerPacket,
    Window(Option<usize>),
    Upstream,
    Downstream,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (1usize..32).prop_map(Action::HostBytes),
        Just(Action::ControllerPacket),
        proptest::option::of(0usize..8).prop_map(Action::Window),
        Just(Action::Upstream),
        Just(Action::Downstream),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn interleaved_steps_preserve_both_streams(
        host_packets in proptest::collection::vec(packet_strategy(40), 1..6),
        controller_packets in proptest::collection::vec(packet_strategy(40), 1..6),
        actions in proptest::collection::vec(action_strategy(), 0..64),
    ) {
        let config = BridgeConfig::new().with_buffer_capacity(64);
        let mut upstream = UpstreamPump::new(&config);
        let mut downstream = DownstreamPump::new(&config);
        let mut host = MemoryHost::new();
        let mut controller = MemoryController::new();

        let stream = host_packets.concat();
        let mut offset = 0;
        let mut queued = controller_packets.iter();

        for action in actions {
            match action {
                Action::HostBytes(n) => {
                    let end = (offset + n).min(stream.len());
                    host.push_inbound(&stream[offset..end]);
                    offset = end;
                }
                Action::ControllerPacket => {
                    if let Some(packet) = queued.next() {
                        controller.push_packet(framed(packet));
                    }
                }
                Action::Window(window) => host.set_write_window(window),
                Action::Upstream => {
                    upstream.step(&mut host, &mut controller).expect("controller accepts");
                }
                Action::Downstream => {
                    downstream.step(&mut controller, &mut host).expect("well-formed packets");
                }
            }
        }

        host.push_inbound(&stream[offset..]);
        for packet in queued {
            controller.push_packet(framed(packet));
        }
        host.set_write_window(None);
        for _ in 0..(host_packets.len() + controller_packets.len()) * 4 + 8 {
            upstream.step(&mut host, &mut controller).expect("controller accepts");
            downstream.step(&mut controller, &mut host).expect("well-formed packets");
        }

        let expected_up: Vec<Vec<u8>> = host_packets.iter().map(|p| framed(p)).collect();
        prop_assert_eq!(controller.take_submitted(), expected_up);
        prop_assert_eq!(host.outbound(), controller_packets.concat().as_slice());
    }
}
