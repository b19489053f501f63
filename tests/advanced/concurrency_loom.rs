#![cfg(all(feature = "advanced-tests", loom))]
//! Concurrency tests for the two relay contexts using loom.
//!
//! The upstream and downstream loops run on separate threads and share only
//! the host and controller transports. `loom` explores the interleavings of
//! their lock acquisitions to show that both directions complete and that
//! the host's bookkeeping hook is never entered concurrently.

use hci_bridge::{
    BridgeConfig,
    DownstreamPump,
    Progress,
    Shared,
    UpstreamPump,
    relay::{poll_downstream_once, poll_upstream_once},
    transport::{MemoryController, MemoryHost},
};
use loom::{model, thread};

const COMMAND: [u8; 4] = [0x01, 0x03, 0x0c, 0x00];
const EVENT: [u8; 7] = [0x04, 0x0e, 0x04, 0x01, 0x03, 0x0c, 0x00];

fn framed(packet: &[u8]) -> Vec<u8> {
    let mut buf = vec![0; 3];
    buf.extend_from_slice(packet);
    buf
}

#[test]
fn both_directions_relay_concurrently() {
    model(|| {
        let config = BridgeConfig::new().with_buffer_capacity(32);
        let host = Shared::new(MemoryHost::new());
        let controller = Shared::new(MemoryController::new());
        host.with(|host| host.push_inbound(&COMMAND));
        controller.with(|controller| controller.push_packet(framed(&EVENT)));

        let mut upstream = UpstreamPump::new(&config);
        let (up_host, up_controller) = (host.clone(), controller.clone());
        let t1 = thread::spawn(move || {
            poll_upstream_once(&mut upstream, &up_host, &up_controller)
                .expect("upstream relays")
        });

        let mut downstream = DownstreamPump::new(&config);
        let (down_host, down_controller) = (host.clone(), controller.clone());
        let t2 = thread::spawn(move || {
            poll_downstream_once(&mut downstream, &down_host, &down_controller)
                .expect("downstream relays")
        });

        assert_eq!(
            t1.join().expect("upstream thread panicked"),
            Progress::Relayed { len: 4 }
        );
        assert_eq!(
            t2.join().expect("downstream thread panicked"),
            Progress::Relayed { len: 7 }
        );

        assert_eq!(
            controller.with(MemoryController::take_submitted),
            vec![framed(&COMMAND)]
        );
        assert_eq!(host.with(|host| host.outbound().to_vec()), EVENT.to_vec());
        assert_eq!(host.with(|host| host.service_count()), 2);
    });
}

#[test]
fn partial_host_writes_complete_while_upstream_reads() {
    model(|| {
        let config = BridgeConfig::new().with_buffer_capacity(32);
        let host = Shared::new(MemoryHost::new());
        let controller = Shared::new(MemoryController::new());
        host.with(|host| {
            host.push_inbound(&COMMAND);
            host.set_write_window(Some(4));
        });
        controller.with(|controller| controller.push_packet(framed(&EVENT)));

        let mut upstream = UpstreamPump::new(&config);
        let (up_host, up_controller) = (host.clone(), controller.clone());
        let t1 = thread::spawn(move || {
            poll_upstream_once(&mut upstream, &up_host, &up_controller)
                .expect("upstream relays")
        });

        let mut downstream = DownstreamPump::new(&config);
        let (down_host, down_controller) = (host.clone(), controller.clone());
        let t2 = thread::spawn(move || {
            let first = poll_downstream_once(&mut downstream, &down_host, &down_controller)
                .expect("first write");
            let second = poll_downstream_once(&mut downstream, &down_host, &down_controller)
                .expect("tail write");
            (first, second)
        });

        t1.join().expect("upstream thread panicked");
        let (first, second) = t2.join().expect("downstream thread panicked");

        assert_eq!(first, Progress::Advanced);
        assert_eq!(second, Progress::Relayed { len: 7 });
        assert_eq!(host.with(|host| host.outbound().to_vec()), EVENT.to_vec());
        assert_eq!(
            controller.with(MemoryController::take_submitted),
            vec![framed(&COMMAND)]
        );
    });
}
