use std::io::Write;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use joint_bridge_core::bus::{JointState, LocalBus, OutboundSink};
use joint_bridge_core::peer::{LinePeerWriter, PeerReader, PeerWriter};
use joint_bridge_core::{Bridge, BridgeOptions, WorkerRole};
use parking_lot::Mutex;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Peer reader fed from a channel; dropping the sender is EOF
struct ChannelReader(mpsc::Receiver<f64>);

impl PeerReader for ChannelReader {
    fn read_value(&mut self) -> joint_bridge_core::Result<Option<f64>> {
        Ok(self.0.recv().ok())
    }
}

fn peer_input() -> (mpsc::Sender<f64>, ChannelReader) {
    let (tx, rx) = mpsc::channel();
    (tx, ChannelReader(rx))
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct BrokenPeer;

impl PeerWriter for BrokenPeer {
    fn write_value(&mut self, _value: f64) -> joint_bridge_core::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer went away").into())
    }
}

fn capture(bus: &LocalBus, topic: &str) -> Arc<Mutex<Vec<JointState>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.subscribe_fn(topic, move |msg| sink.lock().push(msg.clone()));
    seen
}

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn test_queued_peer_value_is_published_once() {
    let bus = LocalBus::new();
    let published = capture(&bus, "get_joints");
    let (_peer_tx, reader) = peer_input();

    let bridge = Bridge::new(BridgeOptions::default());
    bridge.outbound_sender().push(3.14);
    assert_eq!(bridge.stats().outbound_pending, 1);

    let running = bridge
        .start(reader, LinePeerWriter::new(SharedBuf::default()), &bus, bus.clone())
        .unwrap();

    assert!(wait_until(|| running.stats().outbound_forwarded == 1));
    let published = published.lock();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].position, vec![3.14]);
    assert_eq!(running.stats().outbound_pending, 0);
    drop(published);

    running.shutdown().unwrap();
}

#[test]
fn test_inbound_message_reaches_peer_output() {
    let bus = LocalBus::new();
    let out = SharedBuf::default();
    let (_peer_tx, reader) = peer_input();

    let bridge = Bridge::new(BridgeOptions::default());
    assert!(bridge
        .inbound_handler()
        .handle(&JointState::from_position(2.0)));
    let stats = bridge.stats();
    assert_eq!(stats.inbound_pending, 1);
    assert_eq!(stats.inbound_received, 1);

    let running = bridge
        .start(reader, LinePeerWriter::new(out.clone()), &bus, bus.clone())
        .unwrap();

    assert!(wait_until(|| out.contents() == "2.0\n"));
    assert_eq!(running.stats().inbound_forwarded, 1);
    assert_eq!(running.stats().inbound_pending, 0);
    running.shutdown().unwrap();
}

#[test]
fn test_middleware_events_forwarded_in_order() {
    let bus = LocalBus::new();
    let out = SharedBuf::default();
    let (_peer_tx, reader) = peer_input();

    let running = Bridge::new(BridgeOptions::default())
        .start(
            reader,
            LinePeerWriter::new(out.clone()).with_prefix("Output to other: "),
            &bus,
            bus.clone(),
        )
        .unwrap();

    for v in [0.5, 1.0, 1.5] {
        bus.publish("set_joints", JointState::from_position(v))
            .unwrap();
    }

    assert!(wait_until(|| running.stats().inbound_forwarded == 3));
    assert_eq!(
        out.contents(),
        "Output to other: 0.5\nOutput to other: 1.0\nOutput to other: 1.5\n"
    );
    running.shutdown().unwrap();
}

#[test]
fn test_peer_values_published_in_order() {
    let bus = LocalBus::new();
    let published = capture(&bus, "get_joints");
    let (peer_tx, reader) = peer_input();

    let options = BridgeOptions {
        joint_name: Some("elbow".to_string()),
        ..BridgeOptions::default()
    };
    let running = Bridge::new(options)
        .start(reader, LinePeerWriter::new(SharedBuf::default()), &bus, bus.clone())
        .unwrap();

    let values: Vec<f64> = (0..100).map(|i| i as f64 * 0.25).collect();
    for v in &values {
        peer_tx.send(*v).unwrap();
    }

    assert!(wait_until(|| published.lock().len() == values.len()));
    let got: Vec<f64> = published.lock().iter().map(|m| m.position[0]).collect();
    assert_eq!(got, values);
    assert!(published.lock().iter().all(|m| m.name == ["elbow"]));

    drop(peer_tx);
    assert!(wait_until(|| !running.is_worker_alive(WorkerRole::PeerIngest)));
    running.shutdown().unwrap();
}

#[test]
fn test_malformed_inbound_message_is_dropped() {
    let bus = LocalBus::new();
    let out = SharedBuf::default();
    let (_peer_tx, reader) = peer_input();

    let running = Bridge::new(BridgeOptions::default())
        .start(reader, LinePeerWriter::new(out.clone()), &bus, bus.clone())
        .unwrap();

    bus.publish("set_joints", JointState::new()).unwrap();
    bus.publish("set_joints", JointState::from_position(7.0))
        .unwrap();

    assert!(wait_until(|| running.stats().inbound_forwarded == 1));
    let stats = running.stats();
    assert_eq!(stats.inbound_dropped, 1);
    assert_eq!(stats.inbound_received, 1);
    assert_eq!(out.contents(), "7.0\n");
    running.shutdown().unwrap();
}

#[test]
fn test_peer_output_failure_leaves_other_direction_running() {
    let bus = LocalBus::new();
    let published = capture(&bus, "get_joints");
    let (peer_tx, reader) = peer_input();

    let running = Bridge::new(BridgeOptions::default())
        .start(reader, BrokenPeer, &bus, bus.clone())
        .unwrap();

    bus.publish("set_joints", JointState::from_position(1.0))
        .unwrap();
    assert!(wait_until(|| !running.is_worker_alive(WorkerRole::PeerOutput)));

    for v in [10.0, 20.0, 30.0] {
        peer_tx.send(v).unwrap();
    }
    assert!(wait_until(|| published.lock().len() == 3));
    assert!(running.is_worker_alive(WorkerRole::PeerIngest));
    assert!(running.is_worker_alive(WorkerRole::MiddlewareOutput));
    assert_eq!(running.stats().outbound_pending, 0);

    // The failed direction keeps accepting but no longer drains
    bus.publish("set_joints", JointState::from_position(2.0))
        .unwrap();
    assert_eq!(running.stats().inbound_pending, 1);

    running.shutdown().unwrap();
}

#[test]
fn test_publish_failure_leaves_peer_output_running() {
    let bus = LocalBus::new();
    let out = SharedBuf::default();
    let (peer_tx, reader) = peer_input();

    let failing = LocalBus::new();
    failing.set_failing(true);

    let running = Bridge::new(BridgeOptions::default())
        .start(reader, LinePeerWriter::new(out.clone()), &bus, failing)
        .unwrap();

    peer_tx.send(1.0).unwrap();
    assert!(wait_until(
        || !running.is_worker_alive(WorkerRole::MiddlewareOutput)
    ));

    bus.publish("set_joints", JointState::from_position(4.0))
        .unwrap();
    assert!(wait_until(|| out.contents() == "4.0\n"));
    assert_eq!(
        running.alive_workers(),
        vec![WorkerRole::PeerIngest, WorkerRole::PeerOutput]
    );
    running.shutdown().unwrap();
}

#[test]
fn test_loopback_round_trip() {
    let bus = LocalBus::new();
    let out = SharedBuf::default();
    let (peer_tx, reader) = peer_input();

    let relay = bus.clone();
    bus.subscribe_fn("get_joints", move |msg| {
        relay.publish("set_joints", msg.clone()).unwrap();
    });

    let running = Bridge::new(BridgeOptions::default())
        .start(reader, LinePeerWriter::new(out.clone()), &bus, bus.clone())
        .unwrap();

    peer_tx.send(4.5).unwrap();
    peer_tx.send(-1.0).unwrap();
    assert!(wait_until(|| out.contents() == "4.5\n-1.0\n"));
    running.shutdown().unwrap();
}

#[test]
fn test_shutdown_wakes_idle_workers() {
    let bus = LocalBus::new();
    let (peer_tx, reader) = peer_input();

    let running = Bridge::new(BridgeOptions::default())
        .start(reader, LinePeerWriter::new(SharedBuf::default()), &bus, bus.clone())
        .unwrap();
    assert_eq!(running.alive_workers().len(), 3);

    drop(peer_tx);
    assert!(wait_until(|| !running.is_worker_alive(WorkerRole::PeerIngest)));

    let (done_tx, done_rx) = mpsc::channel();
    std::thread::spawn(move || {
        done_tx.send(running.shutdown().is_ok()).unwrap();
    });
    assert_eq!(done_rx.recv_timeout(TIMEOUT), Ok(true));
}
