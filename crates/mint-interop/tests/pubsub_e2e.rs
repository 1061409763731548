// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with exact constants
#![allow(clippy::cast_precision_loss)] // Test counters
#![allow(clippy::too_many_lines)] // Scenario tests

//! End-to-end publish/subscribe tests over real ZeroMQ sockets.
//!
//! Every test uses its own `inproc://` name (the context is process-wide)
//! or an ephemeral TCP port. PUB/SUB drops messages until the subscription
//! has propagated, so senders republish until the receiver sees data.

use mint_interop::{
    BoundingBoxCorners, CameraView, DataReceiver, DataSender, EndpointRole, Error, ModelPose,
    SenderState, Vec4, WorkerState,
};
use std::thread;
use std::time::{Duration, Instant};

const RETRY_INTERVAL: Duration = Duration::from_millis(10);
const RETRY_BUDGET: Duration = Duration::from_secs(5);

/// Call `attempt` every few milliseconds until it returns true or time runs out.
fn retry_until(mut attempt: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + RETRY_BUDGET;
    while Instant::now() < deadline {
        if attempt() {
            return true;
        }
        thread::sleep(RETRY_INTERVAL);
    }
    false
}

fn unit_box() -> BoundingBoxCorners {
    BoundingBoxCorners {
        min: Vec4::new(-1.0, -1.0, -1.0, 1.0),
        max: Vec4::new(1.0, 1.0, 1.0, 1.0),
    }
}

fn bound_sender(address: &str) -> DataSender {
    let mut sender = DataSender::new(address);
    sender.start(EndpointRole::Bind).expect("sender bind");
    sender
}

fn connected_receiver(address: &str, filter: &str) -> DataReceiver {
    let mut receiver = DataReceiver::new(address);
    receiver
        .start(filter, EndpointRole::Connect)
        .expect("receiver connect");
    receiver
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_bounding_box_roundtrip() {
    let address = "inproc://e2e-bounding-box";
    let sender = bound_sender(address);
    let receiver = connected_receiver(address, "BoundingBoxCorners");

    let expected = unit_box();
    let mut received = BoundingBoxCorners::default();
    let ok = retry_until(|| {
        sender.send(&expected).expect("send");
        receiver.receive(&mut received)
    });

    assert!(ok, "bounding box never arrived");
    assert_eq!(received.min, expected.min);
    assert_eq!(received.max, expected.max);
}

#[test]
fn test_empty_filter_receives_every_topic() {
    let address = "inproc://e2e-empty-filter";
    let sender = bound_sender(address);
    let receiver = connected_receiver(address, "");

    let pose = ModelPose {
        translation: Vec4::new(1.0, 2.0, 3.0, 0.0),
        ..ModelPose::default()
    };
    let ok = retry_until(|| {
        sender.send(&pose).expect("send pose");
        sender.send(&unit_box()).expect("send box");
        sender.send_value(17_u32, "frame").expect("send frame");
        receiver.topics().len() == 3
    });
    assert!(ok, "not every topic arrived: {:?}", receiver.topics());

    assert_eq!(
        receiver.topics(),
        vec!["BoundingBoxCorners", "ModelPose", "frame"]
    );
    let mut frame = 0_u32;
    assert!(receiver.receive_value(&mut frame, "frame"));
    assert_eq!(frame, 17);
}

#[test]
fn test_filter_isolation() {
    let address = "inproc://e2e-filter-isolation";
    let sender = bound_sender(address);
    let receiver = connected_receiver(address, "ModelPose");

    // The unwanted topic goes out first on every round, so once ModelPose
    // has arrived the filter has had its chance to drop CameraView.
    let mut pose = ModelPose::default();
    let ok = retry_until(|| {
        sender.send(&CameraView::default()).expect("send view");
        sender.send(&ModelPose::default()).expect("send pose");
        receiver.receive(&mut pose)
    });
    assert!(ok);

    let mut view = CameraView::default();
    assert!(!receiver.receive(&mut view));
    assert_eq!(receiver.receive_copy(Some("CameraView")), None);
    assert_eq!(receiver.topics(), vec!["ModelPose"]);
}

#[test]
fn test_no_data_keeps_value() {
    let address = "inproc://e2e-no-data";
    let _sender = bound_sender(address);
    let receiver = connected_receiver(address, "");

    thread::sleep(Duration::from_millis(500));

    let mut pose = ModelPose {
        scale: Vec4::new(2.0, 2.0, 2.0, 1.0),
        ..ModelPose::default()
    };
    let before = pose;
    assert!(!receiver.receive(&mut pose));
    assert_eq!(pose, before);

    let err = receiver
        .try_receive_from::<ModelPose>("ModelPose")
        .unwrap_err();
    assert!(err.is_no_data());
}

#[test]
fn test_latest_value_wins() {
    let address = "inproc://e2e-latest-wins";
    let sender = bound_sender(address);
    let receiver = connected_receiver(address, "counter");

    let ok = retry_until(|| {
        sender.send_value(0_u32, "counter").expect("send");
        receiver.receive_copy(Some("counter")).is_some()
    });
    assert!(ok);

    for i in 1..=100_u32 {
        sender.send_value(i, "counter").expect("send");
    }

    let mut latest = 0_u32;
    let ok = retry_until(|| receiver.receive_value(&mut latest, "counter") && latest == 100);
    assert!(ok, "last value seen was {}", latest);
    assert_eq!(receiver.topics().len(), 1);
}

#[test]
fn test_receiver_binds_sender_connects() {
    let address = "inproc://e2e-reversed-roles";
    let mut receiver = DataReceiver::new(address);
    receiver.start("vec4", EndpointRole::Bind).expect("bind");

    let mut sender = DataSender::new(address);
    sender.start(EndpointRole::Connect).expect("connect");

    let v = Vec4::new(0.5, 0.25, 0.125, 1.0);
    let mut got = Vec4::ZERO;
    assert!(retry_until(|| {
        sender.send(&v).expect("send");
        receiver.receive(&mut got)
    }));
    assert_eq!(got, v);
}

#[test]
fn test_tcp_ephemeral_port_with_extra() {
    let sender = bound_sender("tcp://127.0.0.1:*");
    let endpoint = sender.last_endpoint().expect("endpoint");
    let receiver = connected_receiver(&endpoint, "BoundingBoxCorners");

    let expected = unit_box();
    let mut received = BoundingBoxCorners::default();
    let mut extra = Some(("timestamp".to_string(), String::new()));
    let ok = retry_until(|| {
        sender
            .send_to(&expected, "BoundingBoxCorners", Some(("timestamp", "123456")))
            .expect("send");
        receiver.receive_with_extra(&mut received, "BoundingBoxCorners", &mut extra)
    });

    assert!(ok);
    assert_eq!(received, expected);
    assert_eq!(extra, Some(("timestamp".to_string(), "123456".to_string())));
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_stop_is_idempotent() {
    let address = "inproc://e2e-idempotent-stop";
    let mut sender = bound_sender(address);
    let mut receiver = connected_receiver(address, "");

    receiver.stop();
    receiver.stop();
    assert_eq!(receiver.state(), WorkerState::Idle);

    sender.stop();
    sender.stop();
    assert_eq!(sender.state(), SenderState::Stopped);
    assert!(matches!(sender.send(&unit_box()), Err(Error::NotStarted)));
}

#[test]
fn test_stop_is_prompt() {
    let address = "inproc://e2e-prompt-stop";
    let _sender = bound_sender(address);
    let mut receiver = connected_receiver(address, "");

    let started = Instant::now();
    receiver.stop();
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn test_invalid_address_stays_idle() {
    let mut receiver = DataReceiver::new("tcp://");
    let err = receiver.start("", EndpointRole::Connect).unwrap_err();
    assert!(err.is_transport());
    assert_eq!(receiver.state(), WorkerState::Idle);

    let mut sender = DataSender::new("nonsense");
    assert!(sender.start(EndpointRole::Bind).is_err());
    assert!(matches!(sender.send(&unit_box()), Err(Error::NotStarted)));
}

#[test]
fn test_restart_with_new_filter() {
    let address = "inproc://e2e-restart";
    let sender = bound_sender(address);
    let mut receiver = connected_receiver(address, "ModelPose");

    assert!(retry_until(|| {
        sender.send(&ModelPose::default()).expect("send");
        receiver.receive_copy(Some("ModelPose")).is_some()
    }));

    receiver
        .start("CameraView", EndpointRole::Connect)
        .expect("restart");
    assert_eq!(receiver.state(), WorkerState::Running);
    assert_eq!(receiver.filter(), "CameraView");

    assert!(retry_until(|| {
        sender.send(&CameraView::default()).expect("send");
        receiver.receive_copy(None).is_some()
    }));
    // the cache outlives the restart
    assert!(receiver.receive_copy(Some("ModelPose")).is_some());
}

#[test]
fn test_sender_restart_on_fixed_port() {
    // learn a free port, then hand it back
    let endpoint = {
        let mut scout = bound_sender("tcp://127.0.0.1:*");
        let endpoint = scout.last_endpoint().expect("endpoint");
        scout.stop();
        endpoint
    };

    let mut sender = bound_sender(&endpoint);
    for _ in 0..3 {
        sender.start(EndpointRole::Bind).expect("rebind on same port");
        assert_eq!(sender.state(), SenderState::Started);
    }
    assert_eq!(sender.last_endpoint().as_deref(), Some(endpoint.as_str()));

    let receiver = connected_receiver(&endpoint, "BoundingBoxCorners");
    let mut received = BoundingBoxCorners::default();
    assert!(retry_until(|| {
        sender.send(&unit_box()).expect("send after restart");
        receiver.receive(&mut received)
    }));
    assert_eq!(received, unit_box());
}

#[test]
fn test_drop_joins_worker() {
    let address = "inproc://e2e-drop";
    let sender = bound_sender(address);
    {
        let receiver = connected_receiver(address, "");
        assert_eq!(receiver.state(), WorkerState::Running);
    }
    drop(sender);
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

#[test]
fn test_malformed_framing_is_dropped() {
    let address = "inproc://e2e-framing";
    let raw = mint_interop::global_context()
        .socket(zmq::PUB)
        .expect("socket");
    raw.bind(address).expect("bind");
    let receiver = connected_receiver(address, "");

    let send_garbage = || {
        raw.send("lonely", 0).expect("single frame");
        raw.send("triple", zmq::SNDMORE).expect("frame 1");
        raw.send("{}", zmq::SNDMORE).expect("frame 2");
        raw.send("{}", 0).expect("frame 3");
        raw.send(&[0xff_u8, 0xfe][..], zmq::SNDMORE).expect("bad topic");
        raw.send("{}", 0).expect("payload");
    };
    let send_marker = |marker: u32| {
        raw.send("marker", zmq::SNDMORE).expect("topic");
        raw.send(format!("{{\"value\":{}}}", marker).as_str(), 0)
            .expect("payload");
    };

    let mut marker = 0_u32;
    assert!(retry_until(|| {
        send_garbage();
        send_marker(1);
        receiver.receive_value(&mut marker, "marker")
    }));

    // Connected now, so this round of garbage is guaranteed to reach the worker.
    send_garbage();
    send_marker(2);
    assert!(retry_until(
        || receiver.receive_value(&mut marker, "marker") && marker == 2
    ));

    let metrics = receiver.metrics();
    assert!(metrics.partial_dropped >= 1);
    assert!(metrics.oversized_dropped >= 1);
    assert!(metrics.non_utf8_dropped >= 1);
    assert_eq!(receiver.topics(), vec!["marker"]);
}

#[test]
fn test_decode_failure_is_sticky_until_next_message() {
    let address = "inproc://e2e-sticky-decode";
    let sender = bound_sender(address);
    let receiver = connected_receiver(address, "ModelPose");

    assert!(retry_until(|| {
        sender.send_raw("ModelPose", b"{\"translation\":").expect("send");
        receiver.receive_copy(Some("ModelPose")).is_some()
    }));

    let mut pose = ModelPose::default();
    let err = receiver.try_receive_from::<ModelPose>("ModelPose").unwrap_err();
    assert!(err.is_malformed());
    assert!(!receiver.receive(&mut pose));

    let good = ModelPose {
        translation: Vec4::new(4.0, 5.0, 6.0, 0.0),
        ..ModelPose::default()
    };
    sender.send(&good).expect("send");
    assert!(retry_until(|| receiver.receive(&mut pose)));
    assert_eq!(pose, good);
    assert!(receiver.metrics().decode_failures >= 2);
}
