// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

#![allow(clippy::float_cmp)] // Exact float payload checks
#![allow(clippy::cast_precision_loss)] // Counter to f32, exact below 2^24

//! Sustained publishing while the consumer reads the cache.
//!
//! The publisher writes a counter into both corners of a bounding box
//! (`min.x = n`, `max.x = -n`) for two seconds. Every read must decode and
//! be internally consistent, and the counter must never go backwards.

use mint_interop::{BoundingBoxCorners, DataReceiver, DataSender, EndpointRole, Vec4};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const RUN_TIME: Duration = Duration::from_secs(2);

fn stamped(n: u32) -> BoundingBoxCorners {
    let v = n as f32;
    BoundingBoxCorners {
        min: Vec4::new(v, v, v, 1.0),
        max: Vec4::new(-v, -v, -v, 1.0),
    }
}

#[test]
fn test_reads_never_tear_under_sustained_writes() {
    let address = "inproc://concurrent-cache";
    let mut receiver = DataReceiver::new(address);
    receiver
        .start("BoundingBoxCorners", EndpointRole::Bind)
        .expect("bind");

    let done = Arc::new(AtomicBool::new(false));
    let publisher = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut sender = DataSender::new(address);
            sender.start(EndpointRole::Connect).expect("connect");

            let mut n = 0_u32;
            while !done.load(Ordering::Relaxed) {
                sender.send(&stamped(n)).expect("send");
                n += 1;
                // ~2000 messages per second
                thread::sleep(Duration::from_micros(500));
            }
            n
        })
    };

    let started = Instant::now();
    let mut reads = 0_u64;
    let mut last_seen = 0.0_f32;
    while started.elapsed() < RUN_TIME {
        if let Some(payload) = receiver.receive_copy(Some("BoundingBoxCorners")) {
            let bbox: BoundingBoxCorners =
                mint_interop::codec::decode(&payload).expect("payload must decode");
            assert_eq!(bbox.min.x, -bbox.max.x, "inconsistent payload");
            assert_eq!(bbox.min.y, bbox.min.x);
            assert!(bbox.min.x >= last_seen, "counter went backwards");
            last_seen = bbox.min.x;
            reads += 1;
        }
    }

    done.store(true, Ordering::Relaxed);
    let sent = publisher.join().expect("publisher");

    receiver.stop();
    let metrics = receiver.metrics();
    assert!(sent > 100, "publisher only sent {}", sent);
    assert!(reads > 0);
    assert!(metrics.messages_stored > 0);
    assert!(metrics.messages_stored <= u64::from(sent));
    assert_eq!(metrics.decode_failures, 0);
}
