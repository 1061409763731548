// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Subscriber side of the data channel.
//!
//! # Architecture
//!
//! ```text
//!   DataReceiver::start(filter)
//!        |
//!        +--> spawn "mint-recv" thread
//!               |  SUB socket, subscribe(filter), rcvtimeo, bind/connect
//!               |  report setup result ------------------> start() returns
//!               v
//!             loop while running:
//!               recv topic frame   (timeout -> continue)
//!               recv payload frame
//!               cache.store(topic, payload)
//!
//!   render loop: receive::<T>() --> cache.get(topic) --> codec::decode
//! ```
//!
//! Framing is always two frames. A lone topic frame, a message with more
//! than two frames, and a topic that is not UTF-8 are dropped and counted.
//! A payload that fails to decode stays in the cache, so the same error
//! comes back until the peer sends something new for that topic.

use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::cache::LatestValueCache;
use crate::codec::{self, ScalarValue};
use crate::context::{self, LIB_IDENTITY};
use crate::endpoint::EndpointRole;
use crate::error::{Error, Result};
use crate::session;
use crate::topic::Exchangeable;

/// Default receive timeout; bounds how long `stop()` waits for the worker.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(5);

/// Lifecycle of the receive worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Stopping,
}

// ============================================================================
// Metrics
// ============================================================================

/// Counters updated by the worker and the typed accessors.
#[derive(Debug, Default)]
pub struct ReceiverMetrics {
    pub messages_stored: AtomicU64,
    pub bytes_stored: AtomicU64,
    /// Topic frame arrived without a payload frame.
    pub partial_dropped: AtomicU64,
    /// Messages with more than two frames.
    pub oversized_dropped: AtomicU64,
    pub non_utf8_dropped: AtomicU64,
    /// Transport errors other than timeouts.
    pub receive_errors: AtomicU64,
    pub decode_failures: AtomicU64,
}

/// Point-in-time copy of [`ReceiverMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverMetricsSnapshot {
    pub messages_stored: u64,
    pub bytes_stored: u64,
    pub partial_dropped: u64,
    pub oversized_dropped: u64,
    pub non_utf8_dropped: u64,
    pub receive_errors: u64,
    pub decode_failures: u64,
}

impl ReceiverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> ReceiverMetricsSnapshot {
        ReceiverMetricsSnapshot {
            messages_stored: self.messages_stored.load(Ordering::Relaxed),
            bytes_stored: self.bytes_stored.load(Ordering::Relaxed),
            partial_dropped: self.partial_dropped.load(Ordering::Relaxed),
            oversized_dropped: self.oversized_dropped.load(Ordering::Relaxed),
            non_utf8_dropped: self.non_utf8_dropped.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ============================================================================
// Receiver
// ============================================================================

/// Background subscriber with a latest-value cache.
#[derive(Debug)]
pub struct DataReceiver {
    address: String,
    identity: String,
    receive_timeout: Duration,
    filter: String,
    cache: Arc<LatestValueCache>,
    metrics: Arc<ReceiverMetrics>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    state: WorkerState,
}

impl DataReceiver {
    /// Receiver for `address`. Nothing runs until [`start`](Self::start).
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            identity: LIB_IDENTITY.to_string(),
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            filter: String::new(),
            cache: Arc::new(LatestValueCache::new()),
            metrics: Arc::new(ReceiverMetrics::new()),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            state: WorkerState::Idle,
        }
    }

    /// Receiver on the current session's receive address, timeout and identity.
    pub fn from_session() -> Result<Self> {
        let session = session::current().ok_or(Error::SessionNotInitialized)?;
        Ok(Self::new(session.addresses.receive)
            .with_receive_timeout(session.receive_timeout)
            .with_identity(session.identity))
    }

    /// Receive timeout of the worker socket. Takes effect on the next start.
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Spawn the worker subscribed to `filter` (empty = everything).
    ///
    /// Returns once the worker's socket is set up or has failed to set up.
    /// A running worker is stopped first. Cached payloads survive restarts.
    pub fn start(&mut self, filter: &str, role: EndpointRole) -> Result<()> {
        if self.worker.is_some() {
            log::debug!("[RECEIVER] restarting on {}", self.address);
            self.stop();
        }

        self.filter = filter.to_string();
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let worker = Worker {
            address: self.address.clone(),
            identity: self.identity.clone(),
            filter: self.filter.clone(),
            receive_timeout: self.receive_timeout,
            role,
            cache: Arc::clone(&self.cache),
            metrics: Arc::clone(&self.metrics),
            running: Arc::clone(&running),
        };

        let handle = thread::Builder::new()
            .name("mint-recv".to_string())
            .spawn(move || worker.run(ready_tx))
            .map_err(|e| Error::Worker(format!("spawn failed: {}", e)))?;

        let setup = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(Error::Worker("worker exited during setup".into())));

        match setup {
            Ok(()) => {
                log::info!(
                    "[RECEIVER] {} {} filter='{}'",
                    role,
                    self.address,
                    self.filter
                );
                self.running = running;
                self.worker = Some(handle);
                self.state = WorkerState::Running;
                Ok(())
            }
            Err(e) => {
                running.store(false, Ordering::Release);
                let _ = handle.join();
                log::error!("[RECEIVER] setup failed: {}", e);
                self.state = WorkerState::Idle;
                Err(e)
            }
        }
    }

    /// Signal the worker and join it. Safe to call any number of times.
    pub fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };

        self.state = WorkerState::Stopping;
        self.running.store(false, Ordering::Release);
        if handle.join().is_err() {
            log::error!("[RECEIVER] worker thread panicked");
        }
        self.state = WorkerState::Idle;
        log::debug!("[RECEIVER] stopped {}", self.address);
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Filter the worker was last started with.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }

    /// Copy of the latest payload for `topic`, or for the filter if `None`.
    pub fn receive_copy(&self, topic: Option<&str>) -> Option<Vec<u8>> {
        self.cache.get(topic.unwrap_or(&self.filter))
    }

    /// Topics received so far, sorted.
    pub fn topics(&self) -> Vec<String> {
        self.cache.topics()
    }

    pub fn metrics(&self) -> ReceiverMetricsSnapshot {
        self.metrics.snapshot()
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    fn cached(&self, topic: &str) -> Result<Vec<u8>> {
        self.cache
            .get(topic)
            .ok_or_else(|| Error::NoData(topic.to_string()))
    }

    fn note_failure(&self, topic: &str, err: &Error) {
        if err.is_malformed() {
            ReceiverMetrics::bump(&self.metrics.decode_failures);
            log::debug!("[RECEIVER] '{}' did not decode: {}", topic, err);
        }
    }

    /// Decode the latest payload for `topic`.
    pub fn try_receive_from<T: DeserializeOwned>(&self, topic: &str) -> Result<T> {
        let payload = self.cached(topic)?;
        codec::decode(&payload).inspect_err(|e| self.note_failure(topic, e))
    }

    /// Fill `value` from its canonical topic. Returns `false` and leaves
    /// `value` untouched when nothing decodable has arrived.
    pub fn receive<T: Exchangeable>(&self, value: &mut T) -> bool {
        self.receive_from(value, T::TOPIC)
    }

    pub fn receive_from<T: DeserializeOwned>(&self, value: &mut T, topic: &str) -> bool {
        match self.try_receive_from(topic) {
            Ok(v) => {
                *value = v;
                true
            }
            Err(_) => false,
        }
    }

    /// Decode `topic` and read the side-channel field `key`.
    pub fn try_receive_with_extra<T: DeserializeOwned>(
        &self,
        topic: &str,
        key: &str,
    ) -> Result<(T, Option<String>)> {
        let payload = self.cached(topic)?;
        codec::decode_with_extra(&payload, key).inspect_err(|e| self.note_failure(topic, e))
    }

    /// Like [`receive_from`](Self::receive_from), also reading a side-channel
    /// field. The key of `extra` names the field; on success `extra` holds
    /// the value found, or becomes `None` if the payload has no such field.
    /// With `extra == None` this is a plain receive.
    pub fn receive_with_extra<T: DeserializeOwned>(
        &self,
        value: &mut T,
        topic: &str,
        extra: &mut Option<(String, String)>,
    ) -> bool {
        let Some(key) = extra.as_ref().map(|(k, _)| k.clone()) else {
            return self.receive_from(value, topic);
        };

        match self.try_receive_with_extra(topic, &key) {
            Ok((v, found)) => {
                *value = v;
                *extra = found.map(|found| (key, found));
                true
            }
            Err(_) => false,
        }
    }

    pub fn try_receive_value<S: ScalarValue>(&self, topic: &str) -> Result<S> {
        let payload = self.cached(topic)?;
        codec::decode_scalar(&payload).inspect_err(|e| self.note_failure(topic, e))
    }

    pub fn receive_value<S: ScalarValue>(&self, value: &mut S, topic: &str) -> bool {
        match self.try_receive_value(topic) {
            Ok(v) => {
                *value = v;
                true
            }
            Err(_) => false,
        }
    }
}

impl Drop for DataReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Worker thread
// ============================================================================

struct Worker {
    address: String,
    identity: String,
    filter: String,
    receive_timeout: Duration,
    role: EndpointRole,
    cache: Arc<LatestValueCache>,
    metrics: Arc<ReceiverMetrics>,
    running: Arc<AtomicBool>,
}

enum Received {
    Message(String, Vec<u8>),
    Timeout,
    Dropped,
}

impl Worker {
    fn run(self, ready: mpsc::SyncSender<Result<()>>) {
        let socket = match self.open() {
            Ok(socket) => socket,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        while self.running.load(Ordering::Acquire) {
            match self.receive_one(&socket) {
                Ok(Received::Message(topic, payload)) => {
                    self.metrics
                        .bytes_stored
                        .fetch_add(payload.len() as u64, Ordering::Relaxed);
                    ReceiverMetrics::bump(&self.metrics.messages_stored);
                    self.cache.store(topic, payload);
                }
                Ok(Received::Timeout) | Ok(Received::Dropped) => {}
                Err(e) => {
                    ReceiverMetrics::bump(&self.metrics.receive_errors);
                    log::debug!("[RECEIVER] receive error on {}: {}", self.address, e);
                    thread::sleep(self.receive_timeout);
                }
            }
        }

        log::debug!("[RECEIVER] worker for {} exiting", self.address);
    }

    fn open(&self) -> Result<zmq::Socket> {
        let setup = |source| Error::Setup {
            address: self.address.clone(),
            source,
        };
        let timeout_ms = i32::try_from(self.receive_timeout.as_millis()).unwrap_or(i32::MAX);

        let socket = context::socket(zmq::SUB, &self.identity).map_err(setup)?;
        socket.set_subscribe(self.filter.as_bytes()).map_err(setup)?;
        socket.set_rcvtimeo(timeout_ms).map_err(setup)?;
        match self.role {
            EndpointRole::Bind => socket.bind(&self.address),
            EndpointRole::Connect => socket.connect(&self.address),
        }
        .map_err(setup)?;
        Ok(socket)
    }

    fn receive_one(&self, socket: &zmq::Socket) -> zmq::Result<Received> {
        let topic = match socket.recv_msg(0) {
            Ok(msg) => msg,
            Err(zmq::Error::EAGAIN) => return Ok(Received::Timeout),
            Err(e) => return Err(e),
        };

        if !topic.get_more() {
            ReceiverMetrics::bump(&self.metrics.partial_dropped);
            log::debug!("[RECEIVER] dropped single-frame message");
            return Ok(Received::Dropped);
        }

        // Multipart messages arrive atomically, so the payload is already here.
        let payload = socket.recv_msg(0)?;
        if payload.get_more() {
            while socket.get_rcvmore()? {
                socket.recv_msg(0)?;
            }
            ReceiverMetrics::bump(&self.metrics.oversized_dropped);
            log::debug!("[RECEIVER] dropped message with more than two frames");
            return Ok(Received::Dropped);
        }

        let Some(topic) = topic.as_str() else {
            ReceiverMetrics::bump(&self.metrics.non_utf8_dropped);
            log::debug!("[RECEIVER] dropped message with non-UTF-8 topic");
            return Ok(Received::Dropped);
        };

        Ok(Received::Message(topic.to_string(), payload.to_vec()))
    }
}
