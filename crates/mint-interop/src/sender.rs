// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Publisher side of the data channel.
//!
//! A `DataSender` owns one PUB socket. Every message is two frames: the topic
//! string, then the JSON payload. Send failures are logged and returned as
//! errors; the caller decides whether to care.

use serde::Serialize;
use std::fmt;
use std::thread;
use std::time::Duration;

use crate::codec::{self, ScalarValue};
use crate::context::{self, LIB_IDENTITY};
use crate::endpoint::EndpointRole;
use crate::error::{Error, Result};
use crate::session;
use crate::topic::Exchangeable;

/// Rebinding a port right after releasing it can race the old listener.
const BIND_RETRIES: u32 = 50;
const BIND_RETRY_INTERVAL: Duration = Duration::from_millis(2);

/// Lifecycle of a [`DataSender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Unstarted,
    Started,
    Stopped,
}

/// Publishes typed values under topic tags.
pub struct DataSender {
    address: String,
    identity: String,
    socket: Option<zmq::Socket>,
    role: Option<EndpointRole>,
    state: SenderState,
}

impl DataSender {
    /// Sender for `address`. Nothing is opened until [`start`](Self::start).
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            identity: LIB_IDENTITY.to_string(),
            socket: None,
            role: None,
            state: SenderState::Unstarted,
        }
    }

    /// Sender on the current session's send address, with its identity.
    pub fn from_session() -> Result<Self> {
        let session = session::current().ok_or(Error::SessionNotInitialized)?;
        Ok(Self::new(session.addresses.send).with_identity(session.identity))
    }

    /// Override the socket identity.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Open the socket and bind or connect it.
    ///
    /// Starting an already started sender releases the old endpoint first and
    /// then opens a fresh socket on the same address. On failure the sender
    /// is left without a socket and every send returns `NotStarted`.
    pub fn start(&mut self, role: EndpointRole) -> Result<()> {
        if self.socket.is_some() {
            log::debug!("[SENDER] restarting on {}", self.address);
            self.release();
        }

        match self.open(role) {
            Ok(socket) => {
                log::info!("[SENDER] {} {}", role, self.address);
                self.socket = Some(socket);
                self.role = Some(role);
                self.state = SenderState::Started;
                Ok(())
            }
            Err(e) => {
                log::error!("[SENDER] setup failed: {}", e);
                self.state = SenderState::Stopped;
                Err(e)
            }
        }
    }

    fn open(&self, role: EndpointRole) -> Result<zmq::Socket> {
        let setup = |source| Error::Setup {
            address: self.address.clone(),
            source,
        };

        let socket = context::socket(zmq::PUB, &self.identity).map_err(setup)?;
        socket.set_linger(0).map_err(setup)?;
        match role {
            EndpointRole::Bind => self.bind(&socket),
            EndpointRole::Connect => socket.connect(&self.address),
        }
        .map_err(setup)?;
        Ok(socket)
    }

    /// Bind, riding out a listener on the same port that is still closing.
    fn bind(&self, socket: &zmq::Socket) -> zmq::Result<()> {
        let mut attempts = 0;
        loop {
            match socket.bind(&self.address) {
                Err(zmq::Error::EADDRINUSE) if attempts < BIND_RETRIES => {
                    attempts += 1;
                    thread::sleep(BIND_RETRY_INTERVAL);
                }
                result => return result,
            }
        }
    }

    /// Unbind or disconnect the current socket and drop it.
    fn release(&mut self) {
        let Some(socket) = self.socket.take() else {
            return;
        };

        if let Ok(Ok(endpoint)) = socket.get_last_endpoint() {
            let released = match self.role {
                Some(EndpointRole::Bind) => socket.unbind(&endpoint),
                Some(EndpointRole::Connect) => socket.disconnect(&endpoint),
                None => Ok(()),
            };
            if let Err(e) = released {
                log::debug!("[SENDER] releasing {} failed: {}", endpoint, e);
            }
        }
        self.role = None;
    }

    /// Close the socket. Safe to call at any time, any number of times.
    pub fn stop(&mut self) {
        if self.socket.is_some() {
            self.release();
            log::debug!("[SENDER] closed {}", self.address);
            self.state = SenderState::Stopped;
        }
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Endpoint the socket actually bound or connected to.
    ///
    /// After binding `tcp://127.0.0.1:*` this carries the assigned port.
    pub fn last_endpoint(&self) -> Option<String> {
        self.socket.as_ref()?.get_last_endpoint().ok()?.ok()
    }

    /// Publish `payload` under `topic` as one two-frame message.
    pub fn send_raw(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let Some(socket) = &self.socket else {
            log::warn!("[SENDER] send on '{}' before start", topic);
            return Err(Error::NotStarted);
        };

        let sent = socket
            .send(topic.as_bytes(), zmq::SNDMORE)
            .and_then(|()| socket.send(payload, 0));

        sent.map_err(|source| {
            log::warn!("[SENDER] send on '{}' failed: {}", topic, source);
            Error::Send {
                topic: topic.to_string(),
                source,
            }
        })
    }

    /// Publish `value` under its canonical topic.
    pub fn send<T: Exchangeable>(&self, value: &T) -> Result<()> {
        self.send_to(value, T::TOPIC, None)
    }

    /// Publish `value` under `topic`, optionally with one extra string field
    /// merged into the payload.
    pub fn send_to<T: Serialize>(
        &self,
        value: &T,
        topic: &str,
        extra: Option<(&str, &str)>,
    ) -> Result<()> {
        let payload = codec::encode_with_extra(value, extra).map_err(|e| {
            log::error!("[SENDER] encode for '{}' failed: {}", topic, e);
            e
        })?;
        self.send_raw(topic, &payload)
    }

    /// Publish a plain scalar as `{"value": x}` under `topic`.
    pub fn send_value<S: ScalarValue>(&self, value: S, topic: &str) -> Result<()> {
        let payload = codec::encode_scalar(value)?;
        self.send_raw(topic, &payload)
    }
}

impl Drop for DataSender {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for DataSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSender")
            .field("address", &self.address)
            .field("identity", &self.identity)
            .field("state", &self.state)
            .finish()
    }
}
