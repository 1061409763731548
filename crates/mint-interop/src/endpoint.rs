// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Endpoint roles and the default steering/rendering address table.
//!
//! Two peers talk over two one-way channels. Each side publishes on its
//! `send` address and subscribes on its `receive` address, and the table is
//! arranged so that one role's send address is the other role's receive
//! address:
//!
//! ```text
//!   steering  --send-->  ipc:///tmp/mint_steering_send     --receive-->  rendering
//!   rendering --send-->  ipc:///tmp/mint_steering_receive  --receive-->  steering
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which process this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerRole {
    Steering,
    Rendering,
}

impl PeerRole {
    /// The role on the other end of the channel.
    pub fn peer(self) -> Self {
        match self {
            PeerRole::Steering => PeerRole::Rendering,
            PeerRole::Rendering => PeerRole::Steering,
        }
    }
}

impl fmt::Display for PeerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerRole::Steering => write!(f, "steering"),
            PeerRole::Rendering => write!(f, "rendering"),
        }
    }
}

/// Transport used for the structured data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataProtocol {
    /// Local-only interprocess sockets.
    #[default]
    Ipc,
    /// Networked TCP sockets.
    Tcp,
}

/// Texture sharing mode handed to the texture backend.
///
/// Discriminants follow the numbering the sharing backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageProtocol {
    /// GPU texture sharing.
    #[default]
    Gpu = 0,
    /// CPU texture sharing.
    Cpu = 1,
    /// Shared memory.
    MemShare = 2,
}

impl ImageProtocol {
    /// Human-readable mode name used in log output.
    pub fn label(self) -> &'static str {
        match self {
            ImageProtocol::Gpu => "GPU",
            ImageProtocol::Cpu => "CPU",
            ImageProtocol::MemShare => "Memory Share",
        }
    }
}

/// Whether a socket owns its address (bind) or dials out to it (connect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointRole {
    Bind,
    Connect,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Bind => write!(f, "bind"),
            EndpointRole::Connect => write!(f, "connect"),
        }
    }
}

/// Send and receive addresses for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPair {
    pub send: String,
    pub receive: String,
}

const IPC_STEERING_SEND: &str = "ipc:///tmp/mint_steering_send";
const IPC_STEERING_RECEIVE: &str = "ipc:///tmp/mint_steering_receive";

const TCP_STEERING_SEND: &str = "tcp://127.0.0.1:12345";
const TCP_STEERING_RECEIVE: &str = "tcp://localhost:12346";
const TCP_RENDERING_SEND: &str = "tcp://127.0.0.1:12346";
const TCP_RENDERING_RECEIVE: &str = "tcp://localhost:12345";

/// Default address pair for `role` over `protocol`.
pub fn default_addresses(role: PeerRole, protocol: DataProtocol) -> AddressPair {
    let (send, receive) = match (protocol, role) {
        (DataProtocol::Ipc, PeerRole::Steering) => (IPC_STEERING_SEND, IPC_STEERING_RECEIVE),
        (DataProtocol::Ipc, PeerRole::Rendering) => (IPC_STEERING_RECEIVE, IPC_STEERING_SEND),
        (DataProtocol::Tcp, PeerRole::Steering) => (TCP_STEERING_SEND, TCP_STEERING_RECEIVE),
        (DataProtocol::Tcp, PeerRole::Rendering) => (TCP_RENDERING_SEND, TCP_RENDERING_RECEIVE),
    };

    AddressPair {
        send: send.to_string(),
        receive: receive.to_string(),
    }
}

/// Transport schemes accepted in address strings.
pub const SCHEMES: &[&str] = &["tcp", "ipc", "inproc", "pgm", "epgm"];

/// Split `scheme://rest`, returning the scheme if it is a known transport.
pub fn address_scheme(address: &str) -> Option<&str> {
    let (scheme, rest) = address.split_once("://")?;
    if rest.is_empty() || !SCHEMES.contains(&scheme) {
        return None;
    }
    Some(scheme)
}
