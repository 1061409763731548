// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Process-wide session: which role this process plays and where it talks.
//!
//! `init` is normally called once at startup. Senders and receivers built
//! with `from_session()` read the addresses current at construction time, so
//! re-initializing only affects endpoints created afterwards.

use parking_lot::RwLock;
use std::time::Duration;

use crate::context::LIB_IDENTITY;
use crate::endpoint::{default_addresses, AddressPair, DataProtocol, ImageProtocol, PeerRole};
use crate::receiver::DEFAULT_RECEIVE_TIMEOUT;

/// Role, transport choices and resolved addresses for this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub role: PeerRole,
    pub data_protocol: DataProtocol,
    pub image_protocol: ImageProtocol,
    pub addresses: AddressPair,
    /// Worker receive timeout for receivers built from the session.
    pub receive_timeout: Duration,
    /// Socket identity for endpoints built from the session.
    pub identity: String,
}

static SESSION: RwLock<Option<Session>> = RwLock::new(None);

/// Install the session using the default address table.
pub fn init(role: PeerRole, data_protocol: DataProtocol, image_protocol: ImageProtocol) {
    install(Session {
        role,
        data_protocol,
        image_protocol,
        addresses: default_addresses(role, data_protocol),
        receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
        identity: LIB_IDENTITY.to_string(),
    });
}

/// Install a fully specified session (used by config with address overrides).
pub fn install(session: Session) {
    log::info!(
        "[SESSION] {} over {:?}: send={} receive={} textures={}",
        session.role,
        session.data_protocol,
        session.addresses.send,
        session.addresses.receive,
        session.image_protocol.label()
    );
    *SESSION.write() = Some(session);
}

/// Current session, if `init` or `install` has run.
pub fn current() -> Option<Session> {
    SESSION.read().clone()
}
