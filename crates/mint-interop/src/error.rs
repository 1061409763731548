// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Error types for the data-exchange layer.
//!
//! Every fallible operation on the public surface returns [`Result`]. Nothing
//! panics across the crate boundary: transport problems, missing data and
//! malformed payloads are all reported as values so the render loop can keep
//! going with whatever it already holds.

use thiserror::Error;

use crate::config::ConfigError;
use crate::texture::TextureError;

/// Errors returned by senders, receivers and the wire codec.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Transport
    // ========================================================================
    /// Creating, configuring, binding or connecting a socket failed.
    #[error("socket setup failed for {address}: {source}")]
    Setup {
        address: String,
        #[source]
        source: zmq::Error,
    },

    /// The sender has no open socket (never started, or stopped).
    #[error("sender is not started")]
    NotStarted,

    /// Enqueueing one of the two frames failed.
    #[error("send failed on topic '{topic}': {source}")]
    Send {
        topic: String,
        #[source]
        source: zmq::Error,
    },

    /// The receive worker could not be spawned or died during setup.
    #[error("receive worker failed: {0}")]
    Worker(String),

    /// `from_session()` was called before `session::init`.
    #[error("interop session not initialized (call session::init first)")]
    SessionNotInitialized,

    // ========================================================================
    // Data
    // ========================================================================
    /// Nothing has been received for this topic yet.
    #[error("no data received for topic '{0}'")]
    NoData(String),

    /// The payload is zero bytes long.
    #[error("empty payload")]
    EmptyPayload,

    /// The payload is not valid JSON or lacks a required field.
    #[error("malformed payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// Extra fields can only be merged into an object payload.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// Serializing a value failed. Not expected for the built-in types.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    // ========================================================================
    // Other
    // ========================================================================
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}

impl Error {
    /// Socket-level problem: the peer or the local endpoint is unusable.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Setup { .. } | Error::NotStarted | Error::Send { .. } | Error::Worker(_)
        )
    }

    /// No message has arrived yet. Callers keep their previous value.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Error::NoData(_) | Error::EmptyPayload)
    }

    /// A message arrived but could not be decoded into the requested type.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::NotAnObject)
    }
}

/// Convenient alias for results using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
