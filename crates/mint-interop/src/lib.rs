// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! # mint-interop - Minimal Interoperation Library
//!
//! Latest-value data exchange between a steering process (typically a Unity
//! scene) and a rendering process, plus the metadata both sides need to
//! share stereo textures.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mint_interop::{
//!     session, BoundingBoxCorners, DataProtocol, DataReceiver, DataSender, EndpointRole,
//!     ImageProtocol, ModelPose, PeerRole, Result,
//! };
//!
//! fn main() -> Result<()> {
//!     session::init(PeerRole::Rendering, DataProtocol::Tcp, ImageProtocol::Gpu);
//!
//!     let mut sender = DataSender::from_session()?;
//!     sender.start(EndpointRole::Bind)?;
//!
//!     let mut receiver = DataReceiver::from_session()?;
//!     receiver.start("", EndpointRole::Connect)?;
//!
//!     let mut pose = ModelPose::default();
//!     loop {
//!         // keeps the previous pose until a new one decodes
//!         receiver.receive(&mut pose);
//!         sender.send(&BoundingBoxCorners::default())?;
//!         # break;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                         Application Layer                           |
//! |   send::<T>(&value)                      receive::<T>(&mut value)   |
//! +---------------------------------------------------------------------+
//! |                  Topic Registry + Wire Codec (JSON)                 |
//! |   T::TOPIC | e00..e33 matrices | {"value": x} scalars | extra key   |
//! +---------------------------------------------------------------------+
//! |   DataSender (PUB)           |   DataReceiver (SUB + worker thread) |
//! |   [topic][payload]  ------>  |   LatestValueCache {topic -> bytes}  |
//! +---------------------------------------------------------------------+
//! |                 ZeroMQ (tcp | ipc | inproc), one context            |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DataSender`] | Publishes typed values under topic tags |
//! | [`DataReceiver`] | Background subscriber exposing the latest value per topic |
//! | [`Exchangeable`] | A value type with a canonical topic |
//! | [`InteropConfig`] | TOML configuration for role, protocol and addresses |
//! | [`texture::StereoTextureSender`] | Stereo atlas publishing over a texture backend |

pub mod cache;
pub mod codec;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod texture;
pub mod topic;
pub mod types;

pub use cache::LatestValueCache;
pub use codec::ScalarValue;
pub use config::{ConfigError, InteropConfig};
pub use context::{global_context, LIB_IDENTITY};
pub use endpoint::{default_addresses, AddressPair, DataProtocol, EndpointRole, ImageProtocol, PeerRole};
pub use error::{Error, Result};
pub use receiver::{DataReceiver, ReceiverMetricsSnapshot, WorkerState};
pub use sender::{DataSender, SenderState};
pub use session::Session;
pub use texture::TextureError;
pub use topic::{is_registered, topic_of, Exchangeable, REGISTERED_TOPICS};
pub use types::{
    BoundingBoxCorners, CameraConfiguration, CameraProjection, CameraView,
    DatasetRenderConfiguration, Mat4, ModelPose, StereoCameraConfiguration, StereoCameraView,
    StereoCameraViewRelative, Vec4,
};
