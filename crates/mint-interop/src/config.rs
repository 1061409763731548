// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Interop configuration.
//!
//! Supports both programmatic and file-based configuration.
//!
//! ```toml
//! role = "rendering"
//! data_protocol = "tcp"
//! image_protocol = "gpu"
//! receive_address = "tcp://192.168.1.20:12345"
//! receive_timeout_ms = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::context::LIB_IDENTITY;
use crate::endpoint::{
    address_scheme, default_addresses, AddressPair, DataProtocol, ImageProtocol, PeerRole,
};
use crate::receiver::DataReceiver;
use crate::sender::DataSender;
use crate::session::{self, Session};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Accepted range for the subscriber receive timeout.
const TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 1..=1000;

/// Interop configuration for one process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteropConfig {
    /// Which side of the channel this process is.
    pub role: PeerRole,

    /// Transport for the data channel.
    #[serde(default)]
    pub data_protocol: DataProtocol,

    /// Texture sharing mode.
    #[serde(default)]
    pub image_protocol: ImageProtocol,

    /// Overrides the default send address for the role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_address: Option<String>,

    /// Overrides the default receive address for the role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_address: Option<String>,

    /// Subscriber receive timeout (milliseconds).
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,

    /// Socket identity.
    #[serde(default = "default_identity")]
    pub identity: String,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_receive_timeout_ms() -> u64 {
    5
}

fn default_identity() -> String {
    LIB_IDENTITY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl InteropConfig {
    /// Defaults for `role` over IPC.
    pub fn new(role: PeerRole) -> Self {
        Self {
            role,
            data_protocol: DataProtocol::default(),
            image_protocol: ImageProtocol::default(),
            send_address: None,
            receive_address: None,
            receive_timeout_ms: default_receive_timeout_ms(),
            identity: default_identity(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, address) in [
            ("send_address", &self.send_address),
            ("receive_address", &self.receive_address),
        ] {
            if let Some(address) = address {
                if address_scheme(address).is_none() {
                    return Err(ConfigError::Invalid(format!(
                        "{} '{}' must be scheme://endpoint with scheme one of tcp, ipc, inproc, pgm, epgm",
                        label, address
                    )));
                }
            }
        }

        if !TIMEOUT_RANGE_MS.contains(&self.receive_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "receive_timeout_ms {} out of range {}..={}",
                self.receive_timeout_ms,
                TIMEOUT_RANGE_MS.start(),
                TIMEOUT_RANGE_MS.end()
            )));
        }

        if self.identity.is_empty() || self.identity.len() > 255 {
            return Err(ConfigError::Invalid(
                "identity must be 1..=255 bytes".into(),
            ));
        }

        Ok(())
    }

    /// Role defaults with any address overrides applied.
    pub fn addresses(&self) -> AddressPair {
        let defaults = default_addresses(self.role, self.data_protocol);
        AddressPair {
            send: self.send_address.clone().unwrap_or(defaults.send),
            receive: self.receive_address.clone().unwrap_or(defaults.receive),
        }
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Install this configuration as the process-wide session.
    pub fn apply(&self) -> Result<(), ConfigError> {
        self.validate()?;
        session::install(Session {
            role: self.role,
            data_protocol: self.data_protocol,
            image_protocol: self.image_protocol,
            addresses: self.addresses(),
            receive_timeout: self.receive_timeout(),
            identity: self.identity.clone(),
        });
        Ok(())
    }

    /// Sender for this role's send address.
    pub fn sender(&self) -> DataSender {
        DataSender::new(self.addresses().send).with_identity(self.identity.clone())
    }

    /// Receiver for this role's receive address.
    pub fn receiver(&self) -> DataReceiver {
        DataReceiver::new(self.addresses().receive)
            .with_receive_timeout(self.receive_timeout())
            .with_identity(self.identity.clone())
    }
}
