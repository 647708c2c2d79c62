// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "FOLIO_CONFIG";
/// Environment variable overriding the bind address.
pub const BIND_ENV: &str = "FOLIO_BIND";
/// Environment variable overriding the port.
pub const PORT_ENV: &str = "FOLIO_PORT";

/// Settings for the conversion server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_address: IpAddr,
    /// Port for the HTTP listener (default 5000).
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Read a config file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Resolve the effective config from `FOLIO_CONFIG`, then apply
    /// `FOLIO_BIND` / `FOLIO_PORT` overrides. Never fails: a broken file
    /// or override is logged and ignored.
    pub fn from_env() -> Self {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path).unwrap_or_else(|e| {
                warn!(path = %path, error = %e, "config file unusable, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.apply_overrides(
            std::env::var(BIND_ENV).ok().as_deref(),
            std::env::var(PORT_ENV).ok().as_deref(),
        );
        info!(addr = %config.socket_addr(), max_upload_bytes = config.max_upload_bytes, "configuration loaded");
        config
    }

    /// Apply textual bind/port overrides on top of the current values.
    pub fn apply_overrides(&mut self, bind: Option<&str>, port: Option<&str>) {
        if let Some(bind) = bind {
            match bind.trim().parse::<IpAddr>() {
                Ok(addr) => self.bind_address = addr,
                Err(e) => warn!(value = bind, error = %e, "ignoring invalid {BIND_ENV}"),
            }
        }
        if let Some(port) = port {
            match port.trim().parse::<u16>() {
                Ok(p) => self.port = p,
                Err(e) => warn!(value = port, error = %e, "ignoring invalid {PORT_ENV}"),
            }
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
