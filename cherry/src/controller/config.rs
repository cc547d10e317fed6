//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//


//! Controller configuration.

use crate::engine::{ConfigError, EngineConfig};
use crate::openflow::OpenFlowVersion;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// The IANA-registered OpenFlow port is 6653; most switches still dial 6633.
pub const DEFAULT_LISTEN_PORT: u16 = 6633;

/// Configuration for a [`Controller`](crate::controller::Controller).
///
/// # Examples
///
/// ```rust
/// use cherry::controller::ControllerConfig;
/// use cherry::openflow::OpenFlowVersion;
///
/// let config = ControllerConfig::new()
///     .with_listen_addr("127.0.0.1:6653".parse().unwrap())
///     .with_version(OpenFlowVersion::V1_3);
///
/// assert_eq!(config.listen_addr.port(), 6653);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Address switches connect to.
    ///
    /// Default: `0.0.0.0:6633`
    pub listen_addr: SocketAddr,

    /// Protocol version every accepted connection speaks.
    ///
    /// Default: OpenFlow 1.0
    pub version: OpenFlowVersion,

    /// Settings applied to each connection's engine.
    pub engine: EngineConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_LISTEN_PORT)),
            version: OpenFlowVersion::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the listen address.
    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// Sets the protocol version.
    pub fn with_version(mut self, version: OpenFlowVersion) -> Self {
        self.version = version;
        self
    }

    /// Sets the per-connection engine settings.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Checks the engine settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()
    }
}
