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


//! Top-level error type for cherry.
//!
//! Each layer owns its error type:
//!
//! 1. **Transport**: the byte stream under a connection ([`TransportError`])
//! 2. **Codec**: OpenFlow framing on that stream ([`CodecError`])
//! 3. **Engine**: why a protocol session ended ([`EngineError`])
//! 4. **Device**: the application-facing send API ([`DeviceError`])
//! 5. **Application**: errors raised by northbound applications
//!
//! [`CherryError`] composes them for hosts that want a single error type.
//!
//! # Error Handling Strategy
//!
//! Errors are contained in the session that produced them:
//!
//! - **Transport and codec errors** → end that connection's engine
//! - **Engine errors** → the engine cleans up its own pool registration
//! - **Device errors** → returned to the sending application only
//! - **Application errors** → logged by the dispatcher, delivery continues
//!
//! # Examples
//!
//! ```rust
//! use cherry::CherryError;
//! use cherry::transport::TransportError;
//!
//! let error: CherryError = TransportError::Closed.into();
//! assert!(error.is_transport_error());
//! assert!(error.should_close_connection());
//! ```

use crate::device::DeviceError;
use crate::engine::{ConfigError, EngineError};
use crate::northbound::ApplicationError;
use crate::openflow::CodecError;
use crate::transport::TransportError;
use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for cherry operations.
#[derive(Debug)]
pub enum CherryError {
    /// Transport layer failure.
    Transport(TransportError),

    /// Message framing failure.
    Codec(CodecError),

    /// A protocol engine ended its session.
    Engine(EngineError),

    /// Sending through a device failed.
    Device(DeviceError),

    /// A configuration value was rejected.
    Config(ConfigError),

    /// A northbound application failed.
    Application(ApplicationError),
}

impl CherryError {
    /// Returns `true` if this is a transport layer error.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this is an engine termination.
    pub fn is_engine_error(&self) -> bool {
        matches!(self, Self::Engine(_))
    }

    /// Returns `true` if this is an application error.
    pub fn is_application_error(&self) -> bool {
        matches!(self, Self::Application(_))
    }

    /// Returns `true` if the error is absorbed without ending a session.
    ///
    /// Read timeouts and unsupported messages are the only such errors.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => !e.should_close_transport(),
            Self::Codec(e) => !e.is_fatal(),
            Self::Engine(e) => e.is_transient(),
            Self::Device(e) => !e.is_connection_error(),
            Self::Config(_) => false,
            Self::Application(_) => true,
        }
    }

    /// Returns `true` if the connection that produced this error must close.
    pub fn should_close_connection(&self) -> bool {
        match self {
            Self::Transport(e) => e.should_close_transport(),
            Self::Codec(e) => e.is_fatal(),
            Self::Engine(e) => !e.is_transient(),
            Self::Device(_) | Self::Config(_) | Self::Application(_) => false,
        }
    }
}

impl fmt::Display for CherryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Codec(e) => write!(f, "codec error: {}", e),
            Self::Engine(e) => write!(f, "engine error: {}", e),
            Self::Device(e) => write!(f, "device error: {}", e),
            Self::Config(e) => write!(f, "configuration error: {}", e),
            Self::Application(e) => write!(f, "application error: {}", e),
        }
    }
}

impl StdError for CherryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Codec(e) => Some(e),
            Self::Engine(e) => Some(e),
            Self::Device(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Application(e) => Some(e.as_ref()),
        }
    }
}

impl From<TransportError> for CherryError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<CodecError> for CherryError {
    fn from(error: CodecError) -> Self {
        Self::Codec(error)
    }
}

impl From<EngineError> for CherryError {
    fn from(error: EngineError) -> Self {
        Self::Engine(error)
    }
}

impl From<DeviceError> for CherryError {
    fn from(error: DeviceError) -> Self {
        Self::Device(error)
    }
}

impl From<ConfigError> for CherryError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}
