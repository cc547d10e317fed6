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


//! Protocol engine error types.

use crate::engine::ConfigError;
use crate::openflow::{CodecError, ProtocolDecodeError};
use thiserror::Error;

/// Why a protocol engine stopped.
///
/// Every variant ends the session that produced it and no other. The
/// classification methods follow the engine's error taxonomy:
///
/// | Class | Variants |
/// |---|---|
/// | transient | [`Codec`](Self::Codec) with a timeout or unsupported kind |
/// | protocol violation | [`VersionMismatch`](Self::VersionMismatch), [`Decode`](Self::Decode) |
/// | transport fatal | [`Codec`](Self::Codec) with a fatal kind |
/// | handshake fatal | [`Handshake`](Self::Handshake) |
///
/// # Examples
///
/// ```rust
/// use cherry::engine::EngineError;
///
/// let error = EngineError::VersionMismatch { expected: 0x01, received: 0x04 };
/// assert!(error.is_protocol_violation());
/// assert!(!error.is_transient());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Reading or writing the connection failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The switch sent a message for a different protocol version.
    #[error("version mismatch: engine speaks {expected:#04x}, received {received:#04x}")]
    VersionMismatch {
        /// Wire version of the engine
        expected: u8,
        /// Wire version on the message
        received: u8,
    },

    /// A message could not be interpreted as the type it claimed.
    #[error("protocol decode error: {0}")]
    Decode(#[from] ProtocolDecodeError),

    /// An opening handshake message could not be sent.
    #[error("handshake failed sending {step}: {source}")]
    Handshake {
        /// Which message failed
        step: &'static str,
        /// Underlying failure
        #[source]
        source: CodecError,
    },

    /// The engine configuration was rejected.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    /// `run` was called on an engine that already ran or was cleaned up.
    #[error("engine already started or cleaned up")]
    AlreadyStarted,

    /// A background task of the engine panicked.
    #[error("{task} task failed: {reason}")]
    TaskFailed {
        /// Which task
        task: &'static str,
        /// Panic or join failure description
        reason: String,
    },
}

impl EngineError {
    /// Returns `true` for failures the engine normally absorbs.
    ///
    /// A session never ends on these; the method exists so that callers
    /// classifying a [`CodecError`] wrapped in an `EngineError` get the same
    /// answer as the read loop does.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Codec(error) if !error.is_fatal())
    }

    /// Returns `true` if the switch broke the protocol.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            EngineError::VersionMismatch { .. } | EngineError::Decode(_)
        )
    }

    /// Returns `true` if the connection itself failed.
    pub fn is_transport_fatal(&self) -> bool {
        matches!(self, EngineError::Codec(error) if error.is_fatal())
    }

    /// Returns `true` if the session failed before the handshake went out.
    pub fn is_handshake_fatal(&self) -> bool {
        matches!(self, EngineError::Handshake { .. })
    }
}
