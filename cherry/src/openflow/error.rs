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


//! Message codec error types.

use crate::transport::TransportError;
use thiserror::Error;

/// How a codec failure affects the session that observed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    /// No complete message arrived within the read timeout; retry.
    Timeout,
    /// A message the codec does not understand was skipped; continue.
    Unsupported,
    /// The stream is unusable; end the session.
    Fatal,
}

/// Errors produced while reading or writing OpenFlow messages.
///
/// # Examples
///
/// ```rust
/// use cherry::openflow::{CodecError, CodecErrorKind};
///
/// let error = CodecError::Unsupported { version: 0x01, msg_type: 42 };
/// assert_eq!(error.kind(), CodecErrorKind::Unsupported);
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying transport failed or timed out.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message of a known version carried a type code that version does
    /// not define. Its bytes were consumed.
    #[error("unsupported message type {msg_type} for wire version {version:#04x}")]
    Unsupported {
        /// Wire version byte
        version: u8,
        /// Message type code
        msg_type: u8,
    },

    /// The header declared a length outside the accepted range.
    #[error("invalid message length {length} (accepted {min}..={max})")]
    InvalidLength {
        /// Declared length
        length: usize,
        /// Smallest accepted length
        min: usize,
        /// Largest accepted length
        max: usize,
    },

    /// A message body is too short for its type.
    #[error("malformed message type {msg_type}: {reason}")]
    Malformed {
        /// Message type code
        msg_type: u8,
        /// What was wrong with the body
        reason: String,
    },
}

impl CodecError {
    /// Classifies this error for the read loop.
    pub fn kind(&self) -> CodecErrorKind {
        match self {
            CodecError::Transport(error) if error.is_read_timeout() => CodecErrorKind::Timeout,
            CodecError::Unsupported { .. } => CodecErrorKind::Unsupported,
            CodecError::Transport(_)
            | CodecError::InvalidLength { .. }
            | CodecError::Malformed { .. } => CodecErrorKind::Fatal,
        }
    }

    /// Returns `true` if the session must end.
    pub fn is_fatal(&self) -> bool {
        self.kind() == CodecErrorKind::Fatal
    }
}

/// A version strategy could not interpret a message of the type it claimed.
#[derive(Debug, Error)]
pub enum ProtocolDecodeError {
    /// The message body is not the variant the strategy expected.
    #[error("expected {expected}, got message type {msg_type}")]
    UnexpectedBody {
        /// What the strategy expected
        expected: &'static str,
        /// Message type code received
        msg_type: u8,
    },

    /// The body is shorter than the version's layout requires.
    #[error("{message} body too short: {actual} bytes, need at least {required}")]
    Truncated {
        /// Message name
        message: &'static str,
        /// Bytes required
        required: usize,
        /// Bytes available
        actual: usize,
    },

    /// The message belongs to a different protocol version.
    #[error("wire version {actual:#04x} does not match {expected:#04x}")]
    WrongVersion {
        /// Version the strategy speaks
        expected: u8,
        /// Version on the message
        actual: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_read_timeout_is_timeout_kind() {
        let error = CodecError::from(TransportError::ReadTimeout {
            duration: Duration::from_secs(1),
        });
        assert_eq!(error.kind(), CodecErrorKind::Timeout);
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_write_timeout_is_fatal() {
        let error = CodecError::from(TransportError::WriteTimeout {
            duration: Duration::from_secs(5),
        });
        assert!(error.is_fatal());
    }

    #[test]
    fn test_length_and_body_errors_are_fatal() {
        let length = CodecError::InvalidLength {
            length: 4,
            min: 8,
            max: 65535,
        };
        assert!(length.is_fatal());

        let malformed = CodecError::Malformed {
            msg_type: 1,
            reason: "missing error code".into(),
        };
        assert!(malformed.is_fatal());
    }

    #[test]
    fn test_protocol_decode_error_display() {
        let error = ProtocolDecodeError::Truncated {
            message: "features reply",
            required: 24,
            actual: 10,
        };
        assert_eq!(
            error.to_string(),
            "features reply body too short: 10 bytes, need at least 24"
        );
    }
}
