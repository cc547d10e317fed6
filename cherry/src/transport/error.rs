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


//! Transport layer error types.
//!
//! Transport errors are the lowest level of the error hierarchy and represent
//! failures of the byte stream underneath an OpenFlow session.
//!
//! # Error Categories
//!
//! - **Connection errors**: failed to establish, bind or accept a connection
//! - **I/O errors**: read/write failures on an established connection
//! - **Timeout errors**: a read or write exceeded its deadline
//!
//! A read timeout is the only transport error an engine survives: it bounds
//! how long the reader blocks and is otherwise a polling tick. Every other
//! transport error ends the session that observed it.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the transport layer.
///
/// # Examples
///
/// ```rust
/// use cherry::transport::TransportError;
/// use std::time::Duration;
///
/// let error = TransportError::ReadTimeout { duration: Duration::from_secs(1) };
/// assert!(error.is_read_timeout());
/// assert!(!error.should_close_transport());
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the remote endpoint.
    #[error("failed to connect to {address}: {source}")]
    ConnectionFailed {
        /// The address that failed to connect
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The peer closed the connection.
    ///
    /// Reported when a read returns end-of-stream, including in the middle of
    /// a partially received message.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of why the connection was lost
        reason: String,
    },

    /// Failed to read from the transport.
    #[error("read failed: {source}")]
    ReadFailed {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Failed to write to the transport.
    #[error("write failed: {source}")]
    WriteFailed {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// No data arrived within the read timeout.
    #[error("read timed out after {duration:?}")]
    ReadTimeout {
        /// The read deadline that was exceeded
        duration: Duration,
    },

    /// A write did not complete within the write timeout.
    #[error("write timed out after {duration:?}")]
    WriteTimeout {
        /// The write deadline that was exceeded
        duration: Duration,
    },

    /// Transport is already closed.
    #[error("transport is closed")]
    Closed,

    /// Failed to bind to the specified address.
    #[error("failed to bind to {address}: {source}")]
    BindFailed {
        /// The address that failed to bind
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An unexpected I/O error occurred.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Returns `true` if this is a read timeout.
    ///
    /// Read timeouts are expected while a switch is idle and are never
    /// treated as a session failure.
    pub fn is_read_timeout(&self) -> bool {
        matches!(self, TransportError::ReadTimeout { .. })
    }

    /// Returns `true` if this error indicates the transport should be closed.
    pub fn should_close_transport(&self) -> bool {
        match self {
            TransportError::ReadTimeout { .. } => false,

            TransportError::ReadFailed { source }
            | TransportError::WriteFailed { source }
            | TransportError::Io { source } => !matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
            ),

            TransportError::ConnectionLost { .. }
            | TransportError::WriteTimeout { .. }
            | TransportError::Closed => true,

            // These happen before there is a transport to close
            TransportError::ConnectionFailed { .. } | TransportError::BindFailed { .. } => false,
        }
    }

    /// Create a connection lost error for testing.
    #[cfg(test)]
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        TransportError::ConnectionLost {
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io { source: error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_timeout_keeps_transport_open() {
        let error = TransportError::ReadTimeout {
            duration: Duration::from_secs(1),
        };
        assert!(error.is_read_timeout());
        assert!(!error.should_close_transport());
    }

    #[test]
    fn test_write_timeout_closes_transport() {
        let error = TransportError::WriteTimeout {
            duration: Duration::from_secs(5),
        };
        assert!(!error.is_read_timeout());
        assert!(error.should_close_transport());
    }

    #[test]
    fn test_connection_lost_closes_transport() {
        let error = TransportError::connection_lost("peer reset");
        assert!(error.should_close_transport());
        assert_eq!(error.to_string(), "connection lost: peer reset");
    }

    #[test]
    fn test_interrupted_io_is_transient() {
        let error = TransportError::ReadFailed {
            source: io::Error::new(io::ErrorKind::Interrupted, "signal"),
        };
        assert!(!error.should_close_transport());

        let error = TransportError::WriteFailed {
            source: io::Error::new(io::ErrorKind::BrokenPipe, "pipe"),
        };
        assert!(error.should_close_transport());
    }

    #[test]
    fn test_from_io_error() {
        let error: TransportError = io::Error::other("boom").into();
        assert!(matches!(error, TransportError::Io { .. }));
    }
}
