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


//! Connection handle stored in a device slot.

use crate::device::DeviceError;
use crate::engine::TransactionIdGenerator;
use crate::openflow::{CodecError, MAX_MESSAGE_SIZE, Message, OpenFlowVersion, write_message};
use crate::transport::{StreamWriter, TransportError, TransportId};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Write side of one switch connection.
///
/// A protocol engine creates the connection when it splits its stream and
/// shares it with the [`Device`](crate::device::Device) once the handshake
/// completes. The engine's dispatch loop, its keepalive task and every
/// application sending through the device write through the same handle, so
/// writes are serialized by an async mutex and all of them draw transaction
/// IDs from one generator.
pub struct Connection {
    id: TransportId,
    version: OpenFlowVersion,
    max_message_size: usize,
    writer: Mutex<StreamWriter>,
    xids: TransactionIdGenerator,
    closed: AtomicBool,
}

impl Connection {
    /// Wraps the write half of a connection speaking `version`.
    pub fn new(writer: StreamWriter, version: OpenFlowVersion) -> Self {
        Self {
            id: writer.metadata().id,
            version,
            max_message_size: MAX_MESSAGE_SIZE,
            writer: Mutex::new(writer),
            xids: TransactionIdGenerator::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Sets the largest message this connection will send.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Returns the ID of the transport underneath.
    pub fn id(&self) -> TransportId {
        self.id
    }

    /// Returns the protocol version spoken on this connection.
    pub fn version(&self) -> OpenFlowVersion {
        self.version
    }

    /// Draws a fresh transaction ID.
    pub fn next_xid(&self) -> u32 {
        self.xids.next()
    }

    /// Returns `true` once the owning engine has closed the connection.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Writes `message` as-is.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the connection is closed or the write
    /// failed. Any error other than an oversized message is fatal to the
    /// connection.
    pub async fn write(&self, message: &Message) -> Result<(), CodecError> {
        if self.is_closed() {
            return Err(CodecError::Transport(TransportError::Closed));
        }
        let mut writer = self.writer.lock().await;
        write_message(&mut writer, message, self.max_message_size).await
    }

    /// Sends an application message, returning the transaction ID it went
    /// out with.
    ///
    /// A message with transaction ID 0 is given a fresh one.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::VersionMismatch`] if the message is for another version
    /// - [`DeviceError::Closed`] if the engine has closed the connection
    /// - [`DeviceError::Codec`] if encoding or writing failed
    pub async fn send(&self, mut message: Message) -> Result<u32, DeviceError> {
        let expected = self.version.wire();
        if message.version() != expected {
            return Err(DeviceError::VersionMismatch {
                expected,
                actual: message.version(),
            });
        }
        if self.is_closed() {
            return Err(DeviceError::Closed);
        }
        if message.xid() == 0 {
            message.set_xid(self.next_xid());
        }

        self.write(&message).await?;
        Ok(message.xid())
    }

    /// Marks the connection closed and shuts down its write direction.
    ///
    /// Returns `false` if it was already closed.
    pub(crate) async fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let mut writer = self.writer.lock().await;
        if let Err(_error) = writer.shutdown().await {
            #[cfg(feature = "tracing")]
            tracing::debug!(connection = %self.id, error = %_error, "shutdown after close failed");
        }
        true
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("closed", &self.is_closed())
            .finish()
    }
}
