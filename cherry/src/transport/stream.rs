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


//! Timeout-bounded stream over a [`Transport`].
//!
//! A [`Stream`] owns one switch connection and carries two independent
//! deadlines: the read timeout bounds how long a single read may block, and
//! the write timeout bounds how long a single write may take. Once both are
//! configured the stream is split into a [`StreamReader`], owned by the
//! engine's reader task, and a [`StreamWriter`], shared by everything that
//! sends on the connection.

use crate::transport::{Transport, TransportError, TransportMetadata};
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};

/// Default read timeout applied to a new stream.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Default write timeout applied to a new stream.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Initial capacity of the read buffer.
const READ_BUFFER_CAPACITY: usize = 4096;

type BoxedTransport = Box<dyn Transport>;

/// A transport with independently settable read and write timeouts.
///
/// # Examples
///
/// ```rust
/// use cherry::transport::{MemoryTransport, Stream};
/// use std::time::Duration;
///
/// let (transport, _peer) = MemoryTransport::pair(16);
/// let mut stream = Stream::new(transport);
/// stream.set_read_timeout(Duration::from_millis(500));
/// stream.set_write_timeout(Duration::from_secs(2));
///
/// let (reader, writer) = stream.into_split();
/// assert_eq!(reader.read_timeout(), Duration::from_millis(500));
/// assert_eq!(writer.write_timeout(), Duration::from_secs(2));
/// ```
pub struct Stream {
    transport: BoxedTransport,
    metadata: TransportMetadata,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl Stream {
    /// Wraps a transport with the default timeouts.
    pub fn new(transport: impl Transport) -> Self {
        let metadata = transport.metadata().clone();
        Self {
            transport: Box::new(transport),
            metadata,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Returns metadata about the underlying transport.
    pub fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    /// Sets the deadline for a single read.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    /// Sets the deadline for a single write.
    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.write_timeout = timeout;
    }

    /// Returns the read deadline.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Returns the write deadline.
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Splits the stream into a reader and a writer carrying their timeouts.
    pub fn into_split(self) -> (StreamReader, StreamWriter) {
        let (read_half, write_half) = tokio::io::split(self.transport);

        let reader = StreamReader {
            inner: read_half,
            buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            read_timeout: self.read_timeout,
            metadata: self.metadata.clone(),
        };
        let writer = StreamWriter {
            inner: write_half,
            write_timeout: self.write_timeout,
            metadata: self.metadata,
        };

        (reader, writer)
    }
}

/// Read half of a [`Stream`].
///
/// Received bytes accumulate in an internal buffer until the codec consumes a
/// complete message, so a read that times out in the middle of a message
/// loses nothing.
pub struct StreamReader {
    inner: ReadHalf<BoxedTransport>,
    buffer: BytesMut,
    read_timeout: Duration,
    metadata: TransportMetadata,
}

impl StreamReader {
    /// Returns metadata about the underlying transport.
    pub fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    /// Returns the read deadline.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Returns the bytes received but not yet consumed.
    pub fn buffer(&self) -> &BytesMut {
        &self.buffer
    }

    /// Returns the receive buffer for the codec to consume from.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Reads more bytes into the receive buffer.
    ///
    /// Cancelling the returned future never loses received bytes.
    ///
    /// # Errors
    ///
    /// - [`TransportError::ReadTimeout`] if nothing arrived within the read timeout
    /// - [`TransportError::ConnectionLost`] if the peer closed the stream
    /// - [`TransportError::ReadFailed`] for any other I/O failure
    pub async fn fill_buf(&mut self) -> Result<usize, TransportError> {
        let duration = self.read_timeout;
        if self.buffer.capacity() == self.buffer.len() {
            self.buffer.reserve(READ_BUFFER_CAPACITY);
        }

        match tokio::time::timeout(duration, self.inner.read_buf(&mut self.buffer)).await {
            Err(_) => Err(TransportError::ReadTimeout { duration }),
            Ok(Ok(0)) => Err(TransportError::ConnectionLost {
                reason: if self.buffer.is_empty() {
                    "end of stream".to_string()
                } else {
                    format!("end of stream with {} unread bytes", self.buffer.len())
                },
            }),
            Ok(Ok(n)) => Ok(n),
            Ok(Err(source)) => Err(TransportError::ReadFailed { source }),
        }
    }
}

/// Write half of a [`Stream`].
pub struct StreamWriter {
    inner: WriteHalf<BoxedTransport>,
    write_timeout: Duration,
    metadata: TransportMetadata,
}

impl StreamWriter {
    /// Returns metadata about the underlying transport.
    pub fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    /// Returns the write deadline.
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Writes and flushes `bytes` within the write timeout.
    ///
    /// # Errors
    ///
    /// - [`TransportError::WriteTimeout`] if the write did not complete in time
    /// - [`TransportError::WriteFailed`] for any I/O failure
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let duration = self.write_timeout;
        let inner = &mut self.inner;
        let write = async move {
            inner.write_all(bytes).await?;
            inner.flush().await
        };

        match tokio::time::timeout(duration, write).await {
            Err(_) => Err(TransportError::WriteTimeout { duration }),
            Ok(Err(source)) => Err(TransportError::WriteFailed { source }),
            Ok(Ok(())) => Ok(()),
        }
    }

    /// Shuts down the write direction, signalling end-of-stream to the peer.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.inner
            .shutdown()
            .await
            .map_err(|source| TransportError::Io { source })
    }
}
