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


//! In-memory transport implementation for testing.
//!
//! A [`MemoryTransport`] pair behaves like the two ends of a TCP connection
//! without a socket: bytes written on one end are read on the other, and
//! shutting down one end is observed as end-of-stream by its peer. Tests use
//! it to put a scripted fake switch on the far side of a protocol engine.

use crate::transport::{ShutdownFuture, Transport, TransportId, TransportMetadata};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc;
use tokio_util::sync::PollSender;

/// Default buffer size for memory transport channels.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// In-memory transport implementation.
///
/// # Examples
///
/// ```rust
/// use cherry::transport::MemoryTransport;
/// use tokio::io::{AsyncReadExt, AsyncWriteExt};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (mut controller, mut switch) = MemoryTransport::pair(16);
///
/// switch.write_all(&[0x01, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01]).await?;
///
/// let mut header = [0u8; 8];
/// controller.read_exact(&mut header).await?;
/// assert_eq!(header[0], 0x01);
/// # Ok(())
/// # }
/// ```
pub struct MemoryTransport {
    metadata: TransportMetadata,
    reader: MemoryReader,
    writer: MemoryWriter,
}

/// Reader half of a memory transport.
struct MemoryReader {
    rx: mpsc::Receiver<Vec<u8>>,
    current_chunk: Option<Vec<u8>>,
    chunk_offset: usize,
}

/// Writer half of a memory transport.
///
/// `None` once the transport has been shut down. A full channel parks the
/// writer until the peer reads.
struct MemoryWriter {
    tx: Option<PollSender<Vec<u8>>>,
}

impl MemoryTransport {
    /// Creates a pair of connected memory transports.
    ///
    /// `buffer_size` is the number of writes each direction buffers before
    /// further writes wait for the peer to read.
    pub fn pair(buffer_size: usize) -> (Self, Self) {
        let (tx1, rx1) = mpsc::channel(buffer_size);
        let (tx2, rx2) = mpsc::channel(buffer_size);

        let transport1 = Self {
            metadata: TransportMetadata::new(TransportId::next(), "memory"),
            reader: MemoryReader::new(rx2),
            writer: MemoryWriter {
                tx: Some(PollSender::new(tx1)),
            },
        };

        let transport2 = Self {
            metadata: TransportMetadata::new(TransportId::next(), "memory"),
            reader: MemoryReader::new(rx1),
            writer: MemoryWriter {
                tx: Some(PollSender::new(tx2)),
            },
        };

        (transport1, transport2)
    }

    /// Creates a pair of connected memory transports with default buffer size.
    pub fn pair_default() -> (Self, Self) {
        Self::pair(DEFAULT_BUFFER_SIZE)
    }
}

impl MemoryReader {
    fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            current_chunk: None,
            chunk_offset: 0,
        }
    }
}

impl Transport for MemoryTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn shutdown(&mut self) -> ShutdownFuture<'_> {
        Box::pin(async move {
            self.writer.tx = None;
            Ok(())
        })
    }
}

impl AsyncRead for MemoryTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let reader = &mut self.get_mut().reader;

        if let Some(chunk) = reader.current_chunk.take() {
            let start = reader.chunk_offset;
            let to_read = (chunk.len() - start).min(buf.remaining());
            buf.put_slice(&chunk[start..start + to_read]);

            if start + to_read < chunk.len() {
                reader.chunk_offset = start + to_read;
                reader.current_chunk = Some(chunk);
            } else {
                reader.chunk_offset = 0;
            }

            return Poll::Ready(Ok(()));
        }

        match reader.rx.poll_recv(cx) {
            Poll::Ready(Some(chunk)) => {
                let to_read = chunk.len().min(buf.remaining());
                buf.put_slice(&chunk[..to_read]);

                if to_read < chunk.len() {
                    reader.current_chunk = Some(chunk);
                    reader.chunk_offset = to_read;
                }

                Poll::Ready(Ok(()))
            }
            // Every sender is gone: end-of-stream
            Poll::Ready(None) => Poll::Ready(Ok(())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl AsyncWrite for MemoryTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let Some(tx) = self.get_mut().writer.tx.as_mut() else {
            return Poll::Ready(Err(broken_pipe("memory transport shut down")));
        };

        match tx.poll_reserve(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(_)) => Poll::Ready(Err(broken_pipe("memory transport closed"))),
            Poll::Ready(Ok(())) => match tx.send_item(buf.to_vec()) {
                Ok(()) => Poll::Ready(Ok(buf.len())),
                Err(_) => Poll::Ready(Err(broken_pipe("memory transport closed"))),
            },
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().writer.tx = None;
        Poll::Ready(Ok(()))
    }
}

fn broken_pipe(reason: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, reason)
}
