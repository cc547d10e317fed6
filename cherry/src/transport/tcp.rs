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


//! TCP transport implementation.
//!
//! OpenFlow switches dial the controller, so the controller side mostly
//! accepts: [`TcpTransport::bind`] plus [`TcpTransport::accept`]. The
//! [`TcpTransport::connect`] direction exists for tests and for tools that
//! impersonate a switch.

use crate::transport::{ShutdownFuture, Transport, TransportError, TransportId, TransportMetadata};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};

/// TCP transport implementation.
///
/// `TcpTransport` wraps a Tokio `TcpStream` and implements the [`Transport`]
/// trait. `TCP_NODELAY` is enabled on accepted and connected streams, since
/// OpenFlow control traffic is made of small, latency-sensitive messages.
pub struct TcpTransport {
    stream: TcpStream,
    metadata: TransportMetadata,
}

impl TcpTransport {
    /// Creates a new TCP transport from an existing stream.
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        let id = TransportId::next();
        let local_addr = stream.local_addr()?;
        let peer_addr = stream.peer_addr()?;
        stream.set_nodelay(true)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(transport_id = %id, %local_addr, %peer_addr, "created TCP transport");

        let metadata = TransportMetadata::new(id, "tcp")
            .with_local_addr(local_addr)
            .with_peer_addr(peer_addr);

        Ok(Self { stream, metadata })
    }

    /// Connects to a remote TCP endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError::ConnectionFailed`] if the connection cannot
    /// be established.
    pub async fn connect(addr: impl Into<String>) -> Result<Self, TransportError> {
        let address = addr.into();

        let stream = TcpStream::connect(&address).await.map_err(|source| {
            #[cfg(feature = "tracing")]
            tracing::error!(%address, "failed to connect: {}", source);
            TransportError::ConnectionFailed {
                address: address.clone(),
                source,
            }
        })?;

        Self::from_stream(stream).map_err(|source| TransportError::Io { source })
    }

    /// Binds to a local address and listens for incoming switch connections.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError::BindFailed`] if the address cannot be bound.
    pub async fn bind(addr: impl Into<String>) -> Result<TcpListener, TransportError> {
        let address = addr.into();

        let listener = TcpListener::bind(&address).await.map_err(|source| {
            #[cfg(feature = "tracing")]
            tracing::error!(%address, "failed to bind: {}", source);
            TransportError::BindFailed {
                address: address.clone(),
                source,
            }
        })?;

        #[cfg(feature = "tracing")]
        tracing::info!(%address, "TCP listener bound");

        Ok(listener)
    }

    /// Accepts an incoming connection from a listener.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError::Io`] if accepting the connection fails.
    pub async fn accept(listener: &TcpListener) -> Result<(Self, SocketAddr), TransportError> {
        let (stream, peer_addr) = listener
            .accept()
            .await
            .map_err(|source| TransportError::Io { source })?;

        #[cfg(feature = "tracing")]
        tracing::info!(%peer_addr, "accepted TCP connection");

        let transport = Self::from_stream(stream).map_err(|source| TransportError::Io { source })?;

        Ok((transport, peer_addr))
    }

    /// Returns the local address of this transport.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    /// Returns the peer address of this transport.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Sets the TCP_NODELAY option on the underlying socket.
    pub fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        self.stream.set_nodelay(nodelay)
    }

    /// Gets the TCP_NODELAY option on the underlying socket.
    pub fn nodelay(&self) -> io::Result<bool> {
        self.stream.nodelay()
    }
}

impl Transport for TcpTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn shutdown(&mut self) -> ShutdownFuture<'_> {
        Box::pin(async move {
            use tokio::io::AsyncWriteExt;

            self.stream
                .shutdown()
                .await
                .map_err(|source| TransportError::Io { source })
        })
    }
}

impl AsyncRead for TcpTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for TcpTransport {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}
