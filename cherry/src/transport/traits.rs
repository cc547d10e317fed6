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


use crate::transport::{TransportError, TransportMetadata};
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};

/// Boxed future returned by [`Transport::shutdown`].
pub type ShutdownFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>>;

/// Byte-stream abstraction over one switch connection.
///
/// The `Transport` trait combines Tokio's `AsyncRead` and `AsyncWrite` with
/// connection metadata and a graceful shutdown. The OpenFlow codec and the
/// protocol engine only ever see a `Transport`, never a concrete socket, so an
/// engine can be driven over TCP in production and over an in-memory pipe in
/// tests.
///
/// # Implementations
///
/// - [`TcpTransport`](crate::transport::TcpTransport): TCP/IP networking
/// - [`MemoryTransport`](crate::transport::MemoryTransport): In-memory pipes for testing
///
/// # Examples
///
/// ```rust
/// use cherry::transport::{MemoryTransport, Transport};
///
/// let (controller_side, _switch_side) = MemoryTransport::pair(16);
/// assert_eq!(controller_side.metadata().transport_type, "memory");
/// ```
pub trait Transport: AsyncRead + AsyncWrite + Send + Sync + Unpin + 'static {
    /// Returns metadata about this transport.
    fn metadata(&self) -> &TransportMetadata;

    /// Gracefully shuts down the transport.
    ///
    /// This flushes pending writes and signals end-of-stream to the peer.
    /// After calling `shutdown()` the transport must not be written to.
    fn shutdown(&mut self) -> ShutdownFuture<'_>;
}
