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


use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for transport IDs, shared by every transport kind.
static NEXT_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transport connection.
///
/// Transport IDs identify one switch connection in log output and let the
/// device layer tell two connections to the same switch apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransportId(u64);

impl TransportId {
    /// Creates a transport ID from a raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide unique transport ID.
    pub fn next() -> Self {
        Self(NEXT_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport({})", self.0)
    }
}

/// Metadata associated with a transport connection.
///
/// This provides information about the transport that can be used for
/// logging and debugging.
#[derive(Debug, Clone)]
pub struct TransportMetadata {
    /// Unique identifier for this transport
    pub id: TransportId,

    /// Local address of the connection, if available
    pub local_addr: Option<SocketAddr>,

    /// Remote peer address, if available
    pub peer_addr: Option<SocketAddr>,

    /// Transport type (e.g., "tcp", "memory")
    pub transport_type: String,

    /// When the transport was created
    pub created_at: std::time::Instant,
}

impl TransportMetadata {
    /// Creates new transport metadata.
    pub fn new(id: TransportId, transport_type: impl Into<String>) -> Self {
        Self {
            id,
            local_addr: None,
            peer_addr: None,
            transport_type: transport_type.into(),
            created_at: std::time::Instant::now(),
        }
    }

    /// Sets the local address.
    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    /// Sets the peer address.
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Returns the age of this transport.
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

impl fmt::Display for TransportMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peer_addr {
            Some(peer) => write!(f, "{} {} peer={}", self.transport_type, self.id, peer),
            None => write!(f, "{} {}", self.transport_type, self.id),
        }
    }
}
