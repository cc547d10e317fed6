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


//! Transport layer: the byte streams switch connections run over.
//!
//! The [`Transport`] trait defines the interface for bi-directional byte
//! streams, and this module includes two implementations:
//!
//! - [`TcpTransport`]: TCP/IP networking, the way switches reach the controller
//! - [`MemoryTransport`]: In-memory pipes for tests and in-process simulation
//!
//! On top of a transport, [`Stream`] adds the independently settable read and
//! write deadlines the protocol engine relies on: a read timeout is a polling
//! tick, a write timeout ends the session.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cherry::transport::{Stream, TcpTransport};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let listener = TcpTransport::bind("0.0.0.0:6633").await?;
//! let (transport, peer_addr) = TcpTransport::accept(&listener).await?;
//! println!("switch connected from {}", peer_addr);
//!
//! let mut stream = Stream::new(transport);
//! stream.set_read_timeout(Duration::from_secs(1));
//! stream.set_write_timeout(Duration::from_secs(5));
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod stream;
mod tcp;
mod traits;
mod types;

pub use self::error::TransportError;
pub use self::memory::MemoryTransport;
pub use self::stream::{
    DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT, Stream, StreamReader, StreamWriter,
};
pub use self::tcp::TcpTransport;
pub use self::traits::{ShutdownFuture, Transport};
pub use self::types::{TransportId, TransportMetadata};
