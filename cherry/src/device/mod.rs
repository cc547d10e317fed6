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


//! Devices and the device pool.
//!
//! A [`Device`] is one switch as applications see it: an identity, the
//! attributes it reported during the handshake, and one [`Connection`] per
//! live channel (slot 0 is the main connection, higher slots are auxiliary
//! channels). The [`DevicePool`] is the registry engines attach their
//! connections to once the handshake completes and detach them from when
//! the session ends.
//!
//! # Examples
//!
//! ```rust
//! use cherry::device::{AuxiliaryId, Connection, DatapathId, DevicePool};
//! use cherry::openflow::OpenFlowVersion;
//! use cherry::transport::{MemoryTransport, Stream};
//! use std::sync::Arc;
//!
//! let (controller, _switch) = MemoryTransport::pair(16);
//! let (_reader, writer) = Stream::new(controller).into_split();
//! let connection = Arc::new(Connection::new(writer, OpenFlowVersion::V1_3));
//!
//! let pool = DevicePool::new();
//! let dpid = DatapathId::new(0x1);
//! pool.add_connection(dpid, AuxiliaryId::MAIN, connection);
//!
//! let device = pool.lookup(dpid).unwrap();
//! assert!(device.is_operational());
//! assert_eq!(pool.remove_connection(dpid, AuxiliaryId::MAIN), 0);
//! assert!(pool.lookup(dpid).is_none());
//! ```

mod connection;
mod datapath;
#[allow(clippy::module_inception)]
mod device;
mod error;
mod pool;

pub use connection::Connection;
pub use datapath::{AuxiliaryId, DatapathId};
pub use device::{Device, DeviceDescription};
pub use error::DeviceError;
pub use pool::{DevicePool, Registration};
