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


//! OpenFlow wire format.
//!
//! This module covers what the connection core needs from the protocol: the
//! common header, the handful of message types every version shares, and
//! framing over a [`Stream`](crate::transport::Stream). Version-specific
//! layouts (features reply, packet-in) are interpreted by the engine's
//! version strategies.
//!
//! # Examples
//!
//! ```rust
//! use cherry::openflow::{decode, Message, MessageBody, MAX_MESSAGE_SIZE};
//! use bytes::{Bytes, BytesMut};
//!
//! let hello = Message::new(0x04, 1, MessageBody::Hello(Bytes::new()));
//!
//! let mut buffer = BytesMut::new();
//! hello.encode(&mut buffer, MAX_MESSAGE_SIZE).unwrap();
//!
//! let decoded = decode(&mut buffer, MAX_MESSAGE_SIZE).unwrap();
//! assert_eq!(decoded, Some(hello));
//! ```

mod codec;
mod error;
mod header;
mod message;

pub use codec::{MAX_MESSAGE_SIZE, decode, read_message, write_message};
pub use error::{CodecError, CodecErrorKind, ProtocolDecodeError};
pub use header::{HEADER_LEN, Header, OpenFlowVersion, msg_type};
pub use message::{Message, MessageBody, NO_BUFFER, PacketIn};
