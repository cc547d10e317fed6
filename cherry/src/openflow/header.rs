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


//! OpenFlow message header and protocol versions.
//!
//! Every OpenFlow message starts with the same 8-byte header regardless of
//! protocol version:
//!
//! ```text
//! +---------+------+----------------+--------------------+
//! | version | type | length (BE u16)| xid (BE u32)       |
//! +---------+------+----------------+--------------------+
//!    1 byte  1 byte      2 bytes           4 bytes
//! ```
//!
//! `length` covers the whole message including the header.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the OpenFlow header in bytes.
pub const HEADER_LEN: usize = 8;

/// Message type codes shared by every supported OpenFlow version.
pub mod msg_type {
    /// Version negotiation.
    pub const HELLO: u8 = 0;
    /// Error report.
    pub const ERROR: u8 = 1;
    /// Liveness probe.
    pub const ECHO_REQUEST: u8 = 2;
    /// Liveness probe answer.
    pub const ECHO_REPLY: u8 = 3;
    /// Vendor (1.0) or experimenter (1.3) extension.
    pub const EXPERIMENTER: u8 = 4;
    /// Switch capability query.
    pub const FEATURES_REQUEST: u8 = 5;
    /// Switch capability answer.
    pub const FEATURES_REPLY: u8 = 6;
    /// Packet forwarded from the datapath to the controller.
    pub const PACKET_IN: u8 = 10;
}

/// OpenFlow protocol version spoken on a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenFlowVersion {
    /// OpenFlow 1.0, wire version `0x01`.
    #[default]
    #[serde(rename = "1.0")]
    V1_0,
    /// OpenFlow 1.3, wire version `0x04`.
    #[serde(rename = "1.3")]
    V1_3,
}

impl OpenFlowVersion {
    /// Returns the version for a wire version byte, if supported.
    pub fn from_wire(version: u8) -> Option<Self> {
        match version {
            0x01 => Some(Self::V1_0),
            0x04 => Some(Self::V1_3),
            _ => None,
        }
    }

    /// Returns the wire version byte.
    pub fn wire(self) -> u8 {
        match self {
            Self::V1_0 => 0x01,
            Self::V1_3 => 0x04,
        }
    }

    /// Returns the highest message type code defined by this version.
    pub fn max_message_type(self) -> u8 {
        match self {
            // OFPT_QUEUE_GET_CONFIG_REPLY
            Self::V1_0 => 21,
            // OFPT_METER_MOD
            Self::V1_3 => 29,
        }
    }
}

impl fmt::Display for OpenFlowVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1_0 => write!(f, "OpenFlow 1.0"),
            Self::V1_3 => write!(f, "OpenFlow 1.3"),
        }
    }
}

/// Decoded OpenFlow header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Wire version byte.
    pub version: u8,
    /// Message type code.
    pub msg_type: u8,
    /// Total message length including the header.
    pub length: u16,
    /// Transaction ID.
    pub xid: u32,
}

impl Header {
    /// Parses a header from the first [`HEADER_LEN`] bytes of `bytes`.
    ///
    /// Returns `None` if fewer than [`HEADER_LEN`] bytes are available.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let header: &[u8; HEADER_LEN] = bytes.get(..HEADER_LEN)?.try_into().ok()?;
        Some(Self {
            version: header[0],
            msg_type: header[1],
            length: u16::from_be_bytes([header[2], header[3]]),
            xid: u32::from_be_bytes([header[4], header[5], header[6], header[7]]),
        })
    }

    /// Returns the header in wire format.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0] = self.version;
        bytes[1] = self.msg_type;
        bytes[2..4].copy_from_slice(&self.length.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.xid.to_be_bytes());
        bytes
    }
}
