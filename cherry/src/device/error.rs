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


//! Device send API error types.

use crate::device::{AuxiliaryId, DatapathId};
use crate::openflow::CodecError;
use thiserror::Error;

/// Errors returned to applications sending through a [`Device`](crate::device::Device).
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device has no connection in the requested slot.
    #[error("device {datapath_id} has no {aux_id} connection")]
    NotConnected {
        /// Target device
        datapath_id: DatapathId,
        /// Requested slot
        aux_id: AuxiliaryId,
    },

    /// The message was built for a different protocol version than the
    /// connection speaks.
    #[error("message version {actual:#04x} does not match connection version {expected:#04x}")]
    VersionMismatch {
        /// Wire version of the connection
        expected: u8,
        /// Wire version of the message
        actual: u8,
    },

    /// The connection has been closed by its engine.
    #[error("connection closed")]
    Closed,

    /// Encoding or writing the message failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl DeviceError {
    /// Returns `true` if retrying through another slot or after a
    /// reconnect could succeed.
    pub fn is_connection_error(&self) -> bool {
        match self {
            DeviceError::NotConnected { .. } | DeviceError::Closed => true,
            DeviceError::Codec(error) => error.is_fatal(),
            DeviceError::VersionMismatch { .. } => false,
        }
    }
}
