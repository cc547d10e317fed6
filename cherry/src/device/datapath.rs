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

/// 64-bit identity a switch reports for itself in its features reply.
///
/// Displayed as eight colon-separated hex octets, the way switches print it.
///
/// # Examples
///
/// ```rust
/// use cherry::device::DatapathId;
///
/// let dpid = DatapathId::new(0x0000_0a0b_0c0d_0e0f);
/// assert_eq!(dpid.to_string(), "00:00:0a:0b:0c:0d:0e:0f");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatapathId(u64);

impl DatapathId {
    /// Wraps a raw datapath ID.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw datapath ID.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for DatapathId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DatapathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.to_be_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", octet)?;
        }
        Ok(())
    }
}

/// Connection slot index on a device: 0 is the main connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AuxiliaryId(u8);

impl AuxiliaryId {
    /// The main connection.
    pub const MAIN: AuxiliaryId = AuxiliaryId(0);

    /// Wraps a raw auxiliary ID.
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the raw auxiliary ID.
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Returns `true` for the main connection.
    pub const fn is_main(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AuxiliaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_main() {
            write!(f, "main")
        } else {
            write!(f, "aux{}", self.0)
        }
    }
}
