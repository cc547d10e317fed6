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


//! Transaction ID generation for request-reply correlation.

use std::sync::atomic::{AtomicU32, Ordering};

/// Generates OpenFlow transaction IDs for one connection.
///
/// Transaction IDs match a switch's reply to the request that caused it.
/// Every message the controller originates on a connection draws a fresh ID
/// from that connection's generator.
///
/// # Thread Safety
///
/// The dispatch loop, the keepalive task and any number of applications
/// sending through a device share one generator. It uses a single atomic
/// and never locks.
///
/// # ID Space
///
/// IDs start at 1 and increment monotonically, wrapping within the 32-bit
/// header field. ID 0 is reserved for unsolicited messages and is skipped on
/// wraparound, so an ID is not reissued until all 2^32 - 1 others have been.
///
/// # Example
///
/// ```rust
/// use cherry::engine::TransactionIdGenerator;
///
/// let generator = TransactionIdGenerator::new();
/// assert_eq!(generator.next(), 1);
/// assert_eq!(generator.next(), 2);
/// ```
#[derive(Debug)]
pub struct TransactionIdGenerator {
    next_id: AtomicU32,
}

impl TransactionIdGenerator {
    /// Creates a generator whose first ID is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a generator whose first ID is `first`, or 1 if `first` is 0.
    #[must_use]
    pub fn starting_at(first: u32) -> Self {
        Self {
            next_id: AtomicU32::new(first.max(1)),
        }
    }

    /// Returns the next transaction ID. Never returns 0.
    #[must_use]
    pub fn next(&self) -> u32 {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return id;
            }
        }
    }

    /// Returns the ID the next call would try, without consuming it.
    #[must_use]
    pub fn current(&self) -> u32 {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl Default for TransactionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
