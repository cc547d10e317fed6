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

/// Handshake state of a protocol engine.
///
/// ```text
/// Connected -> HelloSent -> FeaturesRequested -> Established -> Closed
/// ```
///
/// Any state may move directly to `Closed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Transport accepted; nothing sent yet
    Connected,

    /// Hello sent to the switch
    HelloSent,

    /// Features request sent; waiting for the reply
    FeaturesRequested,

    /// Features reply received and the connection registered with the pool
    Established,

    /// Session over; cleanup has run or is running
    Closed,
}

impl EngineState {
    /// Returns `true` if the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: EngineState) -> bool {
        use EngineState::*;
        matches!(
            (self, next),
            (Connected, HelloSent)
                | (HelloSent, FeaturesRequested)
                | (FeaturesRequested, Established)
                | (Connected | HelloSent | FeaturesRequested | Established, Closed)
        )
    }

    /// Returns `true` once the connection is registered with the pool.
    pub fn is_established(self) -> bool {
        self == EngineState::Established
    }

    /// Returns `true` for the terminal state.
    pub fn is_closed(self) -> bool {
        self == EngineState::Closed
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "Connected"),
            Self::HelloSent => write!(f, "HelloSent"),
            Self::FeaturesRequested => write!(f, "FeaturesRequested"),
            Self::Established => write!(f, "Established"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
