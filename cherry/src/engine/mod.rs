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


//! The OpenFlow protocol engine.
//!
//! One [`Transceiver`] runs per switch connection. It performs the
//! handshake, keeps the connection alive with echo requests, answers the
//! switch's echo requests, and forwards packet-ins to a
//! [`DeviceObserver`](crate::northbound::DeviceObserver). Everything that
//! differs between protocol versions sits behind [`ProtocolStrategy`].
//!
//! ```text
//! CONNECTED --hello--> HELLO_SENT --features request--> FEATURES_REQUESTED
//!                                                              |
//!                                                       features reply
//!                                                              v
//!                        CLOSED <--error/cancel/EOF-- ESTABLISHED
//! ```

mod config;
mod error;
mod state;
mod strategy;
mod transceiver;
mod xid;

pub use config::{ConfigError, EngineConfig};
pub use error::EngineError;
pub use state::EngineState;
pub use strategy::{Features, MessageKind, OpenFlow10, OpenFlow13, ProtocolStrategy, strategy_for};
pub use transceiver::Transceiver;
pub use xid::TransactionIdGenerator;
