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


#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod controller;
pub mod device;
pub mod engine;
pub mod error;
pub mod northbound;
pub mod observability;
pub mod openflow;
pub mod transport;

pub use controller::{Controller, ControllerConfig};
pub use device::{AuxiliaryId, DatapathId, Device, DevicePool};
pub use engine::{EngineConfig, EngineError, EngineState, ProtocolStrategy, Transceiver};
pub use error::CherryError;
pub use northbound::{Application, DeviceObserver, Dispatcher};
pub use observability::{EngineMetrics, log_error};
pub use openflow::{Message, OpenFlowVersion};
pub use transport::{Transport, TransportError};
