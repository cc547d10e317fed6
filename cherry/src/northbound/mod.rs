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


//! Northbound interface.
//!
//! Protocol engines report device and packet events to a single
//! [`DeviceObserver`]. Hosting several applications is the job of the
//! [`Dispatcher`], an observer that forwards each event to every registered
//! [`Application`] in turn.

mod application;
mod dispatcher;
mod observer;

pub use application::{Application, ApplicationError};
pub use dispatcher::Dispatcher;
pub use observer::DeviceObserver;
