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


use crate::device::{DatapathId, Device};
use crate::openflow::PacketIn;
use std::sync::Arc;

/// Error an application reports from an event callback.
pub type ApplicationError = Box<dyn std::error::Error + Send + Sync>;

/// A northbound application.
///
/// Every callback has a no-op default, so an application implements only
/// the events it cares about. Applications talk back to switches through
/// [`Device::send_message`].
///
/// # Examples
///
/// ```rust
/// use cherry::device::Device;
/// use cherry::northbound::{Application, ApplicationError};
/// use cherry::openflow::PacketIn;
/// use std::sync::Arc;
///
/// struct PacketCounter(std::sync::atomic::AtomicU64);
///
/// #[async_trait::async_trait]
/// impl Application for PacketCounter {
///     fn name(&self) -> &str {
///         "packet-counter"
///     }
///
///     async fn on_packet_in(
///         &self,
///         _device: &Arc<Device>,
///         _packet: &PacketIn,
///     ) -> Result<(), ApplicationError> {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         Ok(())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Application: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// A switch completed its first handshake.
    async fn on_device_up(&self, _device: &Arc<Device>) -> Result<(), ApplicationError> {
        Ok(())
    }

    /// A switch left the pool.
    async fn on_device_down(&self, _datapath_id: DatapathId) -> Result<(), ApplicationError> {
        Ok(())
    }

    /// A switch forwarded a packet to the controller.
    async fn on_packet_in(
        &self,
        _device: &Arc<Device>,
        _packet: &PacketIn,
    ) -> Result<(), ApplicationError> {
        Ok(())
    }
}
