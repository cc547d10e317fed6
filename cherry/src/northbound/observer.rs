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

/// Receives device lifecycle and packet events from protocol engines.
///
/// An engine calls [`on_device_up`](Self::on_device_up) when its handshake
/// created a new device, [`on_device_down`](Self::on_device_down) when its
/// cleanup detached the device's last connection, and
/// [`on_packet_in`](Self::on_packet_in) for every packet-in received after
/// the handshake. Callbacks run on the engine's dispatch loop, so a slow
/// observer delays that engine's message processing.
#[async_trait::async_trait]
pub trait DeviceObserver: Send + Sync {
    /// A switch completed its first handshake.
    async fn on_device_up(&self, device: &Arc<Device>);

    /// A switch lost its last connection and left the pool.
    async fn on_device_down(&self, datapath_id: DatapathId);

    /// A switch forwarded a packet to the controller.
    async fn on_packet_in(&self, device: &Arc<Device>, packet: &PacketIn);
}
