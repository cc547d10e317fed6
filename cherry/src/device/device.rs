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


use crate::device::{AuxiliaryId, Connection, DatapathId, DeviceError};
use crate::engine::Features;
use crate::openflow::{Message, OpenFlowVersion};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Switch attributes learned from the features reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescription {
    /// Packets the switch can buffer
    pub n_buffers: u32,
    /// Flow tables the datapath supports
    pub n_tables: u8,
    /// Capability bitmap
    pub capabilities: u32,
}

impl From<&Features> for DeviceDescription {
    fn from(features: &Features) -> Self {
        Self {
            n_buffers: features.n_buffers,
            n_tables: features.n_tables,
            capabilities: features.capabilities,
        }
    }
}

/// One switch as applications see it.
///
/// A device aggregates the live connections to a switch, indexed by
/// auxiliary ID, and routes application messages to them. Devices are
/// created and destroyed by the [`DevicePool`](crate::device::DevicePool);
/// only the pool attaches or detaches connection slots.
pub struct Device {
    datapath_id: DatapathId,
    description: RwLock<Option<DeviceDescription>>,
    connections: RwLock<BTreeMap<AuxiliaryId, Arc<Connection>>>,
}

impl Device {
    pub(crate) fn new(datapath_id: DatapathId) -> Self {
        Self {
            datapath_id,
            description: RwLock::new(None),
            connections: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the switch identity.
    pub fn datapath_id(&self) -> DatapathId {
        self.datapath_id
    }

    /// Returns the attributes from the latest handshake, if any.
    pub fn description(&self) -> Option<DeviceDescription> {
        *self.description.read()
    }

    /// Returns the switch's buffer count, if the handshake reported it.
    pub fn n_buffers(&self) -> Option<u32> {
        self.description().map(|d| d.n_buffers)
    }

    /// Returns the switch's table count, if the handshake reported it.
    pub fn n_tables(&self) -> Option<u8> {
        self.description().map(|d| d.n_tables)
    }

    /// Returns the protocol version of the main connection.
    pub fn version(&self) -> Option<OpenFlowVersion> {
        self.connection(AuxiliaryId::MAIN).map(|c| c.version())
    }

    /// Returns the connection in slot `aux_id`.
    pub fn connection(&self, aux_id: AuxiliaryId) -> Option<Arc<Connection>> {
        self.connections.read().get(&aux_id).cloned()
    }

    /// Returns the number of attached connection slots.
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// Returns the attached slots in ascending order.
    pub fn auxiliary_ids(&self) -> Vec<AuxiliaryId> {
        self.connections.read().keys().copied().collect()
    }

    /// Returns `true` while the main connection is attached.
    pub fn is_operational(&self) -> bool {
        self.connections.read().contains_key(&AuxiliaryId::MAIN)
    }

    /// Sends `message` on the main connection.
    ///
    /// Safe to call concurrently from any number of tasks. Returns the
    /// transaction ID the message went out with.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotConnected`] if the main connection is not
    /// attached, or any error from [`Connection::send`].
    pub async fn send_message(&self, message: Message) -> Result<u32, DeviceError> {
        self.send_message_on(AuxiliaryId::MAIN, message).await
    }

    /// Sends `message` on the connection in slot `aux_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotConnected`] if that slot is not attached, or
    /// any error from [`Connection::send`].
    pub async fn send_message_on(
        &self,
        aux_id: AuxiliaryId,
        message: Message,
    ) -> Result<u32, DeviceError> {
        let connection = self
            .connection(aux_id)
            .ok_or(DeviceError::NotConnected {
                datapath_id: self.datapath_id,
                aux_id,
            })?;
        connection.send(message).await
    }

    pub(crate) fn set_description(&self, description: DeviceDescription) {
        *self.description.write() = Some(description);
    }

    /// Attaches `connection` to slot `aux_id`, returning the connection it
    /// replaced.
    pub(crate) fn attach(
        &self,
        aux_id: AuxiliaryId,
        connection: Arc<Connection>,
    ) -> Option<Arc<Connection>> {
        self.connections.write().insert(aux_id, connection)
    }

    /// Detaches slot `aux_id`, returning `None` if it was empty.
    pub(crate) fn detach(&self, aux_id: AuxiliaryId) -> Option<Arc<Connection>> {
        self.connections.write().remove(&aux_id)
    }

    /// Detaches slot `aux_id` only if it still holds `connection`.
    pub(crate) fn detach_if(&self, aux_id: AuxiliaryId, connection: &Arc<Connection>) -> bool {
        let mut connections = self.connections.write();
        match connections.get(&aux_id) {
            Some(current) if Arc::ptr_eq(current, connection) => {
                connections.remove(&aux_id);
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("datapath_id", &self.datapath_id)
            .field("description", &self.description())
            .field("auxiliary_ids", &self.auxiliary_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openflow::MessageBody;
    use crate::transport::{MemoryTransport, Stream};

    fn connection_with_peer() -> (Arc<Connection>, MemoryTransport) {
        let (controller, switch) = MemoryTransport::pair(16);
        let (_reader, writer) = Stream::new(controller).into_split();
        (Arc::new(Connection::new(writer, OpenFlowVersion::V1_0)), switch)
    }

    fn connection() -> Arc<Connection> {
        connection_with_peer().0
    }

    #[test]
    fn test_new_device_has_no_description() {
        let device = Device::new(DatapathId::new(1));
        assert_eq!(device.n_buffers(), None);
        assert_eq!(device.n_tables(), None);
        assert!(!device.is_operational());
        assert_eq!(device.version(), None);
    }

    #[test]
    fn test_attach_replaces_slot() {
        let device = Device::new(DatapathId::new(1));
        let first = connection();
        let second = connection();

        assert!(device.attach(AuxiliaryId::MAIN, first.clone()).is_none());
        let replaced = device.attach(AuxiliaryId::MAIN, second.clone()).unwrap();
        assert!(Arc::ptr_eq(&replaced, &first));
        assert_eq!(device.connection_count(), 1);
        assert!(device.is_operational());
    }

    #[test]
    fn test_detach_if_checks_identity() {
        let device = Device::new(DatapathId::new(1));
        let stale = connection();
        let current = connection();
        device.attach(AuxiliaryId::new(1), current.clone());

        assert!(!device.detach_if(AuxiliaryId::new(1), &stale));
        assert_eq!(device.connection_count(), 1);
        assert!(device.detach_if(AuxiliaryId::new(1), &current));
        assert_eq!(device.connection_count(), 0);
    }

    #[test]
    fn test_auxiliary_ids_sorted() {
        let device = Device::new(DatapathId::new(1));
        device.attach(AuxiliaryId::new(2), connection());
        device.attach(AuxiliaryId::MAIN, connection());
        assert_eq!(
            device.auxiliary_ids(),
            vec![AuxiliaryId::MAIN, AuxiliaryId::new(2)]
        );
        assert!(device.detach(AuxiliaryId::new(2)).is_some());
        assert!(device.detach(AuxiliaryId::new(2)).is_none());
    }

    #[tokio::test]
    async fn test_send_message_without_main_slot() {
        let device = Device::new(DatapathId::new(7));
        let (aux, _switch) = connection_with_peer();
        device.attach(AuxiliaryId::new(1), aux);

        let message = Message::new(0x01, 0, MessageBody::FeaturesRequest);
        let error = device.send_message(message.clone()).await.unwrap_err();
        assert!(matches!(
            error,
            DeviceError::NotConnected { aux_id, .. } if aux_id == AuxiliaryId::MAIN
        ));

        assert!(device.send_message_on(AuxiliaryId::new(1), message).await.is_ok());
    }
}
