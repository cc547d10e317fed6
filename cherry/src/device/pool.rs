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


//! Process-wide registry of connected switches.
//!
//! The pool maps datapath IDs to [`Device`]s and owns every change to a
//! device's connection slots. All mutations run under one pool-wide lock, so
//! a device is present exactly while it has at least one attached slot: it
//! is inserted together with its first slot and removed together with its
//! last.

use crate::device::{AuxiliaryId, Connection, DatapathId, Device, DeviceDescription};
use crate::engine::Features;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of registering a handshaken connection.
#[derive(Debug)]
pub struct Registration {
    /// The device the connection now belongs to
    pub device: Arc<Device>,
    /// `true` if the device did not exist before this registration
    pub created: bool,
    /// Connection previously in the same slot, overwritten by this one
    pub replaced: Option<Arc<Connection>>,
}

/// Registry of devices keyed by datapath ID.
///
/// The pool is an ordinary value: create one per controller (or per test)
/// and hand it to every engine that should register with it.
///
/// # Examples
///
/// ```rust
/// use cherry::device::{DatapathId, DevicePool};
///
/// let pool = DevicePool::new();
/// assert!(pool.lookup(DatapathId::new(1)).is_none());
/// assert_eq!(pool.remove_connection(DatapathId::new(1), Default::default()), 0);
/// ```
#[derive(Debug, Default)]
pub struct DevicePool {
    devices: Mutex<HashMap<DatapathId, Arc<Device>>>,
}

impl DevicePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `connection` to slot `aux_id` of the device `datapath_id`,
    /// creating the device if it does not exist.
    ///
    /// A connection already in that slot is overwritten.
    pub fn add_connection(
        &self,
        datapath_id: DatapathId,
        aux_id: AuxiliaryId,
        connection: Arc<Connection>,
    ) -> Arc<Device> {
        let mut devices = self.devices.lock();
        let (device, _created) = Self::device_entry(&mut devices, datapath_id);
        device.attach(aux_id, connection);
        device
    }

    /// Registers a connection that completed its handshake.
    ///
    /// Like [`add_connection`](Self::add_connection), and additionally
    /// records the switch attributes from `features` in the same critical
    /// section, so no device is ever visible with a slot but without them.
    pub fn register(
        &self,
        features: &Features,
        aux_id: AuxiliaryId,
        connection: Arc<Connection>,
    ) -> Registration {
        let mut devices = self.devices.lock();
        let (device, created) = Self::device_entry(&mut devices, features.datapath_id);
        device.set_description(DeviceDescription::from(features));
        let replaced = device.attach(aux_id, connection);

        Registration {
            device,
            created,
            replaced,
        }
    }

    /// Detaches slot `aux_id` of `datapath_id`, removing the device if no
    /// slot remains.
    ///
    /// Returns the number of slots left, 0 if the device is gone or never
    /// existed.
    pub fn remove_connection(&self, datapath_id: DatapathId, aux_id: AuxiliaryId) -> usize {
        let mut devices = self.devices.lock();
        let Some(device) = devices.get(&datapath_id) else {
            return 0;
        };
        device.detach(aux_id);
        Self::remaining(&mut devices, datapath_id)
    }

    /// Detaches slot `aux_id` of `datapath_id` only if it still holds
    /// `connection`, removing the device if no slot remains.
    ///
    /// Returns the number of slots left, or `None` if nothing was detached
    /// because the slot is empty or a newer connection took it over.
    pub fn release_connection(
        &self,
        datapath_id: DatapathId,
        aux_id: AuxiliaryId,
        connection: &Arc<Connection>,
    ) -> Option<usize> {
        let mut devices = self.devices.lock();
        let device = devices.get(&datapath_id)?;
        if !device.detach_if(aux_id, connection) {
            return None;
        }
        Some(Self::remaining(&mut devices, datapath_id))
    }

    /// Returns the device for `datapath_id`.
    pub fn lookup(&self, datapath_id: DatapathId) -> Option<Arc<Device>> {
        self.devices.lock().get(&datapath_id).cloned()
    }

    /// Returns a snapshot of every device.
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices.lock().values().cloned().collect()
    }

    /// Returns the number of devices.
    pub fn len(&self) -> usize {
        self.devices.lock().len()
    }

    /// Returns `true` if no device is connected.
    pub fn is_empty(&self) -> bool {
        self.devices.lock().is_empty()
    }

    fn device_entry(
        devices: &mut HashMap<DatapathId, Arc<Device>>,
        datapath_id: DatapathId,
    ) -> (Arc<Device>, bool) {
        if let Some(device) = devices.get(&datapath_id) {
            return (device.clone(), false);
        }
        let device = Arc::new(Device::new(datapath_id));
        devices.insert(datapath_id, device.clone());
        (device, true)
    }

    fn remaining(devices: &mut HashMap<DatapathId, Arc<Device>>, datapath_id: DatapathId) -> usize {
        let remaining = devices
            .get(&datapath_id)
            .map_or(0, |device| device.connection_count());
        if remaining == 0 {
            devices.remove(&datapath_id);
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openflow::OpenFlowVersion;
    use crate::transport::{MemoryTransport, Stream};

    fn connection() -> Arc<Connection> {
        let (controller, _switch) = MemoryTransport::pair(4);
        let (_reader, writer) = Stream::new(controller).into_split();
        Arc::new(Connection::new(writer, OpenFlowVersion::V1_3))
    }

    fn features(dpid: u64) -> Features {
        Features {
            datapath_id: DatapathId::new(dpid),
            n_buffers: 256,
            n_tables: 64,
            auxiliary_id: AuxiliaryId::MAIN,
            capabilities: 0,
        }
    }

    #[test]
    fn test_add_creates_device() {
        let pool = DevicePool::new();
        let device = pool.add_connection(DatapathId::new(1), AuxiliaryId::MAIN, connection());

        let found = pool.lookup(DatapathId::new(1)).unwrap();
        assert!(Arc::ptr_eq(&device, &found));
        assert_eq!(found.connection_count(), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_register_records_description() {
        let pool = DevicePool::new();
        let first = pool.register(&features(1), AuxiliaryId::MAIN, connection());
        assert!(first.created);
        assert!(first.replaced.is_none());
        assert_eq!(first.device.n_buffers(), Some(256));
        assert_eq!(first.device.n_tables(), Some(64));

        let second = pool.register(&features(1), AuxiliaryId::new(1), connection());
        assert!(!second.created);
        assert!(Arc::ptr_eq(&first.device, &second.device));
        assert_eq!(second.device.connection_count(), 2);
    }

    #[test]
    fn test_register_same_slot_reports_replaced() {
        let pool = DevicePool::new();
        let old = connection();
        pool.register(&features(3), AuxiliaryId::MAIN, old.clone());
        let registration = pool.register(&features(3), AuxiliaryId::MAIN, connection());

        assert!(Arc::ptr_eq(&registration.replaced.unwrap(), &old));
        assert_eq!(registration.device.connection_count(), 1);
    }

    #[test]
    fn test_device_survives_until_last_slot_removed() {
        for order in [[0u8, 1], [1, 0]] {
            let pool = DevicePool::new();
            let dpid = DatapathId::new(2);
            pool.add_connection(dpid, AuxiliaryId::MAIN, connection());
            pool.add_connection(dpid, AuxiliaryId::new(1), connection());

            assert_eq!(pool.remove_connection(dpid, AuxiliaryId::new(order[0])), 1);
            assert!(pool.lookup(dpid).is_some());
            assert_eq!(pool.remove_connection(dpid, AuxiliaryId::new(order[1])), 0);
            assert!(pool.lookup(dpid).is_none());
        }
    }

    #[test]
    fn test_remove_missing_slot_keeps_device() {
        let pool = DevicePool::new();
        let dpid = DatapathId::new(4);
        pool.add_connection(dpid, AuxiliaryId::MAIN, connection());

        assert_eq!(pool.remove_connection(dpid, AuxiliaryId::new(3)), 1);
        assert!(pool.lookup(dpid).is_some());
    }

    #[test]
    fn test_release_ignores_stale_connection() {
        let pool = DevicePool::new();
        let dpid = DatapathId::new(5);
        let stale = connection();
        let fresh = connection();
        pool.add_connection(dpid, AuxiliaryId::MAIN, stale.clone());
        pool.add_connection(dpid, AuxiliaryId::MAIN, fresh.clone());

        assert_eq!(pool.release_connection(dpid, AuxiliaryId::MAIN, &stale), None);
        assert!(pool.lookup(dpid).is_some());

        assert_eq!(pool.release_connection(dpid, AuxiliaryId::MAIN, &fresh), Some(0));
        assert!(pool.is_empty());
        assert_eq!(pool.release_connection(dpid, AuxiliaryId::MAIN, &fresh), None);
    }

    #[test]
    fn test_concurrent_add_remove_never_leaves_empty_device() {
        let pool = Arc::new(DevicePool::new());
        let connections: Vec<_> = (0..4).map(|_| connection()).collect();

        std::thread::scope(|scope| {
            for (aux, connection) in connections.iter().enumerate() {
                let pool = &pool;
                scope.spawn(move || {
                    let aux_id = AuxiliaryId::new(aux as u8);
                    for _ in 0..500 {
                        pool.add_connection(DatapathId::new(9), aux_id, connection.clone());

                        // Only this thread touches this slot, so the device
                        // cannot disappear while it is attached.
                        let device = pool.lookup(DatapathId::new(9)).unwrap();
                        assert!(device.auxiliary_ids().contains(&aux_id));

                        let remaining = pool.remove_connection(DatapathId::new(9), aux_id);
                        assert!(remaining < 4);
                    }
                });
            }
        });

        assert!(pool.is_empty());
    }
}
