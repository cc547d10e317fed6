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
use crate::northbound::{Application, ApplicationError, DeviceObserver};
use crate::openflow::PacketIn;
use parking_lot::RwLock;
use std::sync::Arc;

/// Fans engine events out to registered applications.
///
/// Applications receive each event in registration order. An application
/// that returns an error is logged and skipped; delivery continues with the
/// next one.
///
/// # Examples
///
/// ```rust
/// use cherry::northbound::{Application, Dispatcher};
/// use std::sync::Arc;
///
/// struct Inventory;
///
/// #[async_trait::async_trait]
/// impl Application for Inventory {
///     fn name(&self) -> &str {
///         "inventory"
///     }
/// }
///
/// let dispatcher = Dispatcher::new();
/// dispatcher.register(Arc::new(Inventory));
/// assert_eq!(dispatcher.application_names(), vec!["inventory".to_string()]);
/// ```
#[derive(Default)]
pub struct Dispatcher {
    applications: RwLock<Vec<Arc<dyn Application>>>,
}

impl Dispatcher {
    /// Creates a dispatcher with no applications.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `application` to the delivery order.
    pub fn register(&self, application: Arc<dyn Application>) {
        #[cfg(feature = "tracing")]
        tracing::info!(application = application.name(), "application registered");
        self.applications.write().push(application);
    }

    /// Returns the registered application names in delivery order.
    pub fn application_names(&self) -> Vec<String> {
        self.applications
            .read()
            .iter()
            .map(|app| app.name().to_string())
            .collect()
    }

    fn snapshot(&self) -> Vec<Arc<dyn Application>> {
        self.applications.read().clone()
    }

    fn report(_application: &dyn Application, _event: &str, _error: ApplicationError) {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            application = _application.name(),
            event = _event,
            error = %_error,
            "application failed to handle event"
        );
    }
}

#[async_trait::async_trait]
impl DeviceObserver for Dispatcher {
    async fn on_device_up(&self, device: &Arc<Device>) {
        for application in self.snapshot() {
            if let Err(error) = application.on_device_up(device).await {
                Self::report(application.as_ref(), "device_up", error);
            }
        }
    }

    async fn on_device_down(&self, datapath_id: DatapathId) {
        for application in self.snapshot() {
            if let Err(error) = application.on_device_down(datapath_id).await {
                Self::report(application.as_ref(), "device_down", error);
            }
        }
    }

    async fn on_packet_in(&self, device: &Arc<Device>, packet: &PacketIn) {
        for application in self.snapshot() {
            if let Err(error) = application.on_packet_in(device, packet).await {
                Self::report(application.as_ref(), "packet_in", error);
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("applications", &self.application_names())
            .finish()
    }
}
