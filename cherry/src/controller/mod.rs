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


//! TCP front end that runs one protocol engine per accepted switch.

mod config;

pub use config::{ControllerConfig, DEFAULT_LISTEN_PORT};

use crate::device::DevicePool;
use crate::engine::{EngineError, Transceiver, strategy_for};
use crate::error::CherryError;
use crate::northbound::DeviceObserver;
use crate::observability::{EngineMetrics, log_error};
use crate::transport::{TcpTransport, TransportError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Pause after a failed accept before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts switch connections and runs a [`Transceiver`] for each.
///
/// Every engine shares the controller's [`DevicePool`], observer and
/// metrics. A failing session is logged and affects no other session.
///
/// # Examples
///
/// ```rust,no_run
/// use cherry::controller::{Controller, ControllerConfig};
/// use cherry::device::DevicePool;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), cherry::CherryError> {
/// let pool = Arc::new(DevicePool::new());
/// let controller = Controller::bind(ControllerConfig::default(), pool.clone()).await?;
///
/// let cancel = CancellationToken::new();
/// tokio::spawn({
///     let cancel = cancel.clone();
///     async move {
///         tokio::signal::ctrl_c().await.ok();
///         cancel.cancel();
///     }
/// });
///
/// controller.run(cancel).await?;
/// # Ok(())
/// # }
/// ```
pub struct Controller {
    config: ControllerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    pool: Arc<DevicePool>,
    observer: Option<Arc<dyn DeviceObserver>>,
    metrics: Arc<EngineMetrics>,
}

impl Controller {
    /// Validates `config` and binds its listen address.
    ///
    /// # Errors
    ///
    /// Returns [`CherryError::Config`] for invalid settings and
    /// [`CherryError::Transport`] if the address cannot be bound.
    pub async fn bind(config: ControllerConfig, pool: Arc<DevicePool>) -> Result<Self, CherryError> {
        config.validate()?;
        let listener = TcpTransport::bind(config.listen_addr.to_string()).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Io { source })?;

        Ok(Self {
            config,
            listener,
            local_addr,
            pool,
            observer: None,
            metrics: Arc::new(EngineMetrics::new()),
        })
    }

    /// Sets the observer every engine reports to.
    pub fn with_observer(mut self, observer: Arc<dyn DeviceObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the device pool engines register with.
    pub fn pool(&self) -> &Arc<DevicePool> {
        &self.pool
    }

    /// Returns the metrics shared by all engines.
    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Accepts connections until `cancel` fires, then waits for every
    /// session to finish its cleanup.
    ///
    /// Cancelling `cancel` also cancels every running session.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), CherryError> {
        let strategy = strategy_for(self.config.version);
        let mut sessions = JoinSet::new();

        #[cfg(feature = "tracing")]
        tracing::info!(
            listen_addr = %self.local_addr,
            version = %self.config.version,
            "controller listening"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = TcpTransport::accept(&self.listener) => match accepted {
                    Ok((transport, _peer_addr)) => {
                        let mut engine = Transceiver::new(transport, strategy.clone(), self.pool.clone())
                            .with_config(self.config.engine.clone())
                            .with_metrics(self.metrics.clone());
                        if let Some(observer) = &self.observer {
                            engine = engine.with_observer(observer.clone());
                        }

                        let session = cancel.child_token();
                        sessions.spawn(async move { engine.run(session).await });
                    }
                    Err(_error) => {
                        #[cfg(feature = "tracing")]
                        tracing::error!(error = %_error, "failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(finished) = sessions.join_next(), if !sessions.is_empty() => {
                    log_session_end(finished);
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!(sessions = sessions.len(), "controller stopping");

        while let Some(finished) = sessions.join_next().await {
            log_session_end(finished);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("local_addr", &self.local_addr)
            .field("version", &self.config.version)
            .field("devices", &self.pool.len())
            .finish()
    }
}

fn log_session_end(finished: Result<Result<(), EngineError>, JoinError>) {
    match finished {
        Ok(Ok(())) => {}
        Ok(Err(error)) => log_error(&CherryError::from(error)),
        Err(_error) => {
            #[cfg(feature = "tracing")]
            tracing::error!(error = %_error, "session task panicked");
        }
    }
}
