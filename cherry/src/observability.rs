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


//! Observability support for cherry.
//!
//! Two pieces:
//!
//! - **[`EngineMetrics`]**: atomic counters for handshakes, keepalives and
//!   session lifecycle, shared by every engine of a controller
//! - **[`log_error`]**: structured logging of a [`CherryError`] at a level
//!   chosen from its classification
//!
//! Engines log their own lifecycle through `tracing` when the `tracing`
//! feature is enabled (the default). Install any subscriber to see it:
//!
//! ```rust,ignore
//! use tracing_subscriber::EnvFilter;
//!
//! tracing_subscriber::fmt()
//!     .with_env_filter(EnvFilter::from_default_env())
//!     .init();
//! ```

mod metrics;

pub use metrics::{EngineMetrics, EngineMetricsSnapshot};

use crate::CherryError;

/// Logs an error with structured context.
///
/// Errors that end a connection are logged at ERROR, errors the connection
/// survives at WARN, and application errors at INFO.
#[cfg(feature = "tracing")]
pub fn log_error(error: &CherryError) {
    match error {
        CherryError::Application(e) => {
            tracing::info!(error = %e, "application error occurred");
        }
        _ if error.should_close_connection() => {
            tracing::error!(
                error = %error,
                recoverable = error.is_recoverable(),
                "connection error occurred"
            );
        }
        _ => {
            tracing::warn!(
                error = %error,
                recoverable = error.is_recoverable(),
                "error occurred"
            );
        }
    }
}

/// Logs an error with structured context (no-op when tracing is disabled).
#[cfg(not(feature = "tracing"))]
pub fn log_error(_error: &CherryError) {}
