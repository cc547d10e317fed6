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


//! Configuration types for protocol engines.

use crate::openflow::{HEADER_LEN, MAX_MESSAGE_SIZE};
use crate::transport::{DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A configuration value was rejected by `validate()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration that must be positive was zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Name of the offending field
        field: &'static str,
    },

    /// The reader-to-dispatcher buffer must hold at least one message.
    #[error("message_buffer_size must be at least 1")]
    ZeroBuffer,

    /// The message size limit cannot hold a header or exceeds the wire limit.
    #[error("max_message_size must be between {min} and {max}, got {actual}")]
    MessageSize {
        /// Smallest accepted value
        min: usize,
        /// Largest accepted value
        max: usize,
        /// Configured value
        actual: usize,
    },
}

/// Configuration for a protocol engine.
///
/// # Examples
///
/// ```rust
/// use cherry::engine::EngineConfig;
/// use std::time::Duration;
///
/// let config = EngineConfig::new()
///     .with_echo_interval(Duration::from_secs(10))
///     .with_message_buffer_size(128);
///
/// assert_eq!(config.read_timeout, Duration::from_secs(1));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deadline for a single read on the connection.
    ///
    /// Expiry is a polling tick, not a failure. Shorter values make the
    /// reader notice cancellation sooner.
    ///
    /// Default: 1 second
    pub read_timeout: Duration,

    /// Deadline for a single write on the connection.
    ///
    /// Expiry ends the session.
    ///
    /// Default: 5 seconds
    pub write_timeout: Duration,

    /// Interval between echo requests sent to the switch.
    ///
    /// Default: 5 seconds
    pub echo_interval: Duration,

    /// Number of decoded messages the reader task may queue ahead of the
    /// dispatch loop before it waits.
    ///
    /// Default: 64
    pub message_buffer_size: usize,

    /// Largest message accepted or sent, header included.
    ///
    /// Default: 65535
    pub max_message_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            echo_interval: Duration::from_secs(5),
            message_buffer_size: 64,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the echo interval.
    pub fn with_echo_interval(mut self, interval: Duration) -> Self {
        self.echo_interval = interval;
        self
    }

    /// Sets the reader-to-dispatcher buffer size.
    pub fn with_message_buffer_size(mut self, size: usize) -> Self {
        self.message_buffer_size = size;
        self
    }

    /// Sets the largest accepted message size.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("read_timeout", self.read_timeout),
            ("write_timeout", self.write_timeout),
            ("echo_interval", self.echo_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }

        if self.message_buffer_size == 0 {
            return Err(ConfigError::ZeroBuffer);
        }

        if !(HEADER_LEN..=MAX_MESSAGE_SIZE).contains(&self.max_message_size) {
            return Err(ConfigError::MessageSize {
                min: HEADER_LEN,
                max: MAX_MESSAGE_SIZE,
                actual: self.max_message_size,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.read_timeout, Duration::from_secs(1));
        assert_eq!(config.write_timeout, Duration::from_secs(5));
        assert_eq!(config.echo_interval, Duration::from_secs(5));
        assert_eq!(config.message_buffer_size, 64);
        assert_eq!(config.max_message_size, 65535);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = EngineConfig::new()
            .with_read_timeout(Duration::from_millis(250))
            .with_write_timeout(Duration::from_secs(2))
            .with_max_message_size(1024);
        assert_eq!(config.read_timeout, Duration::from_millis(250));
        assert_eq!(config.write_timeout, Duration::from_secs(2));
        assert_eq!(config.max_message_size, 1024);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = EngineConfig::new().with_echo_interval(Duration::ZERO);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration {
                field: "echo_interval"
            })
        );

        let config = EngineConfig::new().with_message_buffer_size(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroBuffer));
    }

    #[test]
    fn test_validate_rejects_bad_message_size() {
        let config = EngineConfig::new().with_max_message_size(4);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MessageSize { actual: 4, .. })
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"message_buffer_size": 8}"#).unwrap();
        assert_eq!(config.message_buffer_size, 8);
        assert_eq!(config.echo_interval, Duration::from_secs(5));
    }
}
