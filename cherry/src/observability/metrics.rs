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


//! Counters for protocol engine activity.
//!
//! Counters are plain atomics. A controller shares one [`EngineMetrics`]
//! between all the engines it spawns, so the totals cover every connection.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`EngineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineMetricsSnapshot {
    /// Engines that started running
    pub sessions_started: u64,
    /// Engines that finished cleanup
    pub sessions_closed: u64,
    /// Handshakes that reached the established state
    pub handshakes_completed: u64,
    /// Messages rejected for carrying the wrong protocol version
    pub version_mismatches: u64,
    /// Keepalive probes sent to switches
    pub echo_requests_sent: u64,
    /// Answers sent to switch keepalive probes
    pub echo_replies_sent: u64,
    /// Messages skipped as unsupported or not acted on
    pub unsupported_messages: u64,
}

impl EngineMetricsSnapshot {
    /// Returns the number of engines currently running.
    pub fn active_sessions(&self) -> u64 {
        self.sessions_started.saturating_sub(self.sessions_closed)
    }
}

/// Counters shared by protocol engines.
///
/// # Examples
///
/// ```rust
/// use cherry::observability::EngineMetrics;
///
/// let metrics = EngineMetrics::new();
/// metrics.record_session_started();
/// metrics.record_handshake_completed();
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.active_sessions(), 1);
/// assert_eq!(snapshot.handshakes_completed, 1);
/// ```
#[derive(Debug, Default)]
pub struct EngineMetrics {
    sessions_started: AtomicU64,
    sessions_closed: AtomicU64,
    handshakes_completed: AtomicU64,
    version_mismatches: AtomicU64,
    echo_requests_sent: AtomicU64,
    echo_replies_sent: AtomicU64,
    unsupported_messages: AtomicU64,
}

impl EngineMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an engine starting to run.
    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an engine finishing cleanup.
    pub fn record_session_closed(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a handshake reaching the established state.
    pub fn record_handshake_completed(&self) {
        self.handshakes_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a message rejected for its protocol version.
    pub fn record_version_mismatch(&self) {
        self.version_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a keepalive probe sent.
    pub fn record_echo_request_sent(&self) {
        self.echo_requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an answer to a switch probe sent.
    pub fn record_echo_reply_sent(&self) {
        self.echo_replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a message skipped as unsupported.
    pub fn record_unsupported_message(&self) {
        self.unsupported_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of handshakes completed.
    #[must_use]
    pub fn handshakes_completed(&self) -> u64 {
        self.handshakes_completed.load(Ordering::Relaxed)
    }

    /// Returns the number of echo replies sent.
    #[must_use]
    pub fn echo_replies_sent(&self) -> u64 {
        self.echo_replies_sent.load(Ordering::Relaxed)
    }

    /// Returns a copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            handshakes_completed: self.handshakes_completed.load(Ordering::Relaxed),
            version_mismatches: self.version_mismatches.load(Ordering::Relaxed),
            echo_requests_sent: self.echo_requests_sent.load(Ordering::Relaxed),
            echo_replies_sent: self.echo_replies_sent.load(Ordering::Relaxed),
            unsupported_messages: self.unsupported_messages.load(Ordering::Relaxed),
        }
    }
}
