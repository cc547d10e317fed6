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


//! The per-connection protocol engine.

use crate::device::{AuxiliaryId, Connection, DatapathId, Device, DeviceDescription, DevicePool};
use crate::engine::{EngineConfig, EngineError, EngineState, MessageKind, ProtocolStrategy};
use crate::northbound::DeviceObserver;
use crate::observability::EngineMetrics;
#[cfg(feature = "tracing")]
use crate::openflow::MessageBody;
use crate::openflow::{CodecError, CodecErrorKind, Message, OpenFlowVersion, read_message};
use crate::transport::{Stream, StreamReader, Transport, TransportError, TransportMetadata};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Where an established engine registered its connection.
struct Attachment {
    datapath_id: DatapathId,
    aux_id: AuxiliaryId,
    device: Weak<Device>,
}

/// Protocol engine for one switch connection.
///
/// A transceiver owns a transport for its whole lifetime. [`run`](Self::run)
/// drives the session:
///
/// 1. Sets the read and write timeouts on the stream.
/// 2. Sends a hello and a features request.
/// 3. Starts the reader task, which decodes messages into a bounded queue,
///    and the keepalive task, which sends an echo request every
///    [`echo_interval`](EngineConfig::echo_interval).
/// 4. Dispatches queued messages in arrival order until the session ends.
///    The features reply registers the connection with the [`DevicePool`].
/// 5. Cleans up: detaches the connection from its device and closes it.
///
/// Read timeouts and unsupported messages never end a session. A message of
/// another protocol version, a message the strategy cannot interpret, any
/// write failure and any other read failure do.
///
/// # Examples
///
/// ```rust
/// use cherry::device::DevicePool;
/// use cherry::engine::{EngineState, Transceiver, strategy_for};
/// use cherry::openflow::OpenFlowVersion;
/// use cherry::transport::MemoryTransport;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (controller, _switch) = MemoryTransport::pair(16);
/// let pool = Arc::new(DevicePool::new());
/// let engine = Transceiver::new(controller, strategy_for(OpenFlowVersion::V1_3), pool);
///
/// let cancel = CancellationToken::new();
/// cancel.cancel();
/// engine.run(cancel).await.unwrap();
/// assert_eq!(engine.state(), EngineState::Closed);
/// # }
/// ```
pub struct Transceiver {
    strategy: Arc<dyn ProtocolStrategy>,
    config: EngineConfig,
    pool: Arc<DevicePool>,
    observer: Option<Arc<dyn DeviceObserver>>,
    metrics: Arc<EngineMetrics>,
    auxiliary_id: Option<AuxiliaryId>,
    metadata: TransportMetadata,
    stream: Mutex<Option<Stream>>,
    session: Mutex<Option<CancellationToken>>,
    connection: Mutex<Option<Arc<Connection>>>,
    attachment: Mutex<Option<Attachment>>,
    state: watch::Sender<EngineState>,
    last_echo_reply: Mutex<Option<Instant>>,
    cleaned_up: AtomicBool,
}

impl Transceiver {
    /// Creates an engine for `transport` speaking the strategy's version and
    /// registering with `pool`.
    pub fn new(
        transport: impl Transport,
        strategy: Arc<dyn ProtocolStrategy>,
        pool: Arc<DevicePool>,
    ) -> Self {
        let stream = Stream::new(transport);
        let (state, _) = watch::channel(EngineState::Connected);
        Self {
            strategy,
            config: EngineConfig::default(),
            pool,
            observer: None,
            metrics: Arc::new(EngineMetrics::new()),
            auxiliary_id: None,
            metadata: stream.metadata().clone(),
            stream: Mutex::new(Some(stream)),
            session: Mutex::new(None),
            connection: Mutex::new(None),
            attachment: Mutex::new(None),
            state,
            last_echo_reply: Mutex::new(None),
            cleaned_up: AtomicBool::new(false),
        }
    }

    /// Replaces the default configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the observer notified of device and packet events.
    pub fn with_observer(mut self, observer: Arc<dyn DeviceObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Shares `metrics` with this engine.
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Registers the connection in slot `aux_id` regardless of what the
    /// features reply reports.
    ///
    /// OpenFlow 1.0 switches cannot report an auxiliary ID, so an engine
    /// accepted on an auxiliary channel is told its slot this way.
    pub fn with_auxiliary_id(mut self, aux_id: AuxiliaryId) -> Self {
        self.auxiliary_id = Some(aux_id);
        self
    }

    /// Returns the protocol version of this engine.
    pub fn version(&self) -> OpenFlowVersion {
        self.strategy.version()
    }

    /// Returns metadata about the transport.
    pub fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    /// Returns the current handshake state.
    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Returns a receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    /// Returns the device this engine registered with, while it exists.
    pub fn device(&self) -> Option<Arc<Device>> {
        self.attachment
            .lock()
            .as_ref()
            .and_then(|attachment| attachment.device.upgrade())
    }

    /// Returns the datapath ID and slot this engine registered under.
    pub fn registration(&self) -> Option<(DatapathId, AuxiliaryId)> {
        self.attachment
            .lock()
            .as_ref()
            .map(|attachment| (attachment.datapath_id, attachment.aux_id))
    }

    /// Returns when the switch last answered one of our echo requests.
    pub fn last_echo_reply(&self) -> Option<Instant> {
        *self.last_echo_reply.lock()
    }

    /// Runs the session until it fails, the peer closes the connection or
    /// `cancel` fires, then cleans up.
    ///
    /// Returns `Ok(())` on cancellation or a clean end of stream.
    ///
    /// # Errors
    ///
    /// Returns the [`EngineError`] that ended the session, or
    /// [`EngineError::AlreadyStarted`] if the engine already ran or was
    /// cleaned up.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), EngineError> {
        let (stream, session) = {
            let mut slot = self.session.lock();
            let stream = self.stream.lock().take().ok_or(EngineError::AlreadyStarted)?;
            let session = cancel.child_token();
            *slot = Some(session.clone());
            (stream, session)
        };
        self.metrics.record_session_started();

        #[cfg(feature = "tracing")]
        tracing::info!(
            transport = %self.metadata,
            version = %self.version(),
            "protocol engine started"
        );

        let result = self.serve(stream, &session).await;

        #[cfg(feature = "tracing")]
        match &result {
            Ok(()) => tracing::info!(transport = %self.metadata.id, "protocol engine stopped"),
            Err(error) => tracing::error!(
                transport = %self.metadata.id,
                error = %error,
                "protocol engine terminated"
            ),
        }

        self.cleanup().await;
        result
    }

    /// Detaches this engine's connection from the pool and closes it.
    ///
    /// Runs once; later calls return immediately. `run` calls it on exit, and
    /// calling it while `run` is active stops the session.
    pub async fn cleanup(&self) {
        if self.cleaned_up.swap(true, Ordering::AcqRel) {
            return;
        }

        // Same lock order as `run`, so a starting session is either cancelled
        // here or never gets its stream.
        let session = {
            let mut slot = self.session.lock();
            drop(self.stream.lock().take());
            slot.take()
        };
        if let Some(session) = session {
            session.cancel();
        }

        let attachment = self.attachment.lock().take();
        let connection = self.connection.lock().take();

        if let (Some(attachment), Some(connection)) = (&attachment, &connection) {
            let released =
                self.pool
                    .release_connection(attachment.datapath_id, attachment.aux_id, connection);
            match released {
                Some(0) => {
                    #[cfg(feature = "tracing")]
                    tracing::info!(
                        datapath_id = %attachment.datapath_id,
                        "device down"
                    );
                    if let Some(observer) = &self.observer {
                        observer.on_device_down(attachment.datapath_id).await;
                    }
                }
                Some(_remaining) => {
                    #[cfg(feature = "tracing")]
                    tracing::info!(
                        datapath_id = %attachment.datapath_id,
                        aux_id = %attachment.aux_id,
                        remaining = _remaining,
                        "connection detached"
                    );
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        datapath_id = %attachment.datapath_id,
                        aux_id = %attachment.aux_id,
                        "slot already taken over by a newer connection"
                    );
                }
            }
        }

        if let Some(connection) = connection {
            connection.close().await;
        }

        self.state.send_replace(EngineState::Closed);
        self.metrics.record_session_closed();
    }

    async fn serve(&self, mut stream: Stream, cancel: &CancellationToken) -> Result<(), EngineError> {
        self.config.validate()?;
        stream.set_read_timeout(self.config.read_timeout);
        stream.set_write_timeout(self.config.write_timeout);

        let (reader, writer) = stream.into_split();
        let connection = Arc::new(
            Connection::new(writer, self.version())
                .with_max_message_size(self.config.max_message_size),
        );
        *self.connection.lock() = Some(connection.clone());

        let hello = self.strategy.hello(connection.next_xid());
        connection
            .write(&hello)
            .await
            .map_err(|source| EngineError::Handshake {
                step: "hello",
                source,
            })?;
        self.transition(EngineState::HelloSent);
        if cancel.is_cancelled() {
            return Ok(());
        }

        let request = self.strategy.features_request(connection.next_xid());
        connection
            .write(&request)
            .await
            .map_err(|source| EngineError::Handshake {
                step: "features request",
                source,
            })?;
        self.transition(EngineState::FeaturesRequested);
        if cancel.is_cancelled() {
            return Ok(());
        }

        let tasks = cancel.child_token();
        let _stop_tasks = tasks.clone().drop_guard();

        let mut keepalive = tokio::spawn(keepalive_loop(
            connection.clone(),
            self.strategy.clone(),
            self.config.echo_interval,
            self.metrics.clone(),
            tasks.clone(),
        ));

        let (messages_tx, mut messages) = mpsc::channel(self.config.message_buffer_size);
        let mut reader = tokio::spawn(read_loop(
            reader,
            messages_tx,
            self.version().wire(),
            self.config.max_message_size,
            self.metrics.clone(),
            tasks,
        ));

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                outcome = &mut keepalive => {
                    return outcome.unwrap_or_else(|error| Err(task_failed("keepalive", error)));
                }
                message = messages.recv() => match message {
                    Some(message) => self.dispatch(message, &connection).await?,
                    None => {
                        return match (&mut reader).await {
                            Ok(outcome) => outcome,
                            Err(error) => Err(task_failed("reader", error)),
                        };
                    }
                },
            }
        }
    }

    async fn dispatch(
        &self,
        message: Message,
        connection: &Arc<Connection>,
    ) -> Result<(), EngineError> {
        let expected = self.version().wire();
        if message.version() != expected {
            self.metrics.record_version_mismatch();
            return Err(EngineError::VersionMismatch {
                expected,
                received: message.version(),
            });
        }

        match self.strategy.classify(&message) {
            MessageKind::EchoRequest => {
                let reply = self.strategy.echo_reply(&message)?;
                connection.write(&reply).await?;
                self.metrics.record_echo_reply_sent();
                #[cfg(feature = "tracing")]
                tracing::debug!(transport = %self.metadata.id, xid = message.xid(), "echo reply sent");
            }
            MessageKind::EchoReply => {
                *self.last_echo_reply.lock() = Some(Instant::now());
                #[cfg(feature = "tracing")]
                tracing::debug!(transport = %self.metadata.id, xid = message.xid(), "echo reply received");
            }
            MessageKind::FeaturesReply => self.handle_features_reply(&message, connection).await?,
            MessageKind::PacketIn => self.handle_packet_in(&message).await?,
            MessageKind::Hello => {
                #[cfg(feature = "tracing")]
                tracing::debug!(transport = %self.metadata.id, "hello received");
            }
            MessageKind::Error => self.log_switch_error(&message),
            MessageKind::Experimenter | MessageKind::Other(_) => {
                self.metrics.record_unsupported_message();
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    transport = %self.metadata.id,
                    msg_type = message.msg_type(),
                    "ignoring message"
                );
            }
        }
        Ok(())
    }

    async fn handle_features_reply(
        &self,
        message: &Message,
        connection: &Arc<Connection>,
    ) -> Result<(), EngineError> {
        let features = self.strategy.parse_features_reply(message)?;

        if self.state().is_established() {
            match self.device() {
                Some(device) if device.datapath_id() == features.datapath_id => {
                    device.set_description(DeviceDescription::from(&features));
                }
                _ => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        transport = %self.metadata.id,
                        datapath_id = %features.datapath_id,
                        "ignoring features reply for a different datapath"
                    );
                }
            }
            return Ok(());
        }

        let aux_id = self.auxiliary_id.unwrap_or(features.auxiliary_id);
        let registration = {
            let mut attachment = self.attachment.lock();
            if self.cleaned_up.load(Ordering::Acquire) {
                return Ok(());
            }
            let registration = self.pool.register(&features, aux_id, connection.clone());
            *attachment = Some(Attachment {
                datapath_id: features.datapath_id,
                aux_id,
                device: Arc::downgrade(&registration.device),
            });
            registration
        };

        self.transition(EngineState::Established);
        self.metrics.record_handshake_completed();

        #[cfg(feature = "tracing")]
        {
            tracing::info!(
                transport = %self.metadata.id,
                datapath_id = %features.datapath_id,
                aux_id = %aux_id,
                n_buffers = features.n_buffers,
                n_tables = features.n_tables,
                "handshake complete"
            );
            if registration.replaced.is_some() {
                tracing::warn!(
                    datapath_id = %features.datapath_id,
                    aux_id = %aux_id,
                    "replaced an existing connection in the same slot"
                );
            }
        }

        if registration.created {
            if let Some(observer) = &self.observer {
                observer.on_device_up(&registration.device).await;
            }
        }
        Ok(())
    }

    async fn handle_packet_in(&self, message: &Message) -> Result<(), EngineError> {
        let Some(device) = self.device() else {
            #[cfg(feature = "tracing")]
            tracing::debug!(transport = %self.metadata.id, "packet-in before handshake ignored");
            return Ok(());
        };
        let Some(observer) = &self.observer else {
            return Ok(());
        };

        let packet = self.strategy.parse_packet_in(message)?;
        observer.on_packet_in(&device, &packet).await;
        Ok(())
    }

    fn log_switch_error(&self, _message: &Message) {
        #[cfg(feature = "tracing")]
        if let MessageBody::Error {
            error_type, code, ..
        } = _message.body()
        {
            tracing::warn!(
                transport = %self.metadata.id,
                xid = _message.xid(),
                error_type,
                code,
                "switch reported an error"
            );
        }
    }

    fn transition(&self, next: EngineState) {
        self.state.send_if_modified(|state| {
            if !state.can_transition_to(next) {
                return false;
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(transport = %self.metadata.id, from = %state, to = %next, "state change");
            *state = next;
            true
        });
    }
}

impl std::fmt::Debug for Transceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transceiver")
            .field("transport", &self.metadata.id)
            .field("version", &self.version())
            .field("state", &self.state())
            .field("registration", &self.registration())
            .finish()
    }
}

fn task_failed(task: &'static str, error: JoinError) -> EngineError {
    EngineError::TaskFailed {
        task,
        reason: error.to_string(),
    }
}

/// Decodes messages into `messages` until cancelled or the stream fails.
///
/// Returns `Ok(())` on cancellation, a clean end of stream or a closed queue,
/// and the fatal error otherwise. An out-of-range message of another version
/// is a version mismatch, not an unsupported message.
async fn read_loop(
    mut reader: StreamReader,
    messages: mpsc::Sender<Message>,
    version: u8,
    max_message_size: usize,
    metrics: Arc<EngineMetrics>,
    cancel: CancellationToken,
) -> Result<(), EngineError> {
    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            result = read_message(&mut reader, max_message_size) => result,
        };

        match result {
            Ok(message) => {
                if messages.send(message).await.is_err() {
                    return Ok(());
                }
            }
            Err(CodecError::Unsupported { version: received, .. }) if received != version => {
                metrics.record_version_mismatch();
                return Err(EngineError::VersionMismatch {
                    expected: version,
                    received,
                });
            }
            Err(error) => match error.kind() {
                CodecErrorKind::Timeout => continue,
                CodecErrorKind::Unsupported => {
                    metrics.record_unsupported_message();
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        transport = %reader.metadata().id,
                        error = %error,
                        "skipping unsupported message"
                    );
                }
                CodecErrorKind::Fatal => {
                    let clean_close = matches!(
                        &error,
                        CodecError::Transport(TransportError::ConnectionLost { .. })
                    ) && reader.buffer().is_empty();
                    if clean_close {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(transport = %reader.metadata().id, "peer closed the connection");
                        return Ok(());
                    }
                    return Err(error.into());
                }
            },
        }
    }
}

/// Sends an echo request every `interval` until cancelled or a write fails.
async fn keepalive_loop(
    connection: Arc<Connection>,
    strategy: Arc<dyn ProtocolStrategy>,
    interval: Duration,
    metrics: Arc<EngineMetrics>,
    cancel: CancellationToken,
) -> Result<(), EngineError> {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = ticker.tick() => {
                let xid = connection.next_xid();
                connection.write(&strategy.echo_request(xid)).await?;
                metrics.record_echo_request_sent();
                #[cfg(feature = "tracing")]
                tracing::debug!(connection = %connection.id(), xid, "echo request sent");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::strategy_for;
    use crate::openflow::{MAX_MESSAGE_SIZE, MessageBody, PacketIn, msg_type, write_message};
    use crate::transport::{MemoryTransport, StreamWriter};
    use bytes::{BufMut, Bytes, BytesMut};
    use std::sync::atomic::AtomicUsize;
    use tokio::task::JoinHandle;

    struct FakeSwitch {
        reader: StreamReader,
        writer: StreamWriter,
        version: u8,
    }

    impl FakeSwitch {
        fn new(transport: MemoryTransport, version: OpenFlowVersion) -> Self {
            let (reader, writer) = Stream::new(transport).into_split();
            Self {
                reader,
                writer,
                version: version.wire(),
            }
        }

        async fn recv(&mut self) -> Message {
            loop {
                match read_message(&mut self.reader, MAX_MESSAGE_SIZE).await {
                    Ok(message) => return message,
                    Err(error) if error.kind() == CodecErrorKind::Timeout => continue,
                    Err(error) => panic!("switch read failed: {error}"),
                }
            }
        }

        async fn send(&mut self, message: Message) {
            write_message(&mut self.writer, &message, MAX_MESSAGE_SIZE)
                .await
                .unwrap();
        }

        async fn send_features_reply(&mut self, xid: u32, dpid: u64, aux: u8) {
            let mut body = BytesMut::new();
            body.put_u64(dpid);
            body.put_u32(256);
            body.put_u8(64);
            body.put_u8(aux);
            body.put_slice(&[0, 0]);
            body.put_u32(0);
            body.put_u32(0);
            let reply = Message::new(self.version, xid, MessageBody::FeaturesReply(body.freeze()));
            self.send(reply).await;
        }

        /// Reads the hello and features request, then answers the request.
        async fn complete_handshake(&mut self, dpid: u64, aux: u8) {
            assert_eq!(self.recv().await.msg_type(), msg_type::HELLO);
            let request = self.recv().await;
            assert_eq!(request.msg_type(), msg_type::FEATURES_REQUEST);
            self.send_features_reply(request.xid(), dpid, aux).await;
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        up: AtomicUsize,
        down: AtomicUsize,
        packets: Mutex<Vec<PacketIn>>,
    }

    #[async_trait::async_trait]
    impl DeviceObserver for CountingObserver {
        async fn on_device_up(&self, _device: &Arc<Device>) {
            self.up.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_device_down(&self, _datapath_id: DatapathId) {
            self.down.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_packet_in(&self, _device: &Arc<Device>, packet: &PacketIn) {
            self.packets.lock().push(packet.clone());
        }
    }

    fn engine(
        version: OpenFlowVersion,
        pool: &Arc<DevicePool>,
    ) -> (Arc<Transceiver>, FakeSwitch) {
        let (controller, switch) = MemoryTransport::pair(64);
        let engine = Transceiver::new(controller, strategy_for(version), pool.clone());
        (Arc::new(engine), FakeSwitch::new(switch, version))
    }

    fn spawn(
        engine: &Arc<Transceiver>,
        cancel: &CancellationToken,
    ) -> JoinHandle<Result<(), EngineError>> {
        let engine = engine.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { engine.run(cancel).await })
    }

    async fn wait_for(engine: &Transceiver, state: EngineState) {
        let mut states = engine.subscribe();
        tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == state))
            .await
            .expect("state not reached")
            .expect("state channel closed");
    }

    #[tokio::test]
    async fn test_handshake_registers_device() {
        let pool = Arc::new(DevicePool::new());
        let (engine, mut switch) = engine(OpenFlowVersion::V1_0, &pool);
        let cancel = CancellationToken::new();
        let running = spawn(&engine, &cancel);

        let hello = switch.recv().await;
        let request = switch.recv().await;
        assert_eq!(hello.version(), 0x01);
        assert_eq!(request.msg_type(), msg_type::FEATURES_REQUEST);
        assert_ne!(hello.xid(), 0);
        assert_ne!(hello.xid(), request.xid());
        assert_eq!(engine.state(), EngineState::FeaturesRequested);

        switch.send_features_reply(request.xid(), 0x1, 0).await;
        wait_for(&engine, EngineState::Established).await;

        let device = pool.lookup(DatapathId::new(0x1)).unwrap();
        assert_eq!(device.n_buffers(), Some(256));
        assert_eq!(device.n_tables(), Some(64));
        assert!(device.is_operational());
        assert_eq!(
            engine.registration(),
            Some((DatapathId::new(0x1), AuxiliaryId::MAIN))
        );
        assert!(Arc::ptr_eq(&engine.device().unwrap(), &device));

        cancel.cancel();
        running.await.unwrap().unwrap();
        assert_eq!(engine.state(), EngineState::Closed);
        assert!(pool.is_empty());
        assert!(engine.device().is_none());
    }

    #[tokio::test]
    async fn test_version_mismatch_terminates_without_registering() {
        let pool = Arc::new(DevicePool::new());
        let (engine, mut switch) = engine(OpenFlowVersion::V1_3, &pool);
        let running = spawn(&engine, &CancellationToken::new());

        switch.recv().await;
        let request = switch.recv().await;
        switch.version = 0x01;
        switch.send_features_reply(request.xid(), 0x1, 0).await;

        let error = running.await.unwrap().unwrap_err();
        assert!(matches!(
            error,
            EngineError::VersionMismatch {
                expected: 0x04,
                received: 0x01
            }
        ));
        assert!(error.is_protocol_violation());
        assert!(pool.is_empty());
        assert_eq!(engine.state(), EngineState::Closed);
    }

    #[tokio::test]
    async fn test_out_of_range_type_of_other_version_is_mismatch() {
        let pool = Arc::new(DevicePool::new());
        let metrics = Arc::new(EngineMetrics::new());
        let (controller, switch) = MemoryTransport::pair(64);
        let engine = Arc::new(
            Transceiver::new(controller, strategy_for(OpenFlowVersion::V1_3), pool.clone())
                .with_metrics(metrics.clone()),
        );
        let mut switch = FakeSwitch::new(switch, OpenFlowVersion::V1_3);
        let running = spawn(&engine, &CancellationToken::new());

        switch.complete_handshake(0x7, 0).await;
        wait_for(&engine, EngineState::Established).await;

        // Type 25 is valid in 1.3 but beyond the 1.0 range.
        switch
            .writer
            .write_all(&[0x01, 25, 0x00, 0x08, 0, 0, 0, 7])
            .await
            .unwrap();

        let error = running.await.unwrap().unwrap_err();
        assert!(matches!(
            error,
            EngineError::VersionMismatch {
                expected: 0x04,
                received: 0x01
            }
        ));
        assert_eq!(metrics.snapshot().version_mismatches, 1);
        assert_eq!(metrics.snapshot().unsupported_messages, 0);
        assert_eq!(engine.state(), EngineState::Closed);
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_echo_request_answered_with_same_xid_and_payload() {
        let pool = Arc::new(DevicePool::new());
        let (engine, mut switch) = engine(OpenFlowVersion::V1_3, &pool);
        let cancel = CancellationToken::new();
        let running = spawn(&engine, &cancel);

        switch.complete_handshake(0x5, 0).await;
        switch
            .send(Message::new(
                0x04,
                0x1234,
                MessageBody::EchoRequest(Bytes::from_static(b"ping")),
            ))
            .await;

        let reply = switch.recv().await;
        assert_eq!(reply.xid(), 0x1234);
        assert_eq!(reply.body(), &MessageBody::EchoReply(Bytes::from_static(b"ping")));

        cancel.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_sends_echo_requests() {
        let pool = Arc::new(DevicePool::new());
        let (engine, mut switch) = engine(OpenFlowVersion::V1_0, &pool);
        let cancel = CancellationToken::new();
        let running = spawn(&engine, &cancel);

        switch.complete_handshake(0x7, 0).await;
        let first = switch.recv().await;
        let second = switch.recv().await;
        assert_eq!(first.msg_type(), msg_type::ECHO_REQUEST);
        assert_eq!(second.msg_type(), msg_type::ECHO_REQUEST);
        assert_ne!(first.xid(), second.xid());

        switch
            .send(Message::new(0x01, first.xid(), MessageBody::EchoReply(Bytes::new())))
            .await;
        tokio::time::timeout(Duration::from_secs(1), async {
            while engine.last_echo_reply().is_none() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_message_does_not_end_session() {
        let pool = Arc::new(DevicePool::new());
        let metrics = Arc::new(EngineMetrics::new());
        let (controller, switch) = MemoryTransport::pair(64);
        let engine = Arc::new(
            Transceiver::new(controller, strategy_for(OpenFlowVersion::V1_0), pool.clone())
                .with_metrics(metrics.clone()),
        );
        let mut switch = FakeSwitch::new(switch, OpenFlowVersion::V1_0);
        let cancel = CancellationToken::new();
        let running = spawn(&engine, &cancel);

        switch.complete_handshake(0x9, 0).await;
        switch
            .send(Message::new(
                0x01,
                3,
                MessageBody::Other {
                    msg_type: 99,
                    payload: Bytes::from_static(b"vendor"),
                },
            ))
            .await;
        switch
            .send(Message::new(0x01, 4, MessageBody::EchoRequest(Bytes::new())))
            .await;

        assert_eq!(switch.recv().await.xid(), 4);
        assert_eq!(metrics.snapshot().unsupported_messages, 1);
        assert_eq!(engine.state(), EngineState::Established);

        cancel.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_racing_run_stops_session() {
        let pool = Arc::new(DevicePool::new());
        let (engine, _switch) = engine(OpenFlowVersion::V1_0, &pool);
        let cancel = CancellationToken::new();

        let (result, ()) = tokio::time::timeout(
            Duration::from_secs(5),
            async { tokio::join!(engine.run(cancel.clone()), engine.cleanup()) },
        )
        .await
        .expect("session kept running after cleanup");

        assert!(matches!(result, Ok(()) | Err(EngineError::AlreadyStarted)));
        assert!(!cancel.is_cancelled());
        assert_eq!(engine.state(), EngineState::Closed);
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_peer_close_ends_session_cleanly() {
        let pool = Arc::new(DevicePool::new());
        let (engine, mut switch) = engine(OpenFlowVersion::V1_3, &pool);
        let running = spawn(&engine, &CancellationToken::new());

        switch.complete_handshake(0x3, 0).await;
        wait_for(&engine, EngineState::Established).await;
        assert_eq!(pool.len(), 1);

        switch.writer.shutdown().await.unwrap();
        drop(switch);

        running.await.unwrap().unwrap();
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_runs_once() {
        let pool = Arc::new(DevicePool::new());
        let metrics = Arc::new(EngineMetrics::new());
        let (controller, switch) = MemoryTransport::pair(64);
        let engine = Arc::new(
            Transceiver::new(controller, strategy_for(OpenFlowVersion::V1_3), pool.clone())
                .with_metrics(metrics.clone()),
        );
        let mut switch = FakeSwitch::new(switch, OpenFlowVersion::V1_3);
        let running = spawn(&engine, &CancellationToken::new());

        switch.complete_handshake(0x2, 0).await;
        wait_for(&engine, EngineState::Established).await;

        engine.cleanup().await;
        engine.cleanup().await;
        running.await.unwrap().unwrap();
        engine.cleanup().await;

        assert!(pool.is_empty());
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sessions_started, 1);
        assert_eq!(snapshot.sessions_closed, 1);
        assert!(matches!(
            engine.run(CancellationToken::new()).await,
            Err(EngineError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn test_observer_sees_device_lifecycle_and_packets() {
        let pool = Arc::new(DevicePool::new());
        let observer = Arc::new(CountingObserver::default());
        let (controller, switch) = MemoryTransport::pair(64);
        let engine = Arc::new(
            Transceiver::new(controller, strategy_for(OpenFlowVersion::V1_0), pool.clone())
                .with_observer(observer.clone()),
        );
        let mut switch = FakeSwitch::new(switch, OpenFlowVersion::V1_0);
        let cancel = CancellationToken::new();
        let running = spawn(&engine, &cancel);

        switch.complete_handshake(0x4, 0).await;

        let mut body = BytesMut::new();
        body.put_u32(crate::openflow::NO_BUFFER);
        body.put_u16(5);
        body.put_u16(7);
        body.put_u8(0);
        body.put_u8(0);
        body.put_slice(b"frame");
        switch
            .send(Message::new(0x01, 0, MessageBody::PacketIn(body.freeze())))
            .await;
        switch
            .send(Message::new(0x01, 9, MessageBody::EchoRequest(Bytes::new())))
            .await;
        switch.recv().await;

        assert_eq!(observer.up.load(Ordering::SeqCst), 1);
        {
            let packets = observer.packets.lock();
            assert_eq!(packets.len(), 1);
            assert_eq!(packets[0].in_port, 7);
        }

        cancel.cancel();
        running.await.unwrap().unwrap();
        assert_eq!(observer.down.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auxiliary_override_and_stale_cleanup() {
        let pool = Arc::new(DevicePool::new());
        let (controller, switch) = MemoryTransport::pair(64);
        let first = Arc::new(
            Transceiver::new(controller, strategy_for(OpenFlowVersion::V1_0), pool.clone())
                .with_auxiliary_id(AuxiliaryId::new(1)),
        );
        let mut first_switch = FakeSwitch::new(switch, OpenFlowVersion::V1_0);
        let first_run = spawn(&first, &CancellationToken::new());
        first_switch.complete_handshake(0x6, 0).await;
        wait_for(&first, EngineState::Established).await;

        let (controller, switch) = MemoryTransport::pair(64);
        let second = Arc::new(
            Transceiver::new(controller, strategy_for(OpenFlowVersion::V1_0), pool.clone())
                .with_auxiliary_id(AuxiliaryId::new(1)),
        );
        let mut second_switch = FakeSwitch::new(switch, OpenFlowVersion::V1_0);
        let second_cancel = CancellationToken::new();
        let second_run = spawn(&second, &second_cancel);
        second_switch.complete_handshake(0x6, 0).await;
        wait_for(&second, EngineState::Established).await;

        // The reconnect took over slot 1, so the old session must not free it.
        first.cleanup().await;
        first_run.await.unwrap().unwrap();
        let device = pool.lookup(DatapathId::new(0x6)).unwrap();
        assert_eq!(device.auxiliary_ids(), vec![AuxiliaryId::new(1)]);
        assert!(!device.is_operational());

        second_cancel.cancel();
        second_run.await.unwrap().unwrap();
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_handshake() {
        let pool = Arc::new(DevicePool::new());
        let (controller, _switch) = MemoryTransport::pair(64);
        let engine = Transceiver::new(controller, strategy_for(OpenFlowVersion::V1_0), pool)
            .with_config(EngineConfig::new().with_read_timeout(Duration::ZERO));

        let error = engine.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(error, EngineError::Config(_)));
        assert_eq!(engine.state(), EngineState::Closed);
    }
}
