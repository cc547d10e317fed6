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


//! A scripted switch for driving protocol engines over in-memory transports.

#![allow(dead_code)]

use bytes::{BufMut, Bytes, BytesMut};
use cherry::device::DevicePool;
use cherry::engine::{EngineConfig, EngineError, EngineState, Transceiver, strategy_for};
use cherry::openflow::{
    CodecErrorKind, MAX_MESSAGE_SIZE, Message, MessageBody, NO_BUFFER, OpenFlowVersion, msg_type,
    read_message, write_message,
};
use cherry::transport::{MemoryTransport, Stream, StreamReader, StreamWriter};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct FakeSwitch {
    pub reader: StreamReader,
    pub writer: StreamWriter,
    pub version: u8,
}

impl FakeSwitch {
    pub fn new(transport: MemoryTransport, version: OpenFlowVersion) -> Self {
        let (reader, writer) = Stream::new(transport).into_split();
        Self {
            reader,
            writer,
            version: version.wire(),
        }
    }

    pub async fn recv(&mut self) -> Message {
        loop {
            match read_message(&mut self.reader, MAX_MESSAGE_SIZE).await {
                Ok(message) => return message,
                Err(error) if error.kind() == CodecErrorKind::Timeout => continue,
                Err(error) => panic!("switch read failed: {error}"),
            }
        }
    }

    /// Receives messages until one of type `wanted` arrives.
    pub async fn recv_type(&mut self, wanted: u8) -> Message {
        loop {
            let message = self.recv().await;
            if message.msg_type() == wanted {
                return message;
            }
        }
    }

    pub async fn send(&mut self, body: MessageBody, xid: u32) {
        let message = Message::new(self.version, xid, body);
        write_message(&mut self.writer, &message, MAX_MESSAGE_SIZE)
            .await
            .unwrap();
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    /// Reads the hello and features request and returns the request's xid.
    pub async fn expect_handshake(&mut self) -> u32 {
        assert_eq!(self.recv().await.msg_type(), msg_type::HELLO);
        let request = self.recv().await;
        assert_eq!(request.msg_type(), msg_type::FEATURES_REQUEST);
        request.xid()
    }

    pub async fn send_features_reply(&mut self, xid: u32, switch: SwitchFeatures) {
        self.send(MessageBody::FeaturesReply(switch.encode()), xid).await;
    }

    pub async fn complete_handshake(&mut self, switch: SwitchFeatures) {
        let xid = self.expect_handshake().await;
        self.send_features_reply(xid, switch).await;
    }

    /// Sends an OpenFlow 1.0 packet-in carrying `frame` from `in_port`.
    pub async fn send_packet_in_v10(&mut self, in_port: u16, frame: &'static [u8]) {
        let mut body = BytesMut::new();
        body.put_u32(NO_BUFFER);
        body.put_u16(frame.len() as u16);
        body.put_u16(in_port);
        body.put_u8(0);
        body.put_u8(0);
        body.put_slice(frame);
        self.send(MessageBody::PacketIn(body.freeze()), 0).await;
    }

    /// Sends an echo request and waits for the matching reply.
    pub async fn ping(&mut self, xid: u32) -> Message {
        self.send(MessageBody::EchoRequest(Bytes::from_static(b"ping")), xid)
            .await;
        let reply = self.recv_type(msg_type::ECHO_REPLY).await;
        assert_eq!(reply.xid(), xid);
        reply
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SwitchFeatures {
    pub datapath_id: u64,
    pub n_buffers: u32,
    pub n_tables: u8,
    pub auxiliary_id: u8,
}

impl SwitchFeatures {
    pub fn new(datapath_id: u64) -> Self {
        Self {
            datapath_id,
            n_buffers: 256,
            n_tables: 64,
            auxiliary_id: 0,
        }
    }

    pub fn auxiliary(mut self, auxiliary_id: u8) -> Self {
        self.auxiliary_id = auxiliary_id;
        self
    }

    /// The shared 24-byte reply layout. Byte 13 is padding in 1.0 and the
    /// auxiliary ID in 1.3.
    fn encode(&self) -> Bytes {
        let mut body = BytesMut::new();
        body.put_u64(self.datapath_id);
        body.put_u32(self.n_buffers);
        body.put_u8(self.n_tables);
        body.put_u8(self.auxiliary_id);
        body.put_slice(&[0, 0]);
        body.put_u32(0);
        body.put_u32(0);
        body.freeze()
    }
}

pub struct Session {
    pub engine: Arc<Transceiver>,
    pub switch: FakeSwitch,
    pub cancel: CancellationToken,
    pub handle: JoinHandle<Result<(), EngineError>>,
}

impl Session {
    /// Spawns `engine` against a fresh fake switch.
    pub fn spawn(engine: Transceiver, switch: FakeSwitch) -> Self {
        let engine = Arc::new(engine);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let engine = engine.clone();
            let cancel = cancel.clone();
            async move { engine.run(cancel).await }
        });
        Self {
            engine,
            switch,
            cancel,
            handle,
        }
    }

    pub async fn wait_for(&self, state: EngineState) {
        let mut states = self.engine.subscribe();
        tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == state))
            .await
            .expect("state not reached")
            .expect("state channel closed");
    }

    pub async fn stop(self) -> Result<(), EngineError> {
        self.cancel.cancel();
        self.handle.await.expect("engine task panicked")
    }

    pub async fn join(self) -> Result<(), EngineError> {
        self.handle.await.expect("engine task panicked")
    }
}

/// Builds an engine and its fake switch sharing `pool`.
pub fn pair(
    version: OpenFlowVersion,
    pool: &Arc<DevicePool>,
    config: EngineConfig,
) -> (Transceiver, FakeSwitch) {
    let (controller, switch) = MemoryTransport::pair(64);
    let engine =
        Transceiver::new(controller, strategy_for(version), pool.clone()).with_config(config);
    (engine, FakeSwitch::new(switch, version))
}
