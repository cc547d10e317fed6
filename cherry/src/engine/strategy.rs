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


//! Version strategies.
//!
//! The handshake and keepalive scaffolding is the same for every OpenFlow
//! version; building a few messages and reading the features reply and
//! packet-in layouts are not. A [`ProtocolStrategy`] captures exactly those
//! differences. An engine is given one strategy for its whole lifetime.
//!
//! The trait's provided methods hold the behavior the versions share, and
//! each version overrides only what its wire format changes.

use crate::device::{AuxiliaryId, DatapathId};
use crate::openflow::{
    Message, MessageBody, NO_BUFFER, OpenFlowVersion, PacketIn, ProtocolDecodeError,
};
use bytes::{Buf, Bytes};
use std::fmt;
use std::sync::Arc;

/// Switch description extracted from a features reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// Switch identity
    pub datapath_id: DatapathId,
    /// Packets the switch can buffer while waiting for the controller
    pub n_buffers: u32,
    /// Flow tables the datapath supports
    pub n_tables: u8,
    /// Connection slot the switch assigned this channel (always main in 1.0)
    pub auxiliary_id: AuxiliaryId,
    /// Capability bitmap
    pub capabilities: u32,
}

/// What a received message means to the engine's dispatch logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Peer's version declaration
    Hello,
    /// Error report
    Error,
    /// Peer asks for a liveness answer
    EchoRequest,
    /// Answer to one of our echo requests
    EchoReply,
    /// Vendor or experimenter extension
    Experimenter,
    /// Answer to our features request
    FeaturesReply,
    /// Packet forwarded to the controller
    PacketIn,
    /// A type the engine does not act on
    Other(u8),
}

/// Version-specific message construction and parsing.
///
/// # Examples
///
/// ```rust
/// use cherry::engine::{MessageKind, ProtocolStrategy, strategy_for};
/// use cherry::openflow::OpenFlowVersion;
///
/// let strategy = strategy_for(OpenFlowVersion::V1_3);
/// let hello = strategy.hello(1);
///
/// assert_eq!(hello.version(), 0x04);
/// assert_eq!(strategy.classify(&hello), MessageKind::Hello);
/// ```
pub trait ProtocolStrategy: Send + Sync + fmt::Debug {
    /// Version this strategy speaks.
    fn version(&self) -> OpenFlowVersion;

    /// Builds the version declaration sent first on a connection.
    fn hello(&self, xid: u32) -> Message {
        Message::new(self.version().wire(), xid, MessageBody::Hello(Bytes::new()))
    }

    /// Builds the capability query.
    fn features_request(&self, xid: u32) -> Message {
        Message::new(self.version().wire(), xid, MessageBody::FeaturesRequest)
    }

    /// Builds a keepalive probe.
    fn echo_request(&self, xid: u32) -> Message {
        Message::new(
            self.version().wire(),
            xid,
            MessageBody::EchoRequest(Bytes::new()),
        )
    }

    /// Builds the answer to a peer's echo request.
    ///
    /// The reply carries the request's transaction ID and payload unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolDecodeError::UnexpectedBody`] if `request` is not an
    /// echo request.
    fn echo_reply(&self, request: &Message) -> Result<Message, ProtocolDecodeError> {
        match request.body() {
            MessageBody::EchoRequest(payload) => Ok(Message::new(
                self.version().wire(),
                request.xid(),
                MessageBody::EchoReply(payload.clone()),
            )),
            _ => Err(ProtocolDecodeError::UnexpectedBody {
                expected: "echo request",
                msg_type: request.msg_type(),
            }),
        }
    }

    /// Decides how the engine dispatches `message`.
    fn classify(&self, message: &Message) -> MessageKind {
        match message.body() {
            MessageBody::Hello(_) => MessageKind::Hello,
            MessageBody::Error { .. } => MessageKind::Error,
            MessageBody::EchoRequest(_) => MessageKind::EchoRequest,
            MessageBody::EchoReply(_) => MessageKind::EchoReply,
            MessageBody::Experimenter(_) => MessageKind::Experimenter,
            MessageBody::FeaturesReply(_) => MessageKind::FeaturesReply,
            MessageBody::PacketIn(_) => MessageKind::PacketIn,
            MessageBody::FeaturesRequest | MessageBody::Other { .. } => {
                MessageKind::Other(message.msg_type())
            }
        }
    }

    /// Extracts the switch description from a features reply.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolDecodeError`] if `message` is not a features reply
    /// of this version or its body is too short.
    fn parse_features_reply(&self, message: &Message) -> Result<Features, ProtocolDecodeError>;

    /// Extracts a packet-in event.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolDecodeError`] if `message` is not a packet-in of
    /// this version or its body is too short.
    fn parse_packet_in(&self, message: &Message) -> Result<PacketIn, ProtocolDecodeError>;
}

/// Returns the strategy for `version`.
pub fn strategy_for(version: OpenFlowVersion) -> Arc<dyn ProtocolStrategy> {
    match version {
        OpenFlowVersion::V1_0 => Arc::new(OpenFlow10),
        OpenFlowVersion::V1_3 => Arc::new(OpenFlow13),
    }
}

/// Returns the body of `message` after checking its version and variant.
fn expect_body<'a>(
    strategy: &dyn ProtocolStrategy,
    message: &'a Message,
    expected: &'static str,
    select: impl FnOnce(&'a MessageBody) -> Option<&'a Bytes>,
) -> Result<Bytes, ProtocolDecodeError> {
    let wire = strategy.version().wire();
    if message.version() != wire {
        return Err(ProtocolDecodeError::WrongVersion {
            expected: wire,
            actual: message.version(),
        });
    }

    select(message.body())
        .cloned()
        .ok_or(ProtocolDecodeError::UnexpectedBody {
            expected,
            msg_type: message.msg_type(),
        })
}

fn require_len(
    body: &Bytes,
    message: &'static str,
    required: usize,
) -> Result<(), ProtocolDecodeError> {
    if body.len() < required {
        return Err(ProtocolDecodeError::Truncated {
            message,
            required,
            actual: body.len(),
        });
    }
    Ok(())
}

fn buffer_id(raw: u32) -> Option<u32> {
    (raw != NO_BUFFER).then_some(raw)
}

/// Fixed part of a features reply in both supported versions.
const FEATURES_REPLY_LEN: usize = 24;

/// OpenFlow 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlow10;

impl OpenFlow10 {
    const PACKET_IN_LEN: usize = 10;
}

impl ProtocolStrategy for OpenFlow10 {
    fn version(&self) -> OpenFlowVersion {
        OpenFlowVersion::V1_0
    }

    fn parse_features_reply(&self, message: &Message) -> Result<Features, ProtocolDecodeError> {
        let mut body = expect_body(self, message, "features reply", |body| match body {
            MessageBody::FeaturesReply(payload) => Some(payload),
            _ => None,
        })?;
        require_len(&body, "features reply", FEATURES_REPLY_LEN)?;

        let datapath_id = DatapathId::new(body.get_u64());
        let n_buffers = body.get_u32();
        let n_tables = body.get_u8();
        body.advance(3);
        let capabilities = body.get_u32();

        Ok(Features {
            datapath_id,
            n_buffers,
            n_tables,
            auxiliary_id: AuxiliaryId::MAIN,
            capabilities,
        })
    }

    fn parse_packet_in(&self, message: &Message) -> Result<PacketIn, ProtocolDecodeError> {
        let mut body = expect_body(self, message, "packet-in", |body| match body {
            MessageBody::PacketIn(payload) => Some(payload),
            _ => None,
        })?;
        require_len(&body, "packet-in", Self::PACKET_IN_LEN)?;

        let buffer = body.get_u32();
        let total_len = body.get_u16();
        let in_port = u32::from(body.get_u16());
        let reason = body.get_u8();
        body.advance(1);

        Ok(PacketIn {
            buffer_id: buffer_id(buffer),
            total_len,
            in_port,
            reason,
            table_id: None,
            data: body,
        })
    }
}

/// OpenFlow 1.3.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlow13;

impl OpenFlow13 {
    /// Hello element advertising support for version 0x04 only.
    const VERSION_BITMAP_HELLO: [u8; 8] = [0x00, 0x01, 0x00, 0x08, 0x00, 0x00, 0x00, 0x10];

    /// Fixed fields before the match: buffer_id, total_len, reason, table_id, cookie.
    const PACKET_IN_FIXED_LEN: usize = 16;

    /// OXM class and field of the ingress port match field.
    const OXM_CLASS_OPENFLOW_BASIC: u16 = 0x8000;
    const OXM_FIELD_IN_PORT: u8 = 0;

    /// Finds the ingress port among the OXM fields of a match.
    fn oxm_in_port(mut fields: Bytes) -> Option<u32> {
        while fields.len() >= 4 {
            let header = fields.get_u32();
            let class = (header >> 16) as u16;
            let field = ((header >> 9) & 0x7f) as u8;
            let length = (header & 0xff) as usize;
            if fields.len() < length {
                return None;
            }
            if class == Self::OXM_CLASS_OPENFLOW_BASIC
                && field == Self::OXM_FIELD_IN_PORT
                && length == 4
            {
                return Some(fields.get_u32());
            }
            fields.advance(length);
        }
        None
    }
}

impl ProtocolStrategy for OpenFlow13 {
    fn version(&self) -> OpenFlowVersion {
        OpenFlowVersion::V1_3
    }

    fn hello(&self, xid: u32) -> Message {
        Message::new(
            self.version().wire(),
            xid,
            MessageBody::Hello(Bytes::from_static(&Self::VERSION_BITMAP_HELLO)),
        )
    }

    fn parse_features_reply(&self, message: &Message) -> Result<Features, ProtocolDecodeError> {
        let mut body = expect_body(self, message, "features reply", |body| match body {
            MessageBody::FeaturesReply(payload) => Some(payload),
            _ => None,
        })?;
        require_len(&body, "features reply", FEATURES_REPLY_LEN)?;

        let datapath_id = DatapathId::new(body.get_u64());
        let n_buffers = body.get_u32();
        let n_tables = body.get_u8();
        let auxiliary_id = AuxiliaryId::new(body.get_u8());
        body.advance(2);
        let capabilities = body.get_u32();

        Ok(Features {
            datapath_id,
            n_buffers,
            n_tables,
            auxiliary_id,
            capabilities,
        })
    }

    fn parse_packet_in(&self, message: &Message) -> Result<PacketIn, ProtocolDecodeError> {
        let mut body = expect_body(self, message, "packet-in", |body| match body {
            MessageBody::PacketIn(payload) => Some(payload),
            _ => None,
        })?;
        require_len(&body, "packet-in", Self::PACKET_IN_FIXED_LEN + 4)?;

        let buffer = body.get_u32();
        let total_len = body.get_u16();
        let reason = body.get_u8();
        let table_id = body.get_u8();
        body.advance(8);

        // ofp_match: type, length (excluding padding), OXM fields, pad to 8
        let match_len = usize::from(u16::from_be_bytes([body[2], body[3]]));
        let padded_len = match_len.div_ceil(8) * 8;
        require_len(&body, "packet-in", padded_len.max(4) + 2)?;
        let fields = body.slice(4..match_len.max(4));
        body.advance(padded_len.max(4) + 2);

        Ok(PacketIn {
            buffer_id: buffer_id(buffer),
            total_len,
            in_port: Self::oxm_in_port(fields).unwrap_or(0),
            reason,
            table_id: Some(table_id),
            data: body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn features_reply(version: u8, aux: u8) -> Message {
        let mut body = BytesMut::new();
        body.put_u64(0x1);
        body.put_u32(256);
        body.put_u8(64);
        body.put_u8(aux);
        body.put_slice(&[0, 0]);
        body.put_u32(0xc7);
        body.put_u32(0);
        Message::new(version, 2, MessageBody::FeaturesReply(body.freeze()))
    }

    #[test]
    fn test_of10_parse_features_reply() {
        let features = OpenFlow10.parse_features_reply(&features_reply(0x01, 0)).unwrap();
        assert_eq!(features.datapath_id, DatapathId::new(1));
        assert_eq!(features.n_buffers, 256);
        assert_eq!(features.n_tables, 64);
        assert_eq!(features.auxiliary_id, AuxiliaryId::MAIN);
        assert_eq!(features.capabilities, 0xc7);
    }

    #[test]
    fn test_of10_ignores_padding_byte() {
        // In 1.0 the byte after n_tables is padding, never an auxiliary ID.
        let features = OpenFlow10.parse_features_reply(&features_reply(0x01, 3)).unwrap();
        assert_eq!(features.auxiliary_id, AuxiliaryId::MAIN);
    }

    #[test]
    fn test_of13_parse_features_reply_auxiliary() {
        let features = OpenFlow13.parse_features_reply(&features_reply(0x04, 1)).unwrap();
        assert_eq!(features.auxiliary_id, AuxiliaryId::new(1));
        assert_eq!(features.n_tables, 64);
    }

    #[test]
    fn test_parse_features_reply_wrong_version() {
        let error = OpenFlow13.parse_features_reply(&features_reply(0x01, 0)).unwrap_err();
        assert!(matches!(
            error,
            ProtocolDecodeError::WrongVersion {
                expected: 0x04,
                actual: 0x01
            }
        ));
    }

    #[test]
    fn test_parse_features_reply_rejects_other_body() {
        let message = Message::new(0x01, 1, MessageBody::EchoReply(Bytes::new()));
        let error = OpenFlow10.parse_features_reply(&message).unwrap_err();
        assert!(matches!(
            error,
            ProtocolDecodeError::UnexpectedBody { msg_type: 3, .. }
        ));
    }

    #[test]
    fn test_parse_features_reply_truncated() {
        let message = Message::new(
            0x01,
            1,
            MessageBody::FeaturesReply(Bytes::from_static(&[0u8; 12])),
        );
        let error = OpenFlow10.parse_features_reply(&message).unwrap_err();
        assert!(matches!(
            error,
            ProtocolDecodeError::Truncated { actual: 12, .. }
        ));
    }

    #[test]
    fn test_echo_reply_keeps_xid_and_payload() {
        let request = Message::new(
            0x01,
            0xdead,
            MessageBody::EchoRequest(Bytes::from_static(b"probe")),
        );
        let reply = OpenFlow10.echo_reply(&request).unwrap();
        assert_eq!(reply.xid(), 0xdead);
        assert_eq!(reply.body(), &MessageBody::EchoReply(Bytes::from_static(b"probe")));
    }

    #[test]
    fn test_of13_hello_carries_version_bitmap() {
        let hello = OpenFlow13.hello(9);
        assert_eq!(hello.version(), 0x04);
        assert_eq!(hello.xid(), 9);
        match hello.body() {
            MessageBody::Hello(elements) => assert_eq!(elements.len(), 8),
            other => panic!("unexpected body {other:?}"),
        }
        assert!(matches!(OpenFlow10.hello(1).body(), MessageBody::Hello(e) if e.is_empty()));
    }

    #[test]
    fn test_classify() {
        let strategy = strategy_for(OpenFlowVersion::V1_0);
        let echo = strategy.echo_request(4);
        assert_eq!(strategy.classify(&echo), MessageKind::EchoRequest);

        let other = Message::new(
            0x01,
            1,
            MessageBody::Other {
                msg_type: 12,
                payload: Bytes::new(),
            },
        );
        assert_eq!(strategy.classify(&other), MessageKind::Other(12));
    }

    #[test]
    fn test_of10_parse_packet_in() {
        let mut body = BytesMut::new();
        body.put_u32(NO_BUFFER);
        body.put_u16(60);
        body.put_u16(3);
        body.put_u8(0);
        body.put_u8(0);
        body.put_slice(b"frame");
        let message = Message::new(0x01, 0, MessageBody::PacketIn(body.freeze()));

        let packet = OpenFlow10.parse_packet_in(&message).unwrap();
        assert_eq!(packet.buffer_id, None);
        assert_eq!(packet.total_len, 60);
        assert_eq!(packet.in_port, 3);
        assert_eq!(packet.table_id, None);
        assert_eq!(&packet.data[..], b"frame");
    }

    #[test]
    fn test_of13_parse_packet_in() {
        let mut body = BytesMut::new();
        body.put_u32(17);
        body.put_u16(42);
        body.put_u8(1);
        body.put_u8(2);
        body.put_u64(0);
        // OXM match with in_port = 5: type 1, length 12, padded to 16
        body.put_u16(1);
        body.put_u16(12);
        body.put_u32(0x8000_0004);
        body.put_u32(5);
        body.put_slice(&[0, 0, 0, 0]);
        body.put_slice(&[0, 0]);
        body.put_slice(b"frame");
        let message = Message::new(0x04, 0, MessageBody::PacketIn(body.freeze()));

        let packet = OpenFlow13.parse_packet_in(&message).unwrap();
        assert_eq!(packet.buffer_id, Some(17));
        assert_eq!(packet.total_len, 42);
        assert_eq!(packet.reason, 1);
        assert_eq!(packet.table_id, Some(2));
        assert_eq!(packet.in_port, 5);
        assert_eq!(&packet.data[..], b"frame");
    }
}
