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


//! Typed OpenFlow messages.
//!
//! Only the messages the connection core acts on get a typed body. Everything
//! else travels as [`MessageBody::Other`] with its raw type code, so a switch
//! can send any message its version defines without breaking the session.

use crate::openflow::header::{HEADER_LEN, Header, msg_type};
use crate::openflow::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Buffer ID a switch uses when a packet-in carries the whole frame.
pub const NO_BUFFER: u32 = 0xffff_ffff;

/// Body of an OpenFlow message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Version declaration. 1.3 switches may append hello elements.
    Hello(Bytes),
    /// Error report from the peer.
    Error {
        /// Error type
        error_type: u16,
        /// Error code within the type
        code: u16,
        /// Offending request bytes or diagnostic text
        data: Bytes,
    },
    /// Liveness probe with an arbitrary payload.
    EchoRequest(Bytes),
    /// Answer to a liveness probe, echoing its payload.
    EchoReply(Bytes),
    /// Vendor or experimenter extension.
    Experimenter(Bytes),
    /// Capability query.
    FeaturesRequest,
    /// Capability answer, laid out per version.
    FeaturesReply(Bytes),
    /// Packet forwarded to the controller, laid out per version.
    PacketIn(Bytes),
    /// Any other message, kept opaque.
    Other {
        /// Message type code
        msg_type: u8,
        /// Raw body
        payload: Bytes,
    },
}

impl MessageBody {
    /// Returns the message type code for this body.
    pub fn msg_type(&self) -> u8 {
        match self {
            MessageBody::Hello(_) => msg_type::HELLO,
            MessageBody::Error { .. } => msg_type::ERROR,
            MessageBody::EchoRequest(_) => msg_type::ECHO_REQUEST,
            MessageBody::EchoReply(_) => msg_type::ECHO_REPLY,
            MessageBody::Experimenter(_) => msg_type::EXPERIMENTER,
            MessageBody::FeaturesRequest => msg_type::FEATURES_REQUEST,
            MessageBody::FeaturesReply(_) => msg_type::FEATURES_REPLY,
            MessageBody::PacketIn(_) => msg_type::PACKET_IN,
            MessageBody::Other { msg_type, .. } => *msg_type,
        }
    }

    /// Decodes a body of type `msg_type` from `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Malformed`] if an error message is shorter than
    /// its fixed fields.
    pub fn decode(msg_type: u8, mut payload: Bytes) -> Result<Self, CodecError> {
        let body = match msg_type {
            msg_type::HELLO => MessageBody::Hello(payload),
            msg_type::ERROR => {
                if payload.len() < 4 {
                    return Err(CodecError::Malformed {
                        msg_type,
                        reason: format!("error body is {} bytes, need 4", payload.len()),
                    });
                }
                let error_type = payload.get_u16();
                let code = payload.get_u16();
                MessageBody::Error {
                    error_type,
                    code,
                    data: payload,
                }
            }
            msg_type::ECHO_REQUEST => MessageBody::EchoRequest(payload),
            msg_type::ECHO_REPLY => MessageBody::EchoReply(payload),
            msg_type::EXPERIMENTER => MessageBody::Experimenter(payload),
            msg_type::FEATURES_REQUEST => MessageBody::FeaturesRequest,
            msg_type::FEATURES_REPLY => MessageBody::FeaturesReply(payload),
            msg_type::PACKET_IN => MessageBody::PacketIn(payload),
            msg_type => MessageBody::Other { msg_type, payload },
        };
        Ok(body)
    }

    fn encoded_len(&self) -> usize {
        match self {
            MessageBody::Error { data, .. } => 4 + data.len(),
            MessageBody::FeaturesRequest => 0,
            MessageBody::Hello(payload)
            | MessageBody::EchoRequest(payload)
            | MessageBody::EchoReply(payload)
            | MessageBody::Experimenter(payload)
            | MessageBody::FeaturesReply(payload)
            | MessageBody::PacketIn(payload)
            | MessageBody::Other { payload, .. } => payload.len(),
        }
    }

    fn encode(&self, dst: &mut BytesMut) {
        match self {
            MessageBody::Error {
                error_type,
                code,
                data,
            } => {
                dst.put_u16(*error_type);
                dst.put_u16(*code);
                dst.put_slice(data);
            }
            MessageBody::FeaturesRequest => {}
            MessageBody::Hello(payload)
            | MessageBody::EchoRequest(payload)
            | MessageBody::EchoReply(payload)
            | MessageBody::Experimenter(payload)
            | MessageBody::FeaturesReply(payload)
            | MessageBody::PacketIn(payload)
            | MessageBody::Other { payload, .. } => dst.put_slice(payload),
        }
    }
}

/// An OpenFlow message: version, transaction ID and body.
///
/// The header's type and length are derived from the body when the message
/// is encoded.
///
/// # Examples
///
/// ```rust
/// use cherry::openflow::{Message, MessageBody};
/// use bytes::{Bytes, BytesMut};
///
/// let message = Message::new(0x01, 7, MessageBody::EchoRequest(Bytes::from_static(b"ping")));
///
/// let mut buffer = BytesMut::new();
/// message.encode(&mut buffer, 65535).unwrap();
/// assert_eq!(&buffer[..8], &[0x01, 0x02, 0x00, 0x0c, 0x00, 0x00, 0x00, 0x07]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    version: u8,
    xid: u32,
    body: MessageBody,
}

impl Message {
    /// Creates a message.
    pub fn new(version: u8, xid: u32, body: MessageBody) -> Self {
        Self { version, xid, body }
    }

    /// Returns the wire version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the transaction ID.
    pub fn xid(&self) -> u32 {
        self.xid
    }

    /// Replaces the transaction ID.
    pub fn set_xid(&mut self, xid: u32) {
        self.xid = xid;
    }

    /// Returns the message type code.
    pub fn msg_type(&self) -> u8 {
        self.body.msg_type()
    }

    /// Returns the body.
    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    /// Consumes the message and returns its body.
    pub fn into_body(self) -> MessageBody {
        self.body
    }

    /// Returns the encoded length including the header.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.body.encoded_len()
    }

    /// Returns the header this message encodes with.
    ///
    /// The length saturates at `u16::MAX`; [`encode`](Self::encode) rejects
    /// such messages.
    pub fn header(&self) -> Header {
        Header {
            version: self.version,
            msg_type: self.msg_type(),
            length: u16::try_from(self.encoded_len()).unwrap_or(u16::MAX),
            xid: self.xid,
        }
    }

    /// Appends the wire form of this message to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidLength`] if the message is longer than
    /// `max_message_size` or than the 16-bit length field allows.
    pub fn encode(&self, dst: &mut BytesMut, max_message_size: usize) -> Result<(), CodecError> {
        let length = self.encoded_len();
        let max = max_message_size.min(u16::MAX as usize);
        if length > max {
            return Err(CodecError::InvalidLength {
                length,
                min: HEADER_LEN,
                max,
            });
        }

        dst.reserve(length);
        dst.put_slice(&self.header().to_bytes());
        self.body.encode(dst);
        Ok(())
    }
}

/// A packet-in event, decoded by the connection's version strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    /// Switch buffer holding the frame, `None` if the whole frame is attached.
    pub buffer_id: Option<u32>,
    /// Full length of the frame on the wire.
    pub total_len: u16,
    /// Ingress port.
    pub in_port: u32,
    /// Why the packet was sent to the controller.
    pub reason: u8,
    /// Table that sent the packet (1.3 only).
    pub table_id: Option<u8>,
    /// Captured frame bytes.
    pub data: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_features_request() {
        let message = Message::new(0x04, 0x0a0b, MessageBody::FeaturesRequest);
        let mut buffer = BytesMut::new();
        message.encode(&mut buffer, 65535).unwrap();
        assert_eq!(&buffer[..], &[0x04, 0x05, 0x00, 0x08, 0x00, 0x00, 0x0a, 0x0b]);
    }

    #[test]
    fn test_encode_error_body() {
        let message = Message::new(
            0x01,
            3,
            MessageBody::Error {
                error_type: 1,
                code: 2,
                data: Bytes::from_static(b"x"),
            },
        );
        let mut buffer = BytesMut::new();
        message.encode(&mut buffer, 65535).unwrap();
        assert_eq!(buffer.len(), 13);
        assert_eq!(&buffer[8..], &[0x00, 0x01, 0x00, 0x02, b'x']);
    }

    #[test]
    fn test_encode_rejects_oversized_message() {
        let message = Message::new(0x01, 1, MessageBody::EchoRequest(Bytes::from(vec![0u8; 64])));
        let mut buffer = BytesMut::new();
        let error = message.encode(&mut buffer, 32).unwrap_err();
        assert!(matches!(error, CodecError::InvalidLength { length: 72, .. }));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_short_error_is_malformed() {
        let error = MessageBody::decode(msg_type::ERROR, Bytes::from_static(&[0x00])).unwrap_err();
        assert!(matches!(error, CodecError::Malformed { msg_type: 1, .. }));
    }

    #[test]
    fn test_decode_unknown_type_is_opaque() {
        let body = MessageBody::decode(14, Bytes::from_static(b"flow-mod")).unwrap();
        assert_eq!(body.msg_type(), 14);
        assert!(matches!(body, MessageBody::Other { msg_type: 14, .. }));
    }
}
