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


//! OpenFlow message framing over a [`Stream`](crate::transport::Stream).
//!
//! [`decode`] extracts one message from a receive buffer, [`read_message`]
//! drives it against a [`StreamReader`], and [`write_message`] encodes a
//! message and writes it through a [`StreamWriter`].
//!
//! Decode failures are classified by [`CodecError::kind`]:
//!
//! - **Timeout**: the read deadline passed before a full message arrived.
//!   Received bytes stay buffered for the next call.
//! - **Unsupported**: a known version carried a type code it does not
//!   define. The message was consumed and the stream is still in sync.
//! - **Fatal**: anything else. The stream cannot be trusted any further.

use crate::openflow::header::{HEADER_LEN, Header};
use crate::openflow::{CodecError, Message, MessageBody, OpenFlowVersion};
use crate::transport::{StreamReader, StreamWriter};
use bytes::{Buf, BytesMut};

/// Largest message the 16-bit length field can describe.
pub const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;

/// Decodes one message from the front of `buffer`.
///
/// Returns `Ok(None)` when `buffer` does not yet hold a complete message.
/// Consumed bytes are removed from `buffer`, including those of a message
/// reported as [`CodecError::Unsupported`].
///
/// A message whose version byte is not a supported OpenFlow version is
/// decoded as-is. Rejecting it is up to the caller, which knows the version
/// the connection speaks.
///
/// # Errors
///
/// - [`CodecError::InvalidLength`] if the header length is below the header
///   size or above `max_message_size`
/// - [`CodecError::Unsupported`] if the type code is beyond the version's range
/// - [`CodecError::Malformed`] if a typed body is too short
pub fn decode(buffer: &mut BytesMut, max_message_size: usize) -> Result<Option<Message>, CodecError> {
    let Some(header) = Header::parse(&buffer[..]) else {
        return Ok(None);
    };

    let length = header.length as usize;
    if !(HEADER_LEN..=max_message_size).contains(&length) {
        return Err(CodecError::InvalidLength {
            length,
            min: HEADER_LEN,
            max: max_message_size,
        });
    }

    if buffer.len() < length {
        buffer.reserve(length - buffer.len());
        return Ok(None);
    }

    let mut frame = buffer.split_to(length).freeze();
    frame.advance(HEADER_LEN);

    let known_type = OpenFlowVersion::from_wire(header.version)
        .is_none_or(|version| header.msg_type <= version.max_message_type());
    if !known_type {
        return Err(CodecError::Unsupported {
            version: header.version,
            msg_type: header.msg_type,
        });
    }

    let body = MessageBody::decode(header.msg_type, frame)?;
    Ok(Some(Message::new(header.version, header.xid, body)))
}

/// Reads the next complete message from `reader`.
///
/// Cancelling the returned future loses no data; bytes already received stay
/// in the reader's buffer.
///
/// # Errors
///
/// Any [`CodecError`]; see [`CodecError::kind`] for how to react.
pub async fn read_message(
    reader: &mut StreamReader,
    max_message_size: usize,
) -> Result<Message, CodecError> {
    loop {
        if let Some(message) = decode(reader.buffer_mut(), max_message_size)? {
            return Ok(message);
        }
        reader.fill_buf().await?;
    }
}

/// Encodes `message` and writes it to `writer` within its write timeout.
///
/// # Errors
///
/// - [`CodecError::InvalidLength`] if the message is too large to encode
/// - [`CodecError::Transport`] if the write failed or timed out
pub async fn write_message(
    writer: &mut StreamWriter,
    message: &Message,
    max_message_size: usize,
) -> Result<(), CodecError> {
    let mut buffer = BytesMut::with_capacity(message.encoded_len());
    message.encode(&mut buffer, max_message_size)?;
    writer.write_all(&buffer).await?;
    Ok(())
}
