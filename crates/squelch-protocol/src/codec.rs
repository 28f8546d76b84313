//! Session frame codec.
//!
//! A frame is a big-endian `u32` body length followed by a named-field
//! MessagePack body. Routing encodes each chat frame once and hands the same
//! [`Bytes`] to every recipient session.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::frames::Frame;

/// Largest accepted body (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

const HEADER_LEN: usize = std::mem::size_of::<u32>();

/// Codec errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Frame body of {size} bytes exceeds {MAX_FRAME_SIZE}")]
    Oversized { size: usize },

    #[error("Truncated frame: {needed} more bytes expected")]
    Truncated { needed: usize },

    #[error("Failed to serialize frame: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Failed to deserialize frame: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Serialize a frame with its length header.
///
/// # Errors
///
/// Returns an error if serialization fails or the body is oversized.
pub fn encode(frame: &Frame) -> Result<Bytes, ProtocolError> {
    let body = rmp_serde::to_vec_named(frame)?;
    if body.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::Oversized { size: body.len() });
    }

    let mut out = BytesMut::with_capacity(HEADER_LEN + body.len());
    out.put_u32(body.len() as u32);
    out.put_slice(&body);
    Ok(out.freeze())
}

/// Parse one frame from the front of `data`. Trailing bytes are ignored.
///
/// # Errors
///
/// Returns an error if `data` is truncated, the declared body is oversized,
/// or the body does not deserialize.
pub fn decode(data: &[u8]) -> Result<Frame, ProtocolError> {
    let mut header = data;
    if header.remaining() < HEADER_LEN {
        return Err(ProtocolError::Truncated {
            needed: HEADER_LEN - header.remaining(),
        });
    }

    let size = header.get_u32() as usize;
    if size > MAX_FRAME_SIZE {
        return Err(ProtocolError::Oversized { size });
    }
    let body = header.get(..size).ok_or_else(|| ProtocolError::Truncated {
        needed: size - header.len(),
    })?;

    Ok(rmp_serde::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{ChatChannel, ChatRecord};

    fn chat(text: &str) -> Frame {
        Frame::chat(
            ChatRecord::new(ChatChannel::Radio, text, format!("[Common] {text}")).with_sender(3),
        )
    }

    #[test]
    fn test_chat_frame_survives_encoding() {
        let frame = chat("status green");
        let encoded = encode(&frame).unwrap();
        assert_eq!(&encoded[..HEADER_LEN], &((encoded.len() - HEADER_LEN) as u32).to_be_bytes());
        assert_eq!(decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn test_truncated_input() {
        let encoded = encode(&chat("status green")).unwrap();

        assert!(matches!(
            decode(&encoded[..2]),
            Err(ProtocolError::Truncated { needed: 2 })
        ));
        let cut = encoded.len() - 3;
        assert!(matches!(
            decode(&encoded[..cut]),
            Err(ProtocolError::Truncated { needed: 3 })
        ));
    }

    #[test]
    fn test_oversized_body() {
        assert!(matches!(
            encode(&chat(&"a".repeat(MAX_FRAME_SIZE + 1))),
            Err(ProtocolError::Oversized { .. })
        ));

        let mut forged = BytesMut::new();
        forged.put_u32(MAX_FRAME_SIZE as u32 + 1);
        assert!(matches!(
            decode(&forged),
            Err(ProtocolError::Oversized { size }) if size == MAX_FRAME_SIZE + 1
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut buf = BytesMut::new();
        buf.put_slice(&encode(&Frame::chime("/Audio/radio_chime.ogg", -7.0)).unwrap());
        buf.put_slice(&encode(&chat("next")).unwrap());

        assert_eq!(
            decode(&buf).unwrap(),
            Frame::chime("/Audio/radio_chime.ogg", -7.0)
        );
    }
}
