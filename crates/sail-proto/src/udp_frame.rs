// SPDX-License-Identifier: Apache-2.0
//! Binary UDP framing used by `sail-udp-gateway` (§6 supplement).
//!
//! Header: `type(u8) flags(u8) reserved(u16) sequence(u32) payload_len(u32)`,
//! all big-endian, 12 bytes total, followed by a `bincode`-encoded
//! payload and a trailing 4-byte CRC32 over header+payload. A 32-byte
//! hash trailer would be redundant here: the snapshot payload already
//! carries its own checksum (§4.5), so UDP framing only needs to catch
//! transport-level corruption, which CRC32 is cheap enough to do every
//! packet.

use thiserror::Error;

use crate::json::{ClientMessage, ServerMessage};

const HEADER_LEN: usize = 12;
const TRAILER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Handshake,
    InputFrame,
    GameState,
    ModuleInteractResult,
    Keepalive,
}

impl FrameType {
    #[must_use]
    pub const fn wire_value(self) -> u8 {
        match self {
            FrameType::Handshake => 0,
            FrameType::InputFrame => 1,
            FrameType::GameState => 2,
            FrameType::ModuleInteractResult => 3,
            FrameType::Keepalive => 4,
        }
    }

    #[must_use]
    pub const fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(FrameType::Handshake),
            1 => Some(FrameType::InputFrame),
            2 => Some(FrameType::GameState),
            3 => Some(FrameType::ModuleInteractResult),
            4 => Some(FrameType::Keepalive),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("datagram shorter than the minimum frame size")]
    TooShort,
    #[error("unrecognized frame type byte {0}")]
    UnknownType(u8),
    #[error("declared payload length does not match the datagram")]
    LengthMismatch,
    #[error("CRC32 trailer did not match")]
    ChecksumMismatch,
}

#[derive(Debug, Clone)]
pub struct UdpFrame {
    pub frame_type: FrameType,
    pub flags: u8,
    pub sequence: u32,
    pub payload: Vec<u8>,
}

/// Encodes a frame: header, raw payload bytes, then a CRC32 trailer
/// over everything preceding it.
#[must_use]
pub fn encode_frame(frame_type: FrameType, flags: u8, sequence: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + TRAILER_LEN);
    buf.push(frame_type.wire_value());
    buf.push(flags);
    buf.extend_from_slice(&0u16.to_be_bytes()); // reserved
    buf.extend_from_slice(&sequence.to_be_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);

    let crc = crc32fast::hash(&buf);
    buf.extend_from_slice(&crc.to_be_bytes());
    buf
}

/// Decodes and checksum-verifies one datagram.
pub fn decode_frame(datagram: &[u8]) -> Result<UdpFrame, FrameError> {
    if datagram.len() < HEADER_LEN + TRAILER_LEN {
        return Err(FrameError::TooShort);
    }
    let (body, trailer) = datagram.split_at(datagram.len() - TRAILER_LEN);
    let expected_crc = u32::from_be_bytes(trailer.try_into().expect("4-byte slice"));
    if crc32fast::hash(body) != expected_crc {
        return Err(FrameError::ChecksumMismatch);
    }

    let type_byte = body[0];
    let flags = body[1];
    let sequence = u32::from_be_bytes(body[4..8].try_into().expect("4-byte slice"));
    let payload_len = u32::from_be_bytes(body[8..12].try_into().expect("4-byte slice")) as usize;
    let payload = &body[HEADER_LEN..];
    if payload.len() != payload_len {
        return Err(FrameError::LengthMismatch);
    }
    let frame_type = FrameType::from_wire(type_byte).ok_or(FrameError::UnknownType(type_byte))?;

    Ok(UdpFrame {
        frame_type,
        flags,
        sequence,
        payload: payload.to_vec(),
    })
}

/// Coarse wire category for a client message, used as the header's
/// `type` byte. The payload itself still carries the exact variant via
/// its serde tag, so this is only a cheap routing/stats hint.
#[must_use]
pub fn client_frame_type(message: &ClientMessage) -> FrameType {
    match message {
        ClientMessage::Handshake { .. } => FrameType::Handshake,
        ClientMessage::InputFrame { .. } => FrameType::InputFrame,
        ClientMessage::CannonAim { .. }
        | ClientMessage::CannonFire { .. }
        | ClientMessage::ModuleInteract { .. } => FrameType::ModuleInteractResult,
        ClientMessage::Ping { .. } => FrameType::Keepalive,
    }
}

#[must_use]
pub fn server_frame_type(message: &ServerMessage) -> FrameType {
    match message {
        ServerMessage::HandshakeResponse { .. } | ServerMessage::Disconnect { .. } => {
            FrameType::Handshake
        }
        ServerMessage::GameStateBaseline { .. } | ServerMessage::GameStateDelta { .. } => {
            FrameType::GameState
        }
        ServerMessage::ModuleInteractResult { .. } => FrameType::ModuleInteractResult,
        ServerMessage::Pong { .. } => FrameType::Keepalive,
    }
}

/// Serializes a `bincode`-compatible payload for embedding in a frame.
pub fn encode_payload<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(value)
}

pub fn decode_payload<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, bincode::Error> {
    bincode::deserialize(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_frame_roundtrips() {
        let payload = b"hello";
        let bytes = encode_frame(FrameType::Keepalive, 0, 7, payload);
        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.frame_type, FrameType::Keepalive);
        assert_eq!(frame.sequence, 7);
        assert_eq!(frame.payload, payload);
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let mut bytes = encode_frame(FrameType::InputFrame, 0, 1, b"abc");
        let mid = HEADER_LEN;
        bytes[mid] ^= 0xff;
        assert_eq!(decode_frame(&bytes), Err(FrameError::ChecksumMismatch));
    }

    #[test]
    fn too_short_datagram_is_rejected() {
        assert_eq!(decode_frame(&[0, 1, 2]), Err(FrameError::TooShort));
    }

    #[test]
    fn unknown_type_byte_is_rejected() {
        let bytes = encode_frame(FrameType::Keepalive, 0, 1, b"");
        let mut bytes = bytes;
        bytes[0] = 200;
        // Recompute the checksum so the type-byte check, not the
        // checksum, is what fails.
        let body_len = bytes.len() - TRAILER_LEN;
        let crc = crc32fast::hash(&bytes[..body_len]);
        bytes[body_len..].copy_from_slice(&crc.to_be_bytes());
        assert_eq!(decode_frame(&bytes), Err(FrameError::UnknownType(200)));
    }
}
