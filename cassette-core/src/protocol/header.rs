//! Frame header encoding and decoding.

use crate::error::{CqlError, Result};

use super::constants::*;

/// The protocol versions this client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// CQL native protocol v1.
    V1,
    /// CQL native protocol v2.
    V2,
}

impl ProtocolVersion {
    /// Returns the version byte used on request frames.
    pub fn request_byte(self) -> u8 {
        match self {
            Self::V1 => 0x01,
            Self::V2 => 0x02,
        }
    }

    /// Returns the version byte expected on response frames.
    pub fn response_byte(self) -> u8 {
        self.request_byte() | DIRECTION_RESPONSE
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::V1
    }
}

/// The fixed 8-byte header that precedes every frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Version byte, including the request/response direction bit.
    pub version: u8,
    /// Header flags (compressed, tracing).
    pub flags: u8,
    /// Stream id correlating responses with requests; −1 for events.
    pub stream: i8,
    /// The frame opcode.
    pub opcode: u8,
    /// Length of the body that follows, in bytes.
    pub length: u32,
}

impl FrameHeader {
    /// Creates a request header for the given version, stream and opcode.
    pub fn request(version: ProtocolVersion, stream: i8, opcode: u8, length: u32) -> Self {
        Self {
            version: version.request_byte(),
            flags: 0,
            stream,
            opcode,
            length,
        }
    }

    /// Serializes the header into its 8-byte wire form.
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let len = self.length.to_be_bytes();
        [
            self.version,
            self.flags,
            self.stream as u8,
            self.opcode,
            len[0],
            len[1],
            len[2],
            len[3],
        ]
    }

    /// Decodes a header from its 8-byte wire form.
    pub fn decode(bytes: [u8; FRAME_HEADER_SIZE]) -> Self {
        Self {
            version: bytes[0],
            flags: bytes[1],
            stream: bytes[2] as i8,
            opcode: bytes[3],
            length: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Returns `true` if the direction bit marks this as a response.
    pub fn is_response(&self) -> bool {
        self.version & DIRECTION_RESPONSE != 0
    }

    /// Returns `true` if the body is compressed.
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }

    /// Returns `true` if the tracing flag is set.
    pub fn is_tracing(&self) -> bool {
        self.flags & FLAG_TRACING != 0
    }

    /// Returns `true` if this is a server-pushed event frame.
    pub fn is_event(&self) -> bool {
        self.opcode == OPCODE_EVENT && self.stream == EVENT_STREAM_ID
    }

    /// Validates that this header is a response for the given version.
    ///
    /// Fails with `Protocol` when the direction bit is missing or the
    /// numeric version does not match the negotiated one.
    pub fn expect_response(&self, version: ProtocolVersion) -> Result<()> {
        if !self.is_response() {
            return Err(CqlError::Protocol(format!(
                "expected response frame, got request version byte 0x{:02X}",
                self.version
            )));
        }
        if self.version & VERSION_MASK != version.request_byte() {
            return Err(CqlError::Protocol(format!(
                "response version byte 0x{:02X} does not match negotiated version 0x{:02X}",
                self.version,
                version.response_byte()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_header_encoding() {
        let header = FrameHeader::request(ProtocolVersion::V1, 0, OPCODE_STARTUP, 22);
        assert_eq!(
            header.encode(),
            [0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x16]
        );
    }

    #[test]
    fn v2_request_byte() {
        let header = FrameHeader::request(ProtocolVersion::V2, 5, OPCODE_QUERY, 0);
        assert_eq!(header.encode()[0], 0x02);
        assert_eq!(header.encode()[2], 0x05);
    }

    #[test]
    fn decode_round_trip() {
        let header = FrameHeader {
            version: 0x81,
            flags: FLAG_TRACING,
            stream: -1,
            opcode: OPCODE_EVENT,
            length: 0x0102_0304,
        };
        let decoded = FrameHeader::decode(header.encode());
        assert_eq!(decoded, header);
        assert!(decoded.is_response());
        assert!(decoded.is_tracing());
        assert!(!decoded.is_compressed());
        assert!(decoded.is_event());
    }

    #[test]
    fn negative_stream_id_survives() {
        let header = FrameHeader {
            version: 0x81,
            flags: 0,
            stream: -1,
            opcode: OPCODE_EVENT,
            length: 0,
        };
        assert_eq!(header.encode()[2], 0xFF);
        assert_eq!(FrameHeader::decode(header.encode()).stream, -1);
    }

    #[test]
    fn expect_response_checks_direction() {
        let header = FrameHeader::request(ProtocolVersion::V1, 0, OPCODE_READY, 0);
        assert!(header.expect_response(ProtocolVersion::V1).is_err());
    }

    #[test]
    fn expect_response_checks_version() {
        let header = FrameHeader {
            version: 0x82,
            flags: 0,
            stream: 0,
            opcode: OPCODE_READY,
            length: 0,
        };
        assert!(header.expect_response(ProtocolVersion::V1).is_err());
        assert!(header.expect_response(ProtocolVersion::V2).is_ok());
    }

    #[test]
    fn event_requires_stream_minus_one() {
        let header = FrameHeader {
            version: 0x81,
            flags: 0,
            stream: 0,
            opcode: OPCODE_EVENT,
            length: 0,
        };
        assert!(!header.is_event());
    }
}
