//! A complete protocol frame: header plus body.

use bytes::{BufMut, BytesMut};

use crate::error::{CqlError, Result};

use super::constants::FRAME_HEADER_SIZE;
use super::header::{FrameHeader, ProtocolVersion};

/// An 8-byte header and its body, the protocol's unit of transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame header.
    pub header: FrameHeader,
    /// The frame body.
    pub body: Vec<u8>,
}

impl Frame {
    /// Creates a request frame for the given opcode and body.
    pub fn request(
        version: ProtocolVersion,
        stream: i8,
        opcode: u8,
        body: Vec<u8>,
    ) -> Result<Self> {
        let length = u32::try_from(body.len()).map_err(|_| {
            CqlError::Encoding(format!("frame body of {} bytes exceeds [int]", body.len()))
        })?;
        Ok(Self {
            header: FrameHeader::request(version, stream, opcode, length),
            body,
        })
    }

    /// Returns the size of this frame on the wire.
    pub fn wire_size(&self) -> usize {
        FRAME_HEADER_SIZE + self.body.len()
    }

    /// Writes header and body to the destination buffer.
    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_size());
        dst.put_slice(&self.header.encode());
        dst.put_slice(&self.body);
    }

    /// Serializes this frame to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.write_to(&mut buf);
        buf.to_vec()
    }
}
