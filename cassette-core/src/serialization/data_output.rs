//! Writers for the CQL protocol's primitive wire types.

use bytes::{BufMut, BytesMut};
use uuid::Uuid;

use crate::error::{CqlError, Result};
use crate::protocol::Consistency;

use std::net::SocketAddr;

/// Trait for writing the protocol's primitive notation to a body buffer.
///
/// All multi-byte values are written in big-endian byte order. The
/// composite notations (`[string]`, `[bytes]`, maps, …) are provided on
/// top of the raw primitives.
pub trait CqlWrite {
    /// Writes a single `[byte]`.
    fn write_u8(&mut self, v: u8) -> Result<()>;

    /// Writes a `[short]` (unsigned 16-bit, big-endian).
    fn write_short(&mut self, v: u16) -> Result<()>;

    /// Writes an `[int]` (signed 32-bit, big-endian).
    fn write_int(&mut self, v: i32) -> Result<()>;

    /// Writes a signed 64-bit integer in big-endian order.
    fn write_long(&mut self, v: i64) -> Result<()>;

    /// Writes a 32-bit IEEE 754 float in big-endian order.
    fn write_float(&mut self, v: f32) -> Result<()>;

    /// Writes a 64-bit IEEE 754 float in big-endian order.
    fn write_double(&mut self, v: f64) -> Result<()>;

    /// Writes raw bytes without any length prefix.
    fn write_raw(&mut self, v: &[u8]) -> Result<()>;

    /// Writes a `[string]`: `[short]` length then UTF-8 bytes.
    fn write_string(&mut self, v: &str) -> Result<()> {
        let len = u16::try_from(v.len())
            .map_err(|_| CqlError::Encoding(format!("string of {} bytes exceeds [short]", v.len())))?;
        self.write_short(len)?;
        self.write_raw(v.as_bytes())
    }

    /// Writes a `[long string]`: `[int]` length then UTF-8 bytes.
    fn write_long_string(&mut self, v: &str) -> Result<()> {
        let len = i32::try_from(v.len())
            .map_err(|_| CqlError::Encoding(format!("string of {} bytes exceeds [int]", v.len())))?;
        self.write_int(len)?;
        self.write_raw(v.as_bytes())
    }

    /// Writes `[bytes]`: `[int]` length then the content, or −1 for null.
    fn write_bytes(&mut self, v: Option<&[u8]>) -> Result<()> {
        match v {
            None => self.write_int(-1),
            Some(bytes) => {
                let len = i32::try_from(bytes.len()).map_err(|_| {
                    CqlError::Encoding(format!("value of {} bytes exceeds [int]", bytes.len()))
                })?;
                self.write_int(len)?;
                self.write_raw(bytes)
            }
        }
    }

    /// Writes `[short bytes]`: `[short]` length then the content.
    fn write_short_bytes(&mut self, v: &[u8]) -> Result<()> {
        let len = u16::try_from(v.len())
            .map_err(|_| CqlError::Encoding(format!("value of {} bytes exceeds [short]", v.len())))?;
        self.write_short(len)?;
        self.write_raw(v)
    }

    /// Writes a `[string list]`: `[short]` count then that many `[string]`s.
    fn write_string_list(&mut self, v: &[String]) -> Result<()> {
        let len = u16::try_from(v.len())
            .map_err(|_| CqlError::Encoding(format!("list of {} entries exceeds [short]", v.len())))?;
        self.write_short(len)?;
        for s in v {
            self.write_string(s)?;
        }
        Ok(())
    }

    /// Writes a `[string map]` as the given key/value pairs, in order.
    fn write_string_map(&mut self, v: &[(String, String)]) -> Result<()> {
        let len = u16::try_from(v.len())
            .map_err(|_| CqlError::Encoding(format!("map of {} entries exceeds [short]", v.len())))?;
        self.write_short(len)?;
        for (key, value) in v {
            self.write_string(key)?;
            self.write_string(value)?;
        }
        Ok(())
    }

    /// Writes a `[string multimap]` as the given pairs, in order.
    fn write_string_multimap(&mut self, v: &[(String, Vec<String>)]) -> Result<()> {
        let len = u16::try_from(v.len())
            .map_err(|_| CqlError::Encoding(format!("map of {} entries exceeds [short]", v.len())))?;
        self.write_short(len)?;
        for (key, values) in v {
            self.write_string(key)?;
            self.write_string_list(values)?;
        }
        Ok(())
    }

    /// Writes an `[inet]`: address size, address bytes, then `[int]` port.
    fn write_inet(&mut self, addr: &SocketAddr) -> Result<()> {
        match addr {
            SocketAddr::V4(v4) => {
                self.write_u8(4)?;
                self.write_raw(&v4.ip().octets())?;
            }
            SocketAddr::V6(v6) => {
                self.write_u8(16)?;
                self.write_raw(&v6.ip().octets())?;
            }
        }
        self.write_int(i32::from(addr.port()))
    }

    /// Writes a `[consistency]` as its `[short]` wire value.
    fn write_consistency(&mut self, v: Consistency) -> Result<()> {
        self.write_short(v.value())
    }

    /// Writes a `[uuid]` as 16 raw bytes.
    fn write_uuid(&mut self, v: &Uuid) -> Result<()> {
        self.write_raw(v.as_bytes())
    }
}

/// A growable buffer accumulating one frame body.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: BytesMut,
}

impl FrameBuffer {
    /// Creates an empty body buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
        }
    }

    /// Creates a body buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the written bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the buffer and returns the written body.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl CqlWrite for FrameBuffer {
    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.buffer.put_u8(v);
        Ok(())
    }

    fn write_short(&mut self, v: u16) -> Result<()> {
        self.buffer.put_u16(v);
        Ok(())
    }

    fn write_int(&mut self, v: i32) -> Result<()> {
        self.buffer.put_i32(v);
        Ok(())
    }

    fn write_long(&mut self, v: i64) -> Result<()> {
        self.buffer.put_i64(v);
        Ok(())
    }

    fn write_float(&mut self, v: f32) -> Result<()> {
        self.buffer.put_f32(v);
        Ok(())
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        self.buffer.put_f64(v);
        Ok(())
    }

    fn write_raw(&mut self, v: &[u8]) -> Result<()> {
        self.buffer.put_slice(v);
        Ok(())
    }
}
