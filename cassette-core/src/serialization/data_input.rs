//! Readers for the CQL protocol's primitive wire types.

use bytes::Buf;
use uuid::Uuid;

use crate::error::{CqlError, Result};
use crate::protocol::Consistency;

use std::collections::HashMap;
use std::io::Cursor;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// The `[string multimap]` returned by a SUPPORTED response.
pub type StringMultiMap = HashMap<String, Vec<String>>;

/// Trait for reading the protocol's primitive notation from a frame body.
///
/// All multi-byte values are read in big-endian byte order. Reads past the
/// end of the body, negative lengths where null is not allowed, and
/// invalid UTF-8 in a `[string]` fail with [`CqlError::Protocol`].
pub trait CqlRead {
    /// Reads a single `[byte]`.
    fn read_u8(&mut self) -> Result<u8>;

    /// Reads a `[short]` (unsigned 16-bit, big-endian).
    fn read_short(&mut self) -> Result<u16>;

    /// Reads an `[int]` (signed 32-bit, big-endian).
    fn read_int(&mut self) -> Result<i32>;

    /// Reads a signed 64-bit integer in big-endian order.
    fn read_long(&mut self) -> Result<i64>;

    /// Reads a 32-bit IEEE 754 float in big-endian order.
    fn read_float(&mut self) -> Result<f32>;

    /// Reads a 64-bit IEEE 754 float in big-endian order.
    fn read_double(&mut self) -> Result<f64>;

    /// Reads exactly `len` raw bytes.
    fn read_raw(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Reads a `[string]`: `[short]` length then UTF-8 bytes.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_short()? as usize;
        let bytes = self.read_raw(len)?;
        String::from_utf8(bytes)
            .map_err(|e| CqlError::Protocol(format!("invalid UTF-8 in [string]: {}", e)))
    }

    /// Reads a `[long string]`: `[int]` length then UTF-8 bytes.
    fn read_long_string(&mut self) -> Result<String> {
        let len = self.read_int()?;
        if len < 0 {
            return Err(CqlError::Protocol(format!(
                "negative [long string] length {}",
                len
            )));
        }
        let bytes = self.read_raw(len as usize)?;
        String::from_utf8(bytes)
            .map_err(|e| CqlError::Protocol(format!("invalid UTF-8 in [long string]: {}", e)))
    }

    /// Reads `[bytes]`: length −1 maps to `None`, anything else to content.
    fn read_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        let len = self.read_int()?;
        if len == -1 {
            return Ok(None);
        }
        if len < 0 {
            return Err(CqlError::Protocol(format!("negative [bytes] length {}", len)));
        }
        Ok(Some(self.read_raw(len as usize)?))
    }

    /// Reads `[short bytes]`: `[short]` length then content; no null form.
    fn read_short_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_short()? as usize;
        self.read_raw(len)
    }

    /// Reads a `[string list]`.
    fn read_string_list(&mut self) -> Result<Vec<String>> {
        let len = self.read_short()? as usize;
        let mut list = Vec::with_capacity(len);
        for _ in 0..len {
            list.push(self.read_string()?);
        }
        Ok(list)
    }

    /// Reads a `[string map]`.
    fn read_string_map(&mut self) -> Result<HashMap<String, String>> {
        let len = self.read_short()? as usize;
        let mut map = HashMap::with_capacity(len);
        for _ in 0..len {
            let key = self.read_string()?;
            let value = self.read_string()?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Reads a `[string multimap]`.
    fn read_string_multimap(&mut self) -> Result<StringMultiMap> {
        let len = self.read_short()? as usize;
        let mut map = HashMap::with_capacity(len);
        for _ in 0..len {
            let key = self.read_string()?;
            let values = self.read_string_list()?;
            map.insert(key, values);
        }
        Ok(map)
    }

    /// Reads an `[inet]`: address size, address bytes, then `[int]` port.
    fn read_inet(&mut self) -> Result<SocketAddr> {
        let size = self.read_u8()?;
        let ip = match size {
            4 => {
                let raw = self.read_raw(4)?;
                IpAddr::V4(Ipv4Addr::new(raw[0], raw[1], raw[2], raw[3]))
            }
            16 => {
                let raw = self.read_raw(16)?;
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&raw);
                IpAddr::V6(Ipv6Addr::from(octets))
            }
            other => {
                return Err(CqlError::Protocol(format!(
                    "invalid [inet] address size {}",
                    other
                )))
            }
        };
        let port = self.read_int()?;
        Ok(SocketAddr::new(ip, port as u16))
    }

    /// Reads a `[consistency]`, failing on unknown wire values.
    fn read_consistency(&mut self) -> Result<Consistency> {
        let value = self.read_short()?;
        Consistency::from_value(value)
            .ok_or_else(|| CqlError::Protocol(format!("unknown consistency value {}", value)))
    }

    /// Reads a `[uuid]` as 16 raw bytes.
    fn read_uuid(&mut self) -> Result<Uuid> {
        let raw = self.read_raw(16)?;
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&raw);
        Ok(Uuid::from_bytes(bytes))
    }
}

/// A cursor-based reader over a fully buffered frame body.
#[derive(Debug)]
pub struct SliceReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> SliceReader<'a> {
    /// Creates a reader over the given body bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Returns the number of bytes remaining to be read.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.cursor.remaining() < n {
            Err(CqlError::Protocol(format!(
                "body exhausted: need {} bytes, have {}",
                n,
                self.cursor.remaining()
            )))
        } else {
            Ok(())
        }
    }
}

impl CqlRead for SliceReader<'_> {
    fn read_u8(&mut self) -> Result<u8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8())
    }

    fn read_short(&mut self) -> Result<u16> {
        self.ensure_remaining(2)?;
        Ok(self.cursor.get_u16())
    }

    fn read_int(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_i32())
    }

    fn read_long(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_i64())
    }

    fn read_float(&mut self) -> Result<f32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_f32())
    }

    fn read_double(&mut self) -> Result<f64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_f64())
    }

    fn read_raw(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure_remaining(len)?;
        let mut buf = vec![0u8; len];
        self.cursor.copy_to_slice(&mut buf);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{CqlWrite, FrameBuffer};

    #[test]
    fn read_short_big_endian() {
        let mut input = SliceReader::new(&[0x01, 0x02]);
        assert_eq!(input.read_short().unwrap(), 0x0102);
    }

    #[test]
    fn read_int_negative() {
        let mut input = SliceReader::new(&[0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(input.read_int().unwrap(), -2);
    }

    #[test]
    fn read_long_big_endian() {
        let mut input = SliceReader::new(&[0, 0, 0, 0, 0x52, 0x27, 0xC4, 0x12]);
        assert_eq!(input.read_long().unwrap(), 0x5227C412);
    }

    #[test]
    fn read_string() {
        let mut input = SliceReader::new(&[0x00, 0x02, b'k', b's']);
        assert_eq!(input.read_string().unwrap(), "ks");
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn read_string_invalid_utf8() {
        let mut input = SliceReader::new(&[0x00, 0x02, 0xFF, 0xFE]);
        assert!(matches!(
            input.read_string(),
            Err(CqlError::Protocol(_))
        ));
    }

    #[test]
    fn read_bytes_null_sentinel() {
        let mut input = SliceReader::new(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(input.read_bytes().unwrap(), None);
    }

    #[test]
    fn read_bytes_rejects_other_negative_lengths() {
        let mut input = SliceReader::new(&[0xFF, 0xFF, 0xFF, 0xFE]);
        assert!(matches!(input.read_bytes(), Err(CqlError::Protocol(_))));
    }

    #[test]
    fn read_bytes_content() {
        let mut input = SliceReader::new(&[0x00, 0x00, 0x00, 0x02, 0xAB, 0xCD]);
        assert_eq!(input.read_bytes().unwrap(), Some(vec![0xAB, 0xCD]));
    }

    #[test]
    fn read_past_end_fails() {
        let mut input = SliceReader::new(&[0x00]);
        assert!(matches!(input.read_int(), Err(CqlError::Protocol(_))));
    }

    #[test]
    fn read_string_list() {
        let mut out = FrameBuffer::new();
        out.write_string_list(&["a".to_string(), "b".to_string()])
            .unwrap();
        let body = out.into_bytes();
        let mut input = SliceReader::new(&body);
        assert_eq!(input.read_string_list().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn read_string_multimap() {
        let mut out = FrameBuffer::new();
        out.write_string_multimap(&[(
            "COMPRESSION".to_string(),
            vec!["snappy".to_string(), "lz4".to_string()],
        )])
        .unwrap();
        let body = out.into_bytes();
        let mut input = SliceReader::new(&body);
        let map = input.read_string_multimap().unwrap();
        assert_eq!(map["COMPRESSION"], vec!["snappy", "lz4"]);
    }

    #[test]
    fn read_inet_v4() {
        let mut input = SliceReader::new(&[4, 10, 0, 0, 7, 0x00, 0x00, 0x23, 0x52]);
        let addr = input.read_inet().unwrap();
        assert_eq!(addr.to_string(), "10.0.0.7:9042");
    }

    #[test]
    fn read_inet_bad_size() {
        let mut input = SliceReader::new(&[5, 0, 0, 0, 0, 0]);
        assert!(matches!(input.read_inet(), Err(CqlError::Protocol(_))));
    }

    #[test]
    fn read_consistency_unknown_value() {
        let mut input = SliceReader::new(&[0x00, 0x63]);
        assert!(matches!(
            input.read_consistency(),
            Err(CqlError::Protocol(_))
        ));
    }

    #[test]
    fn primitive_round_trips() {
        let mut out = FrameBuffer::new();
        out.write_u8(0x7F).unwrap();
        out.write_short(u16::MAX).unwrap();
        out.write_int(i32::MIN).unwrap();
        out.write_long(i64::MAX).unwrap();
        out.write_float(3.5).unwrap();
        out.write_double(-0.25).unwrap();
        let body = out.into_bytes();

        let mut input = SliceReader::new(&body);
        assert_eq!(input.read_u8().unwrap(), 0x7F);
        assert_eq!(input.read_short().unwrap(), u16::MAX);
        assert_eq!(input.read_int().unwrap(), i32::MIN);
        assert_eq!(input.read_long().unwrap(), i64::MAX);
        assert_eq!(input.read_float().unwrap(), 3.5);
        assert_eq!(input.read_double().unwrap(), -0.25);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn uuid_round_trip() {
        let id = Uuid::from_u128(0xDEADBEEF_0000_0000_0000_000000000042);
        let mut out = FrameBuffer::new();
        out.write_uuid(&id).unwrap();
        let body = out.into_bytes();
        let mut input = SliceReader::new(&body);
        assert_eq!(input.read_uuid().unwrap(), id);
    }
}
