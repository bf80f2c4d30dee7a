//! Typed CQL column values: declared types, host values, and their codec.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CqlError, Result};
use crate::serialization::{CqlRead, CqlWrite, FrameBuffer, SliceReader};

use std::fmt;
use std::net::IpAddr;

// Column type codes as carried in result metadata.
const TYPE_CUSTOM: u16 = 0x0000;
const TYPE_ASCII: u16 = 0x0001;
const TYPE_BIGINT: u16 = 0x0002;
const TYPE_BLOB: u16 = 0x0003;
const TYPE_BOOLEAN: u16 = 0x0004;
const TYPE_COUNTER: u16 = 0x0005;
const TYPE_DECIMAL: u16 = 0x0006;
const TYPE_DOUBLE: u16 = 0x0007;
const TYPE_FLOAT: u16 = 0x0008;
const TYPE_INT: u16 = 0x0009;
const TYPE_TEXT: u16 = 0x000A;
const TYPE_TIMESTAMP: u16 = 0x000B;
const TYPE_UUID: u16 = 0x000C;
const TYPE_VARCHAR: u16 = 0x000D;
const TYPE_VARINT: u16 = 0x000E;
const TYPE_TIMEUUID: u16 = 0x000F;
const TYPE_INET: u16 = 0x0010;
const TYPE_LIST: u16 = 0x0020;
const TYPE_MAP: u16 = 0x0021;
const TYPE_SET: u16 = 0x0022;

/// A declared CQL column type, as read from result metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CqlType {
    /// A custom type; carries the fully qualified server class name.
    Custom(String),
    /// ASCII-only text.
    Ascii,
    /// 64-bit signed integer.
    Bigint,
    /// Opaque bytes.
    Blob,
    /// Boolean.
    Boolean,
    /// Distributed counter (64-bit).
    Counter,
    /// Arbitrary-precision decimal.
    Decimal,
    /// 64-bit IEEE 754 float.
    Double,
    /// 32-bit IEEE 754 float.
    Float,
    /// 32-bit signed integer.
    Int,
    /// UTF-8 text.
    Text,
    /// Millisecond timestamp.
    Timestamp,
    /// UUID.
    Uuid,
    /// UTF-8 text (alias of text on the wire).
    Varchar,
    /// Arbitrary-precision integer.
    Varint,
    /// Version-1 time UUID.
    Timeuuid,
    /// IPv4 or IPv6 address.
    Inet,
    /// Ordered collection of one element type.
    List(Box<CqlType>),
    /// Key/value collection.
    Map(Box<CqlType>, Box<CqlType>),
    /// Unordered collection of one element type.
    Set(Box<CqlType>),
}

impl CqlType {
    /// Reads a type spec: `[short]` code plus the type-specific suffix.
    pub fn decode(input: &mut impl CqlRead) -> Result<Self> {
        let code = input.read_short()?;
        Ok(match code {
            TYPE_CUSTOM => Self::Custom(input.read_string()?),
            TYPE_ASCII => Self::Ascii,
            TYPE_BIGINT => Self::Bigint,
            TYPE_BLOB => Self::Blob,
            TYPE_BOOLEAN => Self::Boolean,
            TYPE_COUNTER => Self::Counter,
            TYPE_DECIMAL => Self::Decimal,
            TYPE_DOUBLE => Self::Double,
            TYPE_FLOAT => Self::Float,
            TYPE_INT => Self::Int,
            TYPE_TEXT => Self::Text,
            TYPE_TIMESTAMP => Self::Timestamp,
            TYPE_UUID => Self::Uuid,
            TYPE_VARCHAR => Self::Varchar,
            TYPE_VARINT => Self::Varint,
            TYPE_TIMEUUID => Self::Timeuuid,
            TYPE_INET => Self::Inet,
            TYPE_LIST => Self::List(Box::new(Self::decode(input)?)),
            TYPE_MAP => {
                let key = Box::new(Self::decode(input)?);
                let value = Box::new(Self::decode(input)?);
                Self::Map(key, value)
            }
            TYPE_SET => Self::Set(Box::new(Self::decode(input)?)),
            other => {
                return Err(CqlError::Protocol(format!(
                    "unknown column type code 0x{:04X}",
                    other
                )))
            }
        })
    }

    /// Writes this type spec in its wire form.
    pub fn encode(&self, output: &mut impl CqlWrite) -> Result<()> {
        output.write_short(self.code())?;
        match self {
            Self::Custom(class) => output.write_string(class)?,
            Self::List(elem) | Self::Set(elem) => elem.encode(output)?,
            Self::Map(key, value) => {
                key.encode(output)?;
                value.encode(output)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns the `[short]` type code.
    pub fn code(&self) -> u16 {
        match self {
            Self::Custom(_) => TYPE_CUSTOM,
            Self::Ascii => TYPE_ASCII,
            Self::Bigint => TYPE_BIGINT,
            Self::Blob => TYPE_BLOB,
            Self::Boolean => TYPE_BOOLEAN,
            Self::Counter => TYPE_COUNTER,
            Self::Decimal => TYPE_DECIMAL,
            Self::Double => TYPE_DOUBLE,
            Self::Float => TYPE_FLOAT,
            Self::Int => TYPE_INT,
            Self::Text => TYPE_TEXT,
            Self::Timestamp => TYPE_TIMESTAMP,
            Self::Uuid => TYPE_UUID,
            Self::Varchar => TYPE_VARCHAR,
            Self::Varint => TYPE_VARINT,
            Self::Timeuuid => TYPE_TIMEUUID,
            Self::Inet => TYPE_INET,
            Self::List(_) => TYPE_LIST,
            Self::Map(_, _) => TYPE_MAP,
            Self::Set(_) => TYPE_SET,
        }
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(class) => write!(f, "custom<{}>", class),
            Self::Ascii => write!(f, "ascii"),
            Self::Bigint => write!(f, "bigint"),
            Self::Blob => write!(f, "blob"),
            Self::Boolean => write!(f, "boolean"),
            Self::Counter => write!(f, "counter"),
            Self::Decimal => write!(f, "decimal"),
            Self::Double => write!(f, "double"),
            Self::Float => write!(f, "float"),
            Self::Int => write!(f, "int"),
            Self::Text => write!(f, "text"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Uuid => write!(f, "uuid"),
            Self::Varchar => write!(f, "varchar"),
            Self::Varint => write!(f, "varint"),
            Self::Timeuuid => write!(f, "timeuuid"),
            Self::Inet => write!(f, "inet"),
            Self::List(elem) => write!(f, "list<{}>", elem),
            Self::Map(key, value) => write!(f, "map<{}, {}>", key, value),
            Self::Set(elem) => write!(f, "set<{}>", elem),
        }
    }
}

/// An arbitrary-precision integer in two's-complement big-endian form.
///
/// Values built from `i64` use the shortest encoding; decoding accepts
/// any non-empty length, including redundant sign-extension bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlVarint(Vec<u8>);

impl CqlVarint {
    /// Wraps raw two's-complement bytes; fails on an empty payload.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(CqlError::Decoding("empty varint payload".to_string()));
        }
        Ok(Self(bytes))
    }

    /// Returns the two's-complement big-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Converts to `i64`; `None` when the value does not fit.
    pub fn to_i64(&self) -> Option<i64> {
        let negative = self.0[0] & 0x80 != 0;
        let fill: u8 = if negative { 0xFF } else { 0x00 };
        // Skip redundant sign-extension bytes.
        let mut idx = 0;
        while idx + 1 < self.0.len()
            && self.0[idx] == fill
            && (self.0[idx + 1] & 0x80 != 0) == negative
        {
            idx += 1;
        }
        let significant = &self.0[idx..];
        if significant.len() > 8 {
            return None;
        }
        let mut buf = [fill; 8];
        buf[8 - significant.len()..].copy_from_slice(significant);
        Some(i64::from_be_bytes(buf))
    }
}

impl From<i64> for CqlVarint {
    fn from(v: i64) -> Self {
        let bytes = v.to_be_bytes();
        let negative = v < 0;
        let fill: u8 = if negative { 0xFF } else { 0x00 };
        let mut idx = 0;
        while idx < 7 && bytes[idx] == fill && (bytes[idx + 1] & 0x80 != 0) == negative {
            idx += 1;
        }
        Self(bytes[idx..].to_vec())
    }
}

/// An arbitrary-precision decimal: a scale and an unscaled varint.
///
/// The represented value is `unscaled × 10^(−scale)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlDecimal {
    /// Decimal scale.
    pub scale: i32,
    /// The unscaled integer component.
    pub unscaled: CqlVarint,
}

impl CqlDecimal {
    /// Creates a decimal from a scale and an unscaled value.
    pub fn new(scale: i32, unscaled: impl Into<CqlVarint>) -> Self {
        Self {
            scale,
            unscaled: unscaled.into(),
        }
    }
}

/// A host-side CQL value, tagged by column type.
///
/// `Null` exists for binding prepared-statement parameters; decoding a
/// present cell never produces it (absent cells surface as `None` at the
/// row level instead).
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    /// An absent value, encoded as `[bytes]` length −1.
    Null,
    /// ASCII-only text.
    Ascii(String),
    /// 64-bit signed integer.
    Bigint(i64),
    /// Opaque bytes.
    Blob(Vec<u8>),
    /// Boolean.
    Boolean(bool),
    /// Counter value.
    Counter(i64),
    /// Arbitrary-precision decimal.
    Decimal(CqlDecimal),
    /// 64-bit float.
    Double(f64),
    /// 32-bit float.
    Float(f32),
    /// 32-bit signed integer.
    Int(i32),
    /// UTF-8 text.
    Text(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    /// UUID.
    Uuid(Uuid),
    /// UTF-8 text (varchar column).
    Varchar(String),
    /// Arbitrary-precision integer.
    Varint(CqlVarint),
    /// Time-based UUID.
    Timeuuid(Uuid),
    /// IPv4 or IPv6 address (no port at column level).
    Inet(IpAddr),
    /// List of values.
    List(Vec<CqlValue>),
    /// Map of key/value pairs in wire order.
    Map(Vec<(CqlValue, CqlValue)>),
    /// Set of values in wire order.
    Set(Vec<CqlValue>),
    /// Value of a custom type, kept opaque.
    Custom(Vec<u8>),
}

impl CqlValue {
    /// Encodes this value in its raw form, without the outer `[bytes]`
    /// length. `Null` encodes to `None` (the caller writes length −1).
    pub fn encode(&self) -> Result<Option<Vec<u8>>> {
        Ok(Some(match self {
            Self::Null => return Ok(None),
            Self::Ascii(s) => {
                if !s.is_ascii() {
                    return Err(CqlError::Encoding(format!(
                        "non-ASCII content in ascii value: {:?}",
                        s
                    )));
                }
                s.as_bytes().to_vec()
            }
            Self::Bigint(v) | Self::Counter(v) | Self::Timestamp(v) => v.to_be_bytes().to_vec(),
            Self::Blob(bytes) | Self::Custom(bytes) => bytes.clone(),
            Self::Boolean(v) => vec![u8::from(*v)],
            Self::Decimal(d) => {
                let mut out = Vec::with_capacity(4 + d.unscaled.as_bytes().len());
                out.extend_from_slice(&d.scale.to_be_bytes());
                out.extend_from_slice(d.unscaled.as_bytes());
                out
            }
            Self::Double(v) => v.to_be_bytes().to_vec(),
            Self::Float(v) => v.to_be_bytes().to_vec(),
            Self::Int(v) => v.to_be_bytes().to_vec(),
            Self::Text(s) | Self::Varchar(s) => s.as_bytes().to_vec(),
            Self::Uuid(id) | Self::Timeuuid(id) => id.as_bytes().to_vec(),
            Self::Varint(v) => v.as_bytes().to_vec(),
            Self::Inet(IpAddr::V4(ip)) => ip.octets().to_vec(),
            Self::Inet(IpAddr::V6(ip)) => ip.octets().to_vec(),
            Self::List(elems) | Self::Set(elems) => {
                let mut out = FrameBuffer::new();
                out.write_short(collection_len(elems.len())?)?;
                for elem in elems {
                    write_element(&mut out, elem)?;
                }
                out.into_bytes()
            }
            Self::Map(pairs) => {
                let mut out = FrameBuffer::new();
                out.write_short(collection_len(pairs.len())?)?;
                for (key, value) in pairs {
                    write_element(&mut out, key)?;
                    write_element(&mut out, value)?;
                }
                out.into_bytes()
            }
        }))
    }

    /// Decodes a cell's raw bytes according to its declared column type.
    pub fn decode(ty: &CqlType, bytes: &[u8]) -> Result<Self> {
        Ok(match ty {
            CqlType::Custom(_) => Self::Custom(bytes.to_vec()),
            CqlType::Ascii => Self::Ascii(decode_utf8(ty, bytes)?),
            CqlType::Bigint => Self::Bigint(decode_i64(ty, bytes)?),
            CqlType::Blob => Self::Blob(bytes.to_vec()),
            CqlType::Boolean => {
                let [b] = fixed::<1>(ty, bytes)?;
                Self::Boolean(b != 0)
            }
            CqlType::Counter => Self::Counter(decode_i64(ty, bytes)?),
            CqlType::Decimal => {
                if bytes.len() < 5 {
                    return Err(decode_error(ty, bytes, "need a scale and a varint"));
                }
                let scale = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                Self::Decimal(CqlDecimal {
                    scale,
                    unscaled: CqlVarint::from_bytes(bytes[4..].to_vec())?,
                })
            }
            CqlType::Double => Self::Double(f64::from_be_bytes(fixed::<8>(ty, bytes)?)),
            CqlType::Float => Self::Float(f32::from_be_bytes(fixed::<4>(ty, bytes)?)),
            CqlType::Int => Self::Int(i32::from_be_bytes(fixed::<4>(ty, bytes)?)),
            CqlType::Text => Self::Text(decode_utf8(ty, bytes)?),
            CqlType::Timestamp => Self::Timestamp(decode_i64(ty, bytes)?),
            CqlType::Uuid => Self::Uuid(Uuid::from_bytes(fixed::<16>(ty, bytes)?)),
            CqlType::Varchar => Self::Varchar(decode_utf8(ty, bytes)?),
            CqlType::Varint => Self::Varint(CqlVarint::from_bytes(bytes.to_vec())?),
            CqlType::Timeuuid => Self::Timeuuid(Uuid::from_bytes(fixed::<16>(ty, bytes)?)),
            CqlType::Inet => match bytes.len() {
                4 => Self::Inet(IpAddr::from(fixed::<4>(ty, bytes)?)),
                16 => Self::Inet(IpAddr::from(fixed::<16>(ty, bytes)?)),
                _ => return Err(decode_error(ty, bytes, "address must be 4 or 16 bytes")),
            },
            CqlType::List(elem) => Self::List(decode_elements(elem, bytes)?),
            CqlType::Set(elem) => Self::Set(decode_elements(elem, bytes)?),
            CqlType::Map(key_ty, value_ty) => {
                let mut input = SliceReader::new(bytes);
                let len = input.read_short()? as usize;
                let mut pairs = Vec::with_capacity(len);
                for _ in 0..len {
                    let key = input.read_short_bytes()?;
                    let value = input.read_short_bytes()?;
                    pairs.push((
                        Self::decode(key_ty, &key)?,
                        Self::decode(value_ty, &value)?,
                    ));
                }
                Self::Map(pairs)
            }
        })
    }
}

fn collection_len(len: usize) -> Result<u16> {
    u16::try_from(len)
        .map_err(|_| CqlError::Encoding(format!("collection of {} elements exceeds [short]", len)))
}

fn write_element(out: &mut FrameBuffer, elem: &CqlValue) -> Result<()> {
    let encoded = elem
        .encode()?
        .ok_or_else(|| CqlError::Encoding("null element inside a collection".to_string()))?;
    out.write_short_bytes(&encoded)
}

fn decode_elements(elem_ty: &CqlType, bytes: &[u8]) -> Result<Vec<CqlValue>> {
    let mut input = SliceReader::new(bytes);
    let len = input.read_short()? as usize;
    let mut elems = Vec::with_capacity(len);
    for _ in 0..len {
        let raw = input.read_short_bytes()?;
        elems.push(CqlValue::decode(elem_ty, &raw)?);
    }
    Ok(elems)
}

fn decode_error(ty: &CqlType, bytes: &[u8], detail: &str) -> CqlError {
    CqlError::Decoding(format!(
        "cannot decode {} from {} bytes: {}",
        ty,
        bytes.len(),
        detail
    ))
}

fn fixed<const N: usize>(ty: &CqlType, bytes: &[u8]) -> Result<[u8; N]> {
    <[u8; N]>::try_from(bytes).map_err(|_| {
        decode_error(ty, bytes, &format!("expected exactly {} bytes", N))
    })
}

fn decode_i64(ty: &CqlType, bytes: &[u8]) -> Result<i64> {
    Ok(i64::from_be_bytes(fixed::<8>(ty, bytes)?))
}

fn decode_utf8(ty: &CqlType, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| decode_error(ty, bytes, "invalid UTF-8"))
}

impl From<bool> for CqlValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for CqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for CqlValue {
    fn from(v: i64) -> Self {
        Self::Bigint(v)
    }
}

impl From<f32> for CqlValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for CqlValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for CqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for CqlValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<Uuid> for CqlValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<IpAddr> for CqlValue {
    fn from(v: IpAddr) -> Self {
        Self::Inet(v)
    }
}

impl From<DateTime<Utc>> for CqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v.timestamp_millis())
    }
}

impl From<CqlVarint> for CqlValue {
    fn from(v: CqlVarint) -> Self {
        Self::Varint(v)
    }
}

impl From<CqlDecimal> for CqlValue {
    fn from(v: CqlDecimal) -> Self {
        Self::Decimal(v)
    }
}

impl<T: Into<CqlValue>> From<Option<T>> for CqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(value) => value.into(),
            None => Self::Null,
        }
    }
}

impl CqlValue {
    /// Builds a list value from host elements.
    pub fn list<T: Into<CqlValue>>(elems: impl IntoIterator<Item = T>) -> Self {
        Self::List(elems.into_iter().map(Into::into).collect())
    }

    /// Builds a set value from host elements, in the given order.
    pub fn set<T: Into<CqlValue>>(elems: impl IntoIterator<Item = T>) -> Self {
        Self::Set(elems.into_iter().map(Into::into).collect())
    }
}
