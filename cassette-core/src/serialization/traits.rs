//! Conversions from decoded CQL values to host types.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{CqlError, Result};
use crate::serialization::value::{CqlDecimal, CqlValue, CqlVarint};

use std::collections::HashMap;
use std::hash::Hash;
use std::net::IpAddr;

/// Trait for extracting a host value from a decoded column cell.
///
/// The input is `None` for a null cell. Non-optional target types treat
/// null as a [`CqlError::Decoding`] failure; wrap the target in `Option`
/// to accept nulls.
pub trait FromCql: Sized {
    /// Converts the cell into `Self`.
    fn from_cql(value: Option<CqlValue>) -> Result<Self>;
}

fn mismatch<T>(expected: &str, value: Option<CqlValue>) -> Result<T> {
    match value {
        None => Err(CqlError::Decoding(format!(
            "unexpected null where {} was required",
            expected
        ))),
        Some(other) => Err(CqlError::Decoding(format!(
            "expected {}, found {:?}",
            expected, other
        ))),
    }
}

impl<T: FromCql> FromCql for Option<T> {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            None => Ok(None),
            some => T::from_cql(some).map(Some),
        }
    }
}

impl FromCql for bool {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Boolean(v)) => Ok(v),
            other => mismatch("boolean", other),
        }
    }
}

impl FromCql for i32 {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Int(v)) => Ok(v),
            other => mismatch("int", other),
        }
    }
}

impl FromCql for i64 {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Bigint(v))
            | Some(CqlValue::Counter(v))
            | Some(CqlValue::Timestamp(v)) => Ok(v),
            other => mismatch("bigint, counter or timestamp", other),
        }
    }
}

impl FromCql for f32 {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Float(v)) => Ok(v),
            other => mismatch("float", other),
        }
    }
}

impl FromCql for f64 {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Double(v)) => Ok(v),
            other => mismatch("double", other),
        }
    }
}

impl FromCql for String {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Text(s)) | Some(CqlValue::Varchar(s)) | Some(CqlValue::Ascii(s)) => {
                Ok(s)
            }
            other => mismatch("text, varchar or ascii", other),
        }
    }
}

impl FromCql for Vec<u8> {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Blob(bytes)) | Some(CqlValue::Custom(bytes)) => Ok(bytes),
            other => mismatch("blob or custom", other),
        }
    }
}

impl FromCql for Uuid {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Uuid(id)) | Some(CqlValue::Timeuuid(id)) => Ok(id),
            other => mismatch("uuid or timeuuid", other),
        }
    }
}

impl FromCql for IpAddr {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Inet(ip)) => Ok(ip),
            other => mismatch("inet", other),
        }
    }
}

impl FromCql for DateTime<Utc> {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Timestamp(millis)) => {
                Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                    CqlError::Decoding(format!("timestamp {} out of range", millis))
                })
            }
            other => mismatch("timestamp", other),
        }
    }
}

impl FromCql for CqlVarint {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Varint(v)) => Ok(v),
            other => mismatch("varint", other),
        }
    }
}

impl FromCql for CqlDecimal {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Decimal(v)) => Ok(v),
            other => mismatch("decimal", other),
        }
    }
}

impl<T: FromCql> FromCql for Vec<T> {
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::List(elems)) | Some(CqlValue::Set(elems)) => elems
                .into_iter()
                .map(|elem| T::from_cql(Some(elem)))
                .collect(),
            other => mismatch("list or set", other),
        }
    }
}

impl<K, V> FromCql for HashMap<K, V>
where
    K: FromCql + Eq + Hash,
    V: FromCql,
{
    fn from_cql(value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Map(pairs)) => pairs
                .into_iter()
                .map(|(k, v)| Ok((K::from_cql(Some(k))?, V::from_cql(Some(v))?)))
                .collect(),
            other => mismatch("map", other),
        }
    }
}
