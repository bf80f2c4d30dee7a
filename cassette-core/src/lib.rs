//! Core types and codecs for the Cassandra CQL native binary protocol
//! (v1/v2).
//!
//! This crate is sans-I/O: it knows how to build request frames, decode
//! response payloads and convert typed column values, but never touches
//! a socket. The connection engine lives in `cassette-client`.

#![warn(missing_docs)]

pub mod compression;
pub mod error;
pub mod protocol;
pub mod serialization;

pub use compression::Decompressor;
pub use error::{CqlError, ErrorCode, Result, WriteType};
pub use protocol::{Consistency, FromRow, ProtocolVersion, Row};
pub use serialization::{CqlRead, CqlType, CqlValue, CqlWrite, FromCql};
