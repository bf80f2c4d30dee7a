//! Error types for CQL protocol operations.

use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

use crate::protocol::Consistency;

/// Server-side error codes from the CQL native protocol.
///
/// These are the `[int]` codes carried at the start of every ERROR frame
/// body. The code determines which fields follow the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// Unexpected server-side failure.
    ServerError = 0x0000,
    /// The client message violated the protocol.
    ProtocolError = 0x000A,
    /// Authentication failed.
    BadCredentials = 0x0100,
    /// Not enough live replicas to satisfy the consistency level.
    Unavailable = 0x1000,
    /// The coordinator shed the request due to load.
    Overloaded = 0x1001,
    /// The contacted node is still bootstrapping.
    IsBootstrapping = 0x1002,
    /// A truncate operation failed.
    TruncateError = 0x1003,
    /// A write did not reach enough replicas in time.
    WriteTimeout = 0x1100,
    /// A read did not gather enough responses in time.
    ReadTimeout = 0x1200,
    /// The query could not be parsed.
    SyntaxError = 0x2000,
    /// The logged-in user lacks permission.
    Unauthorized = 0x2100,
    /// The query is syntactically correct but invalid.
    Invalid = 0x2200,
    /// The query is invalid due to a configuration issue.
    ConfigError = 0x2300,
    /// The keyspace or table to create already exists.
    AlreadyExists = 0x2400,
    /// The prepared statement id is unknown to the server.
    Unprepared = 0x2500,
}

impl ErrorCode {
    /// Creates an `ErrorCode` from its wire protocol value.
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0x0000 => Some(Self::ServerError),
            0x000A => Some(Self::ProtocolError),
            0x0100 => Some(Self::BadCredentials),
            0x1000 => Some(Self::Unavailable),
            0x1001 => Some(Self::Overloaded),
            0x1002 => Some(Self::IsBootstrapping),
            0x1003 => Some(Self::TruncateError),
            0x1100 => Some(Self::WriteTimeout),
            0x1200 => Some(Self::ReadTimeout),
            0x2000 => Some(Self::SyntaxError),
            0x2100 => Some(Self::Unauthorized),
            0x2200 => Some(Self::Invalid),
            0x2300 => Some(Self::ConfigError),
            0x2400 => Some(Self::AlreadyExists),
            0x2500 => Some(Self::Unprepared),
            _ => None,
        }
    }

    /// Returns the numeric wire protocol value.
    pub fn value(self) -> i32 {
        self as i32
    }
}

/// The kind of write that timed out, carried by `WriteTimeout` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteType {
    /// A non-batched, non-counter write.
    Simple,
    /// A logged batch write.
    Batch,
    /// An unlogged batch write.
    UnloggedBatch,
    /// A counter write.
    Counter,
    /// The batch-log write that precedes a logged batch.
    BatchLog,
}

impl WriteType {
    /// Parses the `[string]` representation sent by the server.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "SIMPLE" => Some(Self::Simple),
            "BATCH" => Some(Self::Batch),
            "UNLOGGED_BATCH" => Some(Self::UnloggedBatch),
            "COUNTER" => Some(Self::Counter),
            "BATCH_LOG" => Some(Self::BatchLog),
            _ => None,
        }
    }
}

impl fmt::Display for WriteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "SIMPLE"),
            Self::Batch => write!(f, "BATCH"),
            Self::UnloggedBatch => write!(f, "UNLOGGED_BATCH"),
            Self::Counter => write!(f, "COUNTER"),
            Self::BatchLog => write!(f, "BATCH_LOG"),
        }
    }
}

/// The main error type for CQL client operations.
///
/// Covers both server-reported errors (decoded from ERROR frames) and
/// client-local failures (codec, connection discipline, I/O).
#[derive(Debug, Error, Clone)]
pub enum CqlError {
    /// Unexpected server-side failure.
    #[error("server error: {0}")]
    Server(String),

    /// Protocol violation, reported by either side.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Authentication failed.
    #[error("bad credentials: {0}")]
    BadCredentials(String),

    /// Not enough live replicas to satisfy the requested consistency.
    #[error("unavailable ({message}): {alive}/{required} replicas alive at {consistency}")]
    Unavailable {
        /// The server's error message.
        message: String,
        /// The consistency level of the failed request.
        consistency: Consistency,
        /// Replicas required to satisfy the consistency level.
        required: i32,
        /// Replicas known alive by the coordinator.
        alive: i32,
    },

    /// The coordinator shed the request due to load.
    #[error("overloaded: {0}")]
    Overloaded(String),

    /// The contacted node is still bootstrapping.
    #[error("is bootstrapping: {0}")]
    IsBootstrapping(String),

    /// A truncate operation failed.
    #[error("truncate error: {0}")]
    TruncateError(String),

    /// A write did not reach enough replicas in time.
    #[error("write timeout ({message}): {received}/{blockfor} acks at {consistency}, write type {write_type}")]
    WriteTimeout {
        /// The server's error message.
        message: String,
        /// The consistency level of the failed write.
        consistency: Consistency,
        /// Replica acknowledgements received.
        received: i32,
        /// Acknowledgements required to succeed.
        blockfor: i32,
        /// The kind of write that timed out.
        write_type: WriteType,
    },

    /// A read did not gather enough responses in time.
    #[error("read timeout ({message}): {received}/{blockfor} responses at {consistency}, data present: {data_present}")]
    ReadTimeout {
        /// The server's error message.
        message: String,
        /// The consistency level of the failed read.
        consistency: Consistency,
        /// Replica responses received.
        received: i32,
        /// Responses required to succeed.
        blockfor: i32,
        /// Whether the data replica (as opposed to digests only) replied.
        data_present: bool,
    },

    /// The query could not be parsed.
    #[error("syntax error: {0}")]
    SyntaxError(String),

    /// The logged-in user lacks permission for the query.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The query is syntactically correct but invalid.
    #[error("invalid query: {0}")]
    Invalid(String),

    /// The query is invalid due to a server configuration issue.
    #[error("config error: {0}")]
    Config(String),

    /// The keyspace or table to create already exists.
    #[error("already exists: keyspace {keyspace:?}, table {table:?}")]
    AlreadyExists {
        /// The keyspace involved.
        keyspace: String,
        /// The table involved; empty when the keyspace itself exists.
        table: String,
    },

    /// The prepared statement id is unknown to the server.
    ///
    /// Callers may recover by re-preparing the statement and retrying.
    #[error("unprepared statement: unknown id {id:02x?}")]
    Unprepared {
        /// The statement id the server did not recognize.
        id: Vec<u8>,
    },

    /// A response payload could not be decoded into the requested type.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// A bound value could not be encoded for the wire.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A request was issued while a previous result was not yet drained.
    #[error("connection busy: previous result not fully consumed")]
    BusyConnection,

    /// The connection is closed; no further requests are possible.
    #[error("connection closed")]
    Closed,

    /// I/O failure; the connection transitions to closed.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),
}

impl From<io::Error> for CqlError {
    fn from(err: io::Error) -> Self {
        CqlError::Io(Arc::new(err))
    }
}

impl CqlError {
    /// Returns `true` if this error was reported by the server.
    ///
    /// Server errors leave the connection in the ready state; client-local
    /// errors other than I/O do too, while `Io` closes the connection.
    pub fn is_server_error(&self) -> bool {
        !matches!(
            self,
            Self::Decoding(_)
                | Self::Encoding(_)
                | Self::BusyConnection
                | Self::Closed
                | Self::Io(_)
        )
    }

    /// Decodes an ERROR frame body: `[int]` code, `[string]` message,
    /// then the code-specific tail.
    ///
    /// Unknown codes degrade to [`CqlError::Server`] with an annotated
    /// message rather than failing the connection.
    pub fn decode_body(input: &mut impl crate::serialization::CqlRead) -> Result<Self> {
        let raw_code = input.read_int()?;
        let message = input.read_string()?;
        let Some(code) = ErrorCode::from_value(raw_code) else {
            return Ok(Self::Server(format!(
                "unknown error code 0x{:04X}: {}",
                raw_code, message
            )));
        };
        Ok(match code {
            ErrorCode::ServerError => Self::Server(message),
            ErrorCode::ProtocolError => Self::Protocol(message),
            ErrorCode::BadCredentials => Self::BadCredentials(message),
            ErrorCode::Unavailable => Self::Unavailable {
                message,
                consistency: input.read_consistency()?,
                required: input.read_int()?,
                alive: input.read_int()?,
            },
            ErrorCode::Overloaded => Self::Overloaded(message),
            ErrorCode::IsBootstrapping => Self::IsBootstrapping(message),
            ErrorCode::TruncateError => Self::TruncateError(message),
            ErrorCode::WriteTimeout => {
                let consistency = input.read_consistency()?;
                let received = input.read_int()?;
                // blockfor is read as [int]; the protocol text is ambiguous.
                let blockfor = input.read_int()?;
                let write_type_name = input.read_string()?;
                let write_type = WriteType::from_wire(&write_type_name).ok_or_else(|| {
                    CqlError::Protocol(format!("unknown write type {:?}", write_type_name))
                })?;
                Self::WriteTimeout {
                    message,
                    consistency,
                    received,
                    blockfor,
                    write_type,
                }
            }
            ErrorCode::ReadTimeout => Self::ReadTimeout {
                message,
                consistency: input.read_consistency()?,
                received: input.read_int()?,
                blockfor: input.read_int()?,
                data_present: input.read_u8()? != 0,
            },
            ErrorCode::SyntaxError => Self::SyntaxError(message),
            ErrorCode::Unauthorized => Self::Unauthorized(message),
            ErrorCode::Invalid => Self::Invalid(message),
            ErrorCode::ConfigError => Self::Config(message),
            ErrorCode::AlreadyExists => Self::AlreadyExists {
                keyspace: input.read_string()?,
                table: input.read_string()?,
            },
            ErrorCode::Unprepared => Self::Unprepared {
                id: input.read_short_bytes()?,
            },
        })
    }

    /// Returns the server error code for server-reported errors.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Server(_) => Some(ErrorCode::ServerError),
            Self::Protocol(_) => Some(ErrorCode::ProtocolError),
            Self::BadCredentials(_) => Some(ErrorCode::BadCredentials),
            Self::Unavailable { .. } => Some(ErrorCode::Unavailable),
            Self::Overloaded(_) => Some(ErrorCode::Overloaded),
            Self::IsBootstrapping(_) => Some(ErrorCode::IsBootstrapping),
            Self::TruncateError(_) => Some(ErrorCode::TruncateError),
            Self::WriteTimeout { .. } => Some(ErrorCode::WriteTimeout),
            Self::ReadTimeout { .. } => Some(ErrorCode::ReadTimeout),
            Self::SyntaxError(_) => Some(ErrorCode::SyntaxError),
            Self::Unauthorized(_) => Some(ErrorCode::Unauthorized),
            Self::Invalid(_) => Some(ErrorCode::Invalid),
            Self::Config(_) => Some(ErrorCode::ConfigError),
            Self::AlreadyExists { .. } => Some(ErrorCode::AlreadyExists),
            Self::Unprepared { .. } => Some(ErrorCode::Unprepared),
            _ => None,
        }
    }
}

/// A specialized `Result` type for CQL operations.
pub type Result<T> = std::result::Result<T, CqlError>;
