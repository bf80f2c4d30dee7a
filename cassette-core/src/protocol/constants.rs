//! Wire constants for the CQL native protocol (v1/v2).

/// Size of the frame header in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// High bit of the version byte: set on responses, clear on requests.
pub const DIRECTION_RESPONSE: u8 = 0x80;

/// Mask extracting the numeric protocol version from the version byte.
pub const VERSION_MASK: u8 = 0x7F;

/// Header flag: the frame body is compressed.
pub const FLAG_COMPRESSED: u8 = 0x01;

/// Header flag: tracing was requested / a tracing id is present.
pub const FLAG_TRACING: u8 = 0x02;

/// Stream id reserved for server-pushed event frames.
pub const EVENT_STREAM_ID: i8 = -1;

/// Stream id used for ordinary requests on a connection.
pub const DEFAULT_STREAM_ID: i8 = 0;

/// The CQL version announced in STARTUP.
pub const CQL_VERSION: &str = "3.0.0";

/// STARTUP option key for the CQL version.
pub const STARTUP_KEY_CQL_VERSION: &str = "CQL_VERSION";

/// STARTUP option key for the compression algorithm.
pub const STARTUP_KEY_COMPRESSION: &str = "COMPRESSION";

// Opcodes.

/// An error response.
pub const OPCODE_ERROR: u8 = 0x00;
/// Initializes the connection.
pub const OPCODE_STARTUP: u8 = 0x01;
/// The server is ready for queries.
pub const OPCODE_READY: u8 = 0x02;
/// The server requires authentication.
pub const OPCODE_AUTHENTICATE: u8 = 0x03;
/// Credentials supplied in response to AUTHENTICATE.
pub const OPCODE_CREDENTIALS: u8 = 0x04;
/// Asks the server for supported STARTUP options.
pub const OPCODE_OPTIONS: u8 = 0x05;
/// The supported-options response.
pub const OPCODE_SUPPORTED: u8 = 0x06;
/// Executes a CQL query.
pub const OPCODE_QUERY: u8 = 0x07;
/// The result of a QUERY, PREPARE or EXECUTE.
pub const OPCODE_RESULT: u8 = 0x08;
/// Prepares a CQL query for later execution.
pub const OPCODE_PREPARE: u8 = 0x09;
/// Executes a prepared statement.
pub const OPCODE_EXECUTE: u8 = 0x0A;
/// Registers for server-pushed events.
pub const OPCODE_REGISTER: u8 = 0x0B;
/// A server-pushed event.
pub const OPCODE_EVENT: u8 = 0x0C;

// RESULT body kinds.

/// A result carrying no payload.
pub const RESULT_KIND_VOID: i32 = 0x0001;
/// A rows result.
pub const RESULT_KIND_ROWS: i32 = 0x0002;
/// The result of a USE query.
pub const RESULT_KIND_SET_KEYSPACE: i32 = 0x0003;
/// The result of a PREPARE request.
pub const RESULT_KIND_PREPARED: i32 = 0x0004;
/// The result of a schema-altering query.
pub const RESULT_KIND_SCHEMA_CHANGE: i32 = 0x0005;

// Rows metadata flags.

/// All columns share one keyspace/table spec, sent once globally.
pub const ROWS_FLAG_GLOBAL_TABLES_SPEC: i32 = 0x0001;
/// More pages follow; a paging state blob is present (v2).
pub const ROWS_FLAG_HAS_MORE_PAGES: i32 = 0x0002;
/// Column metadata was omitted (v2).
pub const ROWS_FLAG_NO_METADATA: i32 = 0x0004;
