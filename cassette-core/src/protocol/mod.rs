//! CQL native protocol implementation: frames, opcodes, request bodies
//! and response payload models.

mod consistency;
pub mod constants;
pub mod event;
mod frame;
mod header;
pub mod request;
pub mod result;

pub use consistency::Consistency;
pub use constants::*;
pub use event::{ClusterEvent, EventType, StatusChange, TopologyChange};
pub use frame::Frame;
pub use header::{FrameHeader, ProtocolVersion};
pub use result::{
    ColumnSpec, FromRow, Prepared, ResultKind, Row, RowsMetadata, SchemaChange, SchemaChangeKind,
};
