//! Serialization for the CQL wire format: primitive notation and typed
//! column values.

mod data_input;
mod data_output;
mod traits;
pub mod value;

pub use data_input::{CqlRead, SliceReader, StringMultiMap};
pub use data_output::{CqlWrite, FrameBuffer};
pub use traits::FromCql;
pub use value::{CqlDecimal, CqlType, CqlValue, CqlVarint};
