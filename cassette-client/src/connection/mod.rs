//! Connection engine and socket collaborator.

#[allow(clippy::module_inception)]
mod connection;
mod socket;

pub use connection::Connection;
pub use socket::{CqlSocket, TcpSocket};
