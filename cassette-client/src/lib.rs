//! Blocking Rust client for the Cassandra CQL native binary protocol
//! (v1 and v2).
//!
//! One [`CqlClient`] owns one connection and issues one request at a
//! time. Rows stream off the socket lazily: a rows result borrows the
//! connection until it is drained or dropped, and dropping it discards
//! whatever was not consumed so the connection stays usable.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cassette_client::{ClientConfig, Consistency, CqlClient, QueryResult};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .address("127.0.0.1:9042")
//!         .build()?;
//!     let mut client = CqlClient::connect(config)?;
//!
//!     client.use_keyspace("demo")?;
//!     if let QueryResult::Rows(mut rows) =
//!         client.query("SELECT user_name, birth_year FROM users", Consistency::One)?
//!     {
//!         while let Some(row) = rows.next_row()? {
//!             let name: String = row.get(0)?;
//!             let year: i64 = row.get(1)?;
//!             println!("{name}: {year}");
//!         }
//!     }
//!
//!     client.close()?;
//!     Ok(())
//! }
//! ```
//!
//! # Prepared statements
//!
//! ```rust,no_run
//! # use cassette_client::{ClientConfig, Consistency, CqlClient};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let mut client = CqlClient::connect(ClientConfig::default())?;
//! let stmt = client.prepare("INSERT INTO users (id, name) VALUES (?, ?)")?;
//! client.execute(&stmt, &[42i32.into(), "jsmith".into()], None)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Collaborators
//!
//! Sockets, authentication, server-event delivery and body compression
//! are injected seams (see [`ClientBuilder`]): the engine speaks the
//! protocol, the collaborators supply transport, credentials and
//! decompression. Structured logging goes through [`tracing`].

mod client;
mod config;
pub mod connection;
pub mod listener;
mod result;
pub mod security;

pub use client::{ClientBuilder, CqlClient};
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use connection::{CqlSocket, TcpSocket};
pub use listener::{DiscardEvents, EventSink};
pub use result::{PreparedStatement, QueryResult, Rows};
pub use security::{Authenticator, NoAuthentication, StaticCredentials};

pub use cassette_core::error::{CqlError, Result};
pub use cassette_core::protocol::{
    ClusterEvent, Consistency, EventType, FromRow, ProtocolVersion, Row,
};
pub use cassette_core::serialization::{CqlType, CqlValue, FromCql, StringMultiMap};
pub use cassette_core::Decompressor;
