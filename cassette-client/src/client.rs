//! The caller-facing connection facade.

use cassette_core::compression::Decompressor;
use cassette_core::error::{CqlError, Result};
use cassette_core::protocol::constants::{
    DEFAULT_STREAM_ID, OPCODE_ERROR, OPCODE_EXECUTE, OPCODE_OPTIONS, OPCODE_PREPARE,
    OPCODE_QUERY, OPCODE_READY, OPCODE_REGISTER, OPCODE_SUPPORTED,
};
use cassette_core::protocol::{request, Consistency, EventType};
use cassette_core::serialization::{CqlRead, CqlValue, StringMultiMap};

use crate::config::ClientConfig;
use crate::connection::{Connection, CqlSocket, TcpSocket};
use crate::listener::{DiscardEvents, EventSink};
use crate::result::{PreparedStatement, QueryResult};
use crate::security::{Authenticator, NoAuthentication};

/// A client session over one connection to a Cassandra node.
///
/// All operations are blocking and issue at most one request at a time.
/// A [`QueryResult::Rows`] value holds the connection until its rows are
/// drained or it is dropped.
pub struct CqlClient<S: CqlSocket = TcpSocket> {
    conn: Connection<S>,
    keyspace: Option<String>,
    default_consistency: Consistency,
}

impl<S: CqlSocket> std::fmt::Debug for CqlClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CqlClient")
            .field("keyspace", &self.keyspace)
            .field("default_consistency", &self.default_consistency)
            .finish_non_exhaustive()
    }
}

impl CqlClient<TcpSocket> {
    /// Connects over TCP with default collaborators.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        ClientBuilder::new(config).connect()
    }
}

impl<S: CqlSocket> CqlClient<S> {
    fn open(
        config: &ClientConfig,
        socket: S,
        authenticator: &dyn Authenticator,
        sink: Box<dyn EventSink>,
        decompressor: Option<Box<dyn Decompressor>>,
    ) -> Result<Self> {
        let mut conn = Connection::new(
            socket,
            config.protocol_version(),
            DEFAULT_STREAM_ID,
            sink,
            decompressor,
        );
        conn.handshake(authenticator)?;
        Ok(Self {
            conn,
            keyspace: None,
            default_consistency: config.default_consistency(),
        })
    }

    /// Returns the keyspace selected by the last successful USE.
    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    /// Returns `true` once the connection is closed.
    pub fn is_closed(&self) -> bool {
        self.conn.is_closed()
    }

    /// Returns the number of unconsumed response body bytes; zero
    /// between requests.
    pub fn unread_body(&self) -> usize {
        self.conn.unread_body()
    }

    /// Selects the working keyspace; a no-op when already selected.
    ///
    /// The identifier must be non-empty, start with a letter and contain
    /// only `[A-Za-z0-9_]`, or be double-quoted.
    pub fn use_keyspace(&mut self, name: &str) -> Result<()> {
        validate_keyspace_identifier(name)?;
        if self.keyspace.as_deref() == Some(name) {
            return Ok(());
        }
        let cql = format!("USE {}", name);
        let QueryResult::SetKeyspace(keyspace) = self.query(&cql, Consistency::Any)? else {
            return Err(CqlError::Protocol(
                "USE did not produce a set-keyspace result".to_string(),
            ));
        };
        self.keyspace = Some(keyspace);
        Ok(())
    }

    /// Runs a CQL query at the given consistency.
    ///
    /// Statements beginning with `PREPARE` are rejected; use
    /// [`prepare`](Self::prepare) instead.
    pub fn query(&mut self, cql: &str, consistency: Consistency) -> Result<QueryResult<'_, S>> {
        if starts_with_keyword(cql, "PREPARE") {
            return Err(CqlError::Invalid(
                "use prepare() instead of a PREPARE statement".to_string(),
            ));
        }
        tracing::debug!(%cql, %consistency, "query");
        let body = request::query(cql, consistency)?;
        let header = self.conn.request(OPCODE_QUERY, body)?;
        QueryResult::read(&mut self.conn, header, self.default_consistency)
    }

    /// Prepares a statement for parameterized execution.
    pub fn prepare(&mut self, cql: &str) -> Result<PreparedStatement> {
        tracing::debug!(%cql, "prepare");
        let header = self.conn.request(OPCODE_PREPARE, request::prepare(cql)?)?;
        match QueryResult::read(&mut self.conn, header, self.default_consistency)? {
            QueryResult::Prepared(stmt) => Ok(stmt),
            other => {
                drop(other);
                Err(CqlError::Protocol(
                    "PREPARE did not produce a prepared result".to_string(),
                ))
            }
        }
    }

    /// Executes a prepared statement with the given bound values.
    ///
    /// The value count must match the statement's bound-variable count.
    /// Without an explicit consistency the statement's default applies.
    pub fn execute(
        &mut self,
        stmt: &PreparedStatement,
        values: &[CqlValue],
        consistency: Option<Consistency>,
    ) -> Result<QueryResult<'_, S>> {
        if values.len() != stmt.bind_count() {
            return Err(CqlError::Invalid(format!(
                "statement expects {} values, got {}",
                stmt.bind_count(),
                values.len()
            )));
        }
        let consistency = consistency.unwrap_or(stmt.default_consistency());
        let body = request::execute(stmt.id(), values, consistency)?;
        let header = self.conn.request(OPCODE_EXECUTE, body)?;
        QueryResult::read(&mut self.conn, header, self.default_consistency)
    }

    /// Asks the server for its supported STARTUP options.
    pub fn request_options(&mut self) -> Result<StringMultiMap> {
        let header = self.conn.request(OPCODE_OPTIONS, Vec::new())?;
        match header.opcode {
            OPCODE_SUPPORTED => {
                let map = self.conn.read_string_multimap()?;
                self.conn.drain_body()?;
                Ok(map)
            }
            OPCODE_ERROR => Err(self.conn.read_error_body()?),
            other => Err(self.conn.unexpected_opcode(other)),
        }
    }

    /// Registers for server-pushed events.
    ///
    /// Matching EVENT frames are subsequently delivered through the
    /// injected [`EventSink`] as they arrive on the connection.
    pub fn register(&mut self, events: &[EventType]) -> Result<()> {
        let header = self.conn.request(OPCODE_REGISTER, request::register(events)?)?;
        match header.opcode {
            OPCODE_READY => {
                self.conn.drain_body()?;
                Ok(())
            }
            OPCODE_ERROR => Err(self.conn.read_error_body()?),
            other => Err(self.conn.unexpected_opcode(other)),
        }
    }

    /// Drains any pending body bytes and closes the connection.
    pub fn close(&mut self) -> Result<()> {
        self.conn.close()
    }
}

impl<S: CqlSocket> Drop for CqlClient<S> {
    fn drop(&mut self) {
        let _ = self.conn.close();
    }
}

/// Builder wiring a [`CqlClient`] with its collaborators.
pub struct ClientBuilder {
    config: ClientConfig,
    authenticator: Box<dyn Authenticator>,
    sink: Option<Box<dyn EventSink>>,
    decompressor: Option<Box<dyn Decompressor>>,
}

impl ClientBuilder {
    /// Creates a builder with default collaborators.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            authenticator: Box::new(NoAuthentication),
            sink: None,
            decompressor: None,
        }
    }

    /// Sets the authenticator consulted when the server asks.
    pub fn authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Box::new(authenticator);
        self
    }

    /// Sets the sink receiving server-pushed events.
    pub fn event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Sets the decompressor; its algorithm is offered in STARTUP.
    pub fn decompressor(mut self, decompressor: impl Decompressor + 'static) -> Self {
        self.decompressor = Some(Box::new(decompressor));
        self
    }

    /// Connects over TCP.
    pub fn connect(self) -> Result<CqlClient<TcpSocket>> {
        let socket = TcpSocket::connect(self.config.address(), self.config.connect_timeout())?;
        tracing::debug!(address = %self.config.address(), "connected");
        self.connect_with(socket)
    }

    /// Runs the handshake over an externally supplied socket.
    pub fn connect_with<S: CqlSocket>(self, socket: S) -> Result<CqlClient<S>> {
        let sink = self.sink.unwrap_or_else(|| Box::new(DiscardEvents));
        CqlClient::open(
            &self.config,
            socket,
            self.authenticator.as_ref(),
            sink,
            self.decompressor,
        )
    }
}

fn starts_with_keyword(cql: &str, keyword: &str) -> bool {
    let trimmed = cql.trim_start();
    let Some(prefix) = trimmed.get(..keyword.len()) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case(keyword) {
        return false;
    }
    // Word boundary: "PREPAREDNESS" is not the PREPARE keyword.
    trimmed[keyword.len()..]
        .chars()
        .next()
        .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_')
}

fn validate_keyspace_identifier(name: &str) -> Result<()> {
    let valid = if let Some(inner) = name
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        !inner.is_empty()
    } else {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    };
    if valid {
        Ok(())
    } else {
        Err(CqlError::Invalid(format!(
            "invalid keyspace identifier {:?}",
            name
        )))
    }
}
