//! Query results: the result variants and the lazy row stream.

use cassette_core::error::{CqlError, Result};
use cassette_core::protocol::constants::{OPCODE_ERROR, OPCODE_RESULT};
use cassette_core::protocol::result::{
    ColumnSpec, FromRow, Prepared, ResultKind, Row, RowsMetadata, SchemaChange,
};
use cassette_core::protocol::{Consistency, FrameHeader};
use cassette_core::serialization::CqlRead;

use crate::connection::{Connection, CqlSocket};

use std::sync::Arc;

/// A server-side prepared statement, referenced by opaque id.
///
/// Valid until the server evicts it, which surfaces as
/// [`CqlError::Unprepared`] carrying the same id; callers may then
/// re-prepare and retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    id: Vec<u8>,
    bind_specs: Vec<ColumnSpec>,
    bind_count: usize,
    default_consistency: Consistency,
}

impl PreparedStatement {
    /// Returns the server-assigned statement id.
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Returns the metadata of the bound variables.
    pub fn bind_specs(&self) -> &[ColumnSpec] {
        &self.bind_specs
    }

    /// Returns the number of bound variables the statement expects.
    pub fn bind_count(&self) -> usize {
        self.bind_count
    }

    /// Returns the consistency used when `execute` is passed none.
    pub fn default_consistency(&self) -> Consistency {
        self.default_consistency
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        id: Vec<u8>,
        bind_count: usize,
        default_consistency: Consistency,
    ) -> Self {
        Self {
            id,
            bind_specs: Vec::new(),
            bind_count,
            default_consistency,
        }
    }
}

/// A decoded RESULT frame.
///
/// The `Rows` variant holds a lease on the connection until the rows
/// are drained or the value is dropped.
pub enum QueryResult<'a, S: CqlSocket> {
    /// The query produced no payload.
    Void,
    /// A streaming rows result.
    Rows(Rows<'a, S>),
    /// A USE query switched the keyspace.
    SetKeyspace(String),
    /// A PREPARE request produced a statement.
    Prepared(PreparedStatement),
    /// A schema-altering query completed.
    SchemaChange(SchemaChange),
}

impl<'a, S: CqlSocket> std::fmt::Debug for QueryResult<'a, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Void => write!(f, "Void"),
            Self::Rows(_) => f.debug_tuple("Rows").field(&"..").finish(),
            Self::SetKeyspace(keyspace) => f.debug_tuple("SetKeyspace").field(keyspace).finish(),
            Self::Prepared(stmt) => f.debug_tuple("Prepared").field(stmt).finish(),
            Self::SchemaChange(change) => f.debug_tuple("SchemaChange").field(change).finish(),
        }
    }
}

impl<'a, S: CqlSocket> QueryResult<'a, S> {
    /// Classifies and decodes the response to QUERY, PREPARE or EXECUTE.
    pub(crate) fn read(
        conn: &'a mut Connection<S>,
        header: FrameHeader,
        default_consistency: Consistency,
    ) -> Result<Self> {
        match header.opcode {
            OPCODE_ERROR => Err(conn.read_error_body()?),
            OPCODE_RESULT => Self::read_result_body(conn, default_consistency),
            other => Err(conn.unexpected_opcode(other)),
        }
    }

    fn read_result_body(
        conn: &'a mut Connection<S>,
        default_consistency: Consistency,
    ) -> Result<Self> {
        let kind_raw = match conn.read_int() {
            Ok(v) => v,
            Err(e) => {
                let _ = conn.drain_body();
                return Err(e);
            }
        };
        let Some(kind) = ResultKind::from_value(kind_raw) else {
            let _ = conn.drain_body();
            return Err(CqlError::Protocol(format!(
                "unknown result kind {}",
                kind_raw
            )));
        };

        match kind {
            ResultKind::Rows => Rows::read(conn),
            _ => {
                let result = Self::read_inline_kind(conn, kind, default_consistency);
                // The body is consumed either way before control returns.
                match result {
                    Ok(value) => {
                        conn.drain_body()?;
                        Ok(value)
                    }
                    Err(e) => {
                        let _ = conn.drain_body();
                        Err(e)
                    }
                }
            }
        }
    }

    fn read_inline_kind(
        conn: &mut Connection<S>,
        kind: ResultKind,
        default_consistency: Consistency,
    ) -> Result<Self> {
        Ok(match kind {
            ResultKind::Void => Self::Void,
            ResultKind::SetKeyspace => Self::SetKeyspace(conn.read_string()?),
            ResultKind::Prepared => {
                let Prepared { id, metadata } = Prepared::decode(conn)?;
                Self::Prepared(PreparedStatement {
                    id,
                    bind_count: metadata.column_count as usize,
                    bind_specs: metadata.columns,
                    default_consistency,
                })
            }
            ResultKind::SchemaChange => Self::SchemaChange(SchemaChange::decode(conn)?),
            ResultKind::Rows => unreachable!("rows handled by the streaming path"),
        })
    }
}

/// A finite, single-pass stream of result rows.
///
/// Rows are read off the socket on demand; the value mutably borrows
/// the connection, so no other request can be issued until it is
/// drained or dropped. Dropping it drains whatever was not consumed.
pub struct Rows<'a, S: CqlSocket> {
    conn: &'a mut Connection<S>,
    columns: Arc<Vec<ColumnSpec>>,
    column_count: usize,
    row_count: usize,
    remaining: usize,
    paging_state: Option<Vec<u8>>,
}

impl<'a, S: CqlSocket> Rows<'a, S> {
    fn read(conn: &'a mut Connection<S>) -> Result<QueryResult<'a, S>> {
        let prelude = (|conn: &mut Connection<S>| {
            let metadata = RowsMetadata::decode(conn)?;
            let row_count = conn.read_int()?;
            if row_count < 0 {
                return Err(CqlError::Protocol(format!(
                    "negative row count {}",
                    row_count
                )));
            }
            Ok((metadata, row_count as usize))
        })(&mut *conn);

        let (metadata, row_count) = match prelude {
            Ok(parts) => parts,
            Err(e) => {
                let _ = conn.drain_body();
                return Err(e);
            }
        };

        let RowsMetadata {
            column_count,
            columns,
            paging_state,
            ..
        } = metadata;
        Ok(QueryResult::Rows(Rows {
            conn,
            columns: Arc::new(columns),
            column_count: column_count as usize,
            row_count,
            remaining: row_count,
            paging_state,
        }))
    }

    /// Returns the total number of rows in this result.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the column specs, empty when metadata was omitted.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Returns the paging state when the server has more pages (v2).
    pub fn paging_state(&self) -> Option<&[u8]> {
        self.paging_state.as_deref()
    }

    /// Reads the next row, or `None` once the result is exhausted.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let mut cells = Vec::with_capacity(self.column_count);
        for _ in 0..self.column_count {
            cells.push(self.conn.read_bytes()?);
        }
        self.remaining -= 1;
        Ok(Some(Row::new(Arc::clone(&self.columns), cells)))
    }

    /// Reads and binds every remaining row.
    pub fn typed<T: FromRow>(&mut self) -> Result<Vec<T>> {
        let mut records = Vec::with_capacity(self.remaining);
        while let Some(row) = self.next_row()? {
            records.push(T::from_row(&row)?);
        }
        Ok(records)
    }

    /// Discards every remaining row, releasing the connection.
    pub fn drain(&mut self) -> Result<()> {
        self.remaining = 0;
        self.conn.drain_body()
    }
}

impl<S: CqlSocket> Iterator for Rows<'_, S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl<S: CqlSocket> Drop for Rows<'_, S> {
    fn drop(&mut self) {
        if self.conn.unread_body() > 0 {
            if let Err(e) = self.conn.drain_body() {
                tracing::warn!(error = %e, "failed to drain dropped rows result");
            }
        }
    }
}
