//! RESULT frame payload model: kinds, column metadata, rows.

use crate::error::{CqlError, Result};
use crate::serialization::{CqlRead, CqlType, CqlValue, FromCql};

use super::constants::{
    ROWS_FLAG_GLOBAL_TABLES_SPEC, ROWS_FLAG_HAS_MORE_PAGES, ROWS_FLAG_NO_METADATA,
};

use std::fmt;
use std::sync::Arc;

/// The discriminator at the start of every RESULT body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultKind {
    /// A result carrying no payload.
    Void = 0x0001,
    /// A rows result.
    Rows = 0x0002,
    /// The result of a USE query.
    SetKeyspace = 0x0003,
    /// The result of a PREPARE request.
    Prepared = 0x0004,
    /// The result of a schema-altering query.
    SchemaChange = 0x0005,
}

impl ResultKind {
    /// Creates a `ResultKind` from its wire protocol value.
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Void),
            0x0002 => Some(Self::Rows),
            0x0003 => Some(Self::SetKeyspace),
            0x0004 => Some(Self::Prepared),
            0x0005 => Some(Self::SchemaChange),
            _ => None,
        }
    }

    /// Returns the numeric wire protocol value.
    pub fn value(self) -> i32 {
        self as i32
    }
}

/// Metadata describing one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// The keyspace the column belongs to.
    pub keyspace: String,
    /// The table the column belongs to.
    pub table: String,
    /// The column name.
    pub name: String,
    /// The declared column type.
    pub ty: CqlType,
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{} {}", self.keyspace, self.table, self.name, self.ty)
    }
}

/// Decoded rows/prepared metadata: flags, column specs, paging state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowsMetadata {
    /// Column count as declared by the server.
    pub column_count: i32,
    /// Column specs; empty when the no-metadata flag was set.
    pub columns: Vec<ColumnSpec>,
    /// Paging state when the server has more pages (v2).
    pub paging_state: Option<Vec<u8>>,
    /// Set when column metadata was omitted (v2).
    pub no_metadata: bool,
}

impl RowsMetadata {
    /// Decodes metadata: `[int]` flags, `[int]` column count, optional
    /// paging state, optional global table spec, then the column specs.
    pub fn decode(input: &mut impl CqlRead) -> Result<Self> {
        let flags = input.read_int()?;
        let column_count = input.read_int()?;
        if column_count < 0 {
            return Err(CqlError::Protocol(format!(
                "negative column count {}",
                column_count
            )));
        }

        let paging_state = if flags & ROWS_FLAG_HAS_MORE_PAGES != 0 {
            input.read_bytes()?
        } else {
            None
        };

        let no_metadata = flags & ROWS_FLAG_NO_METADATA != 0;
        let mut columns = Vec::new();
        if !no_metadata {
            let global = if flags & ROWS_FLAG_GLOBAL_TABLES_SPEC != 0 {
                let keyspace = input.read_string()?;
                let table = input.read_string()?;
                Some((keyspace, table))
            } else {
                None
            };

            columns.reserve(column_count as usize);
            for _ in 0..column_count {
                let (keyspace, table) = match &global {
                    Some((keyspace, table)) => (keyspace.clone(), table.clone()),
                    None => (input.read_string()?, input.read_string()?),
                };
                let name = input.read_string()?;
                let ty = CqlType::decode(input)?;
                columns.push(ColumnSpec {
                    keyspace,
                    table,
                    name,
                    ty,
                });
            }
        }

        Ok(Self {
            column_count,
            columns,
            paging_state,
            no_metadata,
        })
    }
}

/// The body of a RESULT of kind `prepared`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// The server-assigned statement id.
    pub id: Vec<u8>,
    /// Metadata for the statement's bound variables.
    pub metadata: RowsMetadata,
}

impl Prepared {
    /// Decodes a prepared body: `[short bytes]` id then metadata.
    pub fn decode(input: &mut impl CqlRead) -> Result<Self> {
        let id = input.read_short_bytes()?;
        let metadata = RowsMetadata::decode(input)?;
        Ok(Self { id, metadata })
    }
}

/// What a schema change did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChangeKind {
    /// A keyspace or table was created.
    Created,
    /// A keyspace or table was updated.
    Updated,
    /// A keyspace or table was dropped.
    Dropped,
}

impl SchemaChangeKind {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "UPDATED" => Some(Self::Updated),
            "DROPPED" => Some(Self::Dropped),
            _ => None,
        }
    }
}

/// A schema-change payload, shared by RESULT bodies and EVENT frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaChange {
    /// What the change did.
    pub change: SchemaChangeKind,
    /// The affected keyspace.
    pub keyspace: String,
    /// The affected table; empty for keyspace-level changes.
    pub table: String,
}

impl SchemaChange {
    /// Decodes the `[string]` triple describing a schema change.
    pub fn decode(input: &mut impl CqlRead) -> Result<Self> {
        let change_name = input.read_string()?;
        let change = SchemaChangeKind::from_wire(&change_name).ok_or_else(|| {
            CqlError::Protocol(format!("unknown schema change {:?}", change_name))
        })?;
        let keyspace = input.read_string()?;
        let table = input.read_string()?;
        Ok(Self {
            change,
            keyspace,
            table,
        })
    }
}

/// One materialized result row: column specs plus raw cells.
///
/// Cells are the raw `[bytes]` payloads; `None` marks a null cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<Vec<ColumnSpec>>,
    cells: Vec<Option<Vec<u8>>>,
}

impl Row {
    /// Creates a row over shared column specs.
    pub fn new(columns: Arc<Vec<ColumnSpec>>, cells: Vec<Option<Vec<u8>>>) -> Self {
        Self { columns, cells }
    }

    /// Returns the column specs this row was decoded against.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the raw cell at the given index.
    pub fn raw(&self, index: usize) -> Option<&Option<Vec<u8>>> {
        self.cells.get(index)
    }

    /// Returns the index of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|spec| spec.name == name)
    }

    /// Decodes the cell at the given index using its column type.
    ///
    /// `Ok(None)` is a null cell; an out-of-range index or a malformed
    /// cell fails with [`CqlError::Decoding`].
    pub fn value(&self, index: usize) -> Result<Option<CqlValue>> {
        let spec = self.columns.get(index).ok_or_else(|| {
            CqlError::Decoding(format!(
                "column index {} out of range for {} columns",
                index,
                self.columns.len()
            ))
        })?;
        match self.cells.get(index) {
            Some(Some(bytes)) => Ok(Some(CqlValue::decode(&spec.ty, bytes)?)),
            Some(None) => Ok(None),
            None => Err(CqlError::Decoding(format!(
                "cell index {} out of range for {} cells",
                index,
                self.cells.len()
            ))),
        }
    }

    /// Decodes the cell of the named column.
    pub fn value_by_name(&self, name: &str) -> Result<Option<CqlValue>> {
        let index = self.column_index(name).ok_or_else(|| {
            CqlError::Decoding(format!("no column named {:?} in result", name))
        })?;
        self.value(index)
    }

    /// Decodes and converts the cell at the given index.
    pub fn get<T: FromCql>(&self, index: usize) -> Result<T> {
        T::from_cql(self.value(index)?)
    }

    /// Decodes and converts the cell of the named column.
    pub fn get_by_name<T: FromCql>(&self, name: &str) -> Result<T> {
        T::from_cql(self.value_by_name(name)?)
    }
}

/// Trait for binding a result row to a record type, positionally.
///
/// Field `i` of the target binds to column `i`. Extra columns are
/// skipped; fields beyond the column count take their default value;
/// a type mismatch fails with [`CqlError::Decoding`]. Implemented via
/// `#[derive(FromRow)]` or by hand.
pub trait FromRow: Sized {
    /// Builds `Self` from a decoded row.
    fn from_row(row: &Row) -> Result<Self>;
}
