//! Catalog entities reported by the diagnostics.
//!
//! Every diagnostic produces a list of [`DbObject`]s of one [`ResultType`]. Equality,
//! hashing and ordering go through [`DbObject::key`], the natural identity of an object
//! in the catalog, so the same index reported by two hosts compares equal even when its
//! size or scan counters differ between them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PgObjectType {
    Table,
    PartitionedTable,
    Index,
    PartitionedIndex,
    Sequence,
    View,
    MaterializedView,
    Function,
    Procedure,
    Constraint,
}

impl PgObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PgObjectType::Table => "table",
            PgObjectType::PartitionedTable => "partitioned table",
            PgObjectType::Index => "index",
            PgObjectType::PartitionedIndex => "partitioned index",
            PgObjectType::Sequence => "sequence",
            PgObjectType::View => "view",
            PgObjectType::MaterializedView => "materialized view",
            PgObjectType::Function => "function",
            PgObjectType::Procedure => "procedure",
            PgObjectType::Constraint => "constraint",
        }
    }

    /// Parses the type labels produced by the catalog queries.
    pub fn from_label(label: &str) -> Option<Self> {
        let object_type = match label.trim().to_lowercase().as_str() {
            "table" => PgObjectType::Table,
            "partitioned table" => PgObjectType::PartitionedTable,
            "index" => PgObjectType::Index,
            "partitioned index" => PgObjectType::PartitionedIndex,
            "sequence" => PgObjectType::Sequence,
            "view" => PgObjectType::View,
            "materialized view" => PgObjectType::MaterializedView,
            "function" => PgObjectType::Function,
            "procedure" => PgObjectType::Procedure,
            "constraint" => PgObjectType::Constraint,
            _ => return None,
        };
        Some(object_type)
    }
}

impl fmt::Display for PgObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity kind a diagnostic produces, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Index,
    IndexWithNulls,
    IndexWithColumns,
    UnusedIndex,
    IndexWithBloat,
    DuplicatedIndexes,
    Table,
    TableWithColumns,
    TableWithBloat,
    TableWithMissingIndex,
    Column,
    ColumnWithSerialType,
    ForeignKey,
    DuplicatedForeignKeys,
    StoredFunction,
    Constraint,
    Sequence,
    AnyObject,
}

impl ResultType {
    /// Human label, as printed by `pg-health list`.
    pub fn label(&self) -> &'static str {
        match self {
            ResultType::Index => "index",
            ResultType::IndexWithNulls => "index with nulls",
            ResultType::IndexWithColumns => "index with columns",
            ResultType::UnusedIndex => "unused index",
            ResultType::IndexWithBloat => "index with bloat",
            ResultType::DuplicatedIndexes => "duplicated indexes",
            ResultType::Table => "table",
            ResultType::TableWithColumns => "table with columns",
            ResultType::TableWithBloat => "table with bloat",
            ResultType::TableWithMissingIndex => "table with missing index",
            ResultType::Column => "column",
            ResultType::ColumnWithSerialType => "column with serial type",
            ResultType::ForeignKey => "foreign key",
            ResultType::DuplicatedForeignKeys => "duplicated foreign keys",
            ResultType::StoredFunction => "stored function",
            ResultType::Constraint => "constraint",
            ResultType::Sequence => "sequence",
            ResultType::AnyObject => "any object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub table_name: String,
    pub index_name: String,
    pub index_size_in_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub table_name: String,
    pub table_size_in_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub table_name: String,
    pub column_name: String,
    pub not_null: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bloat {
    pub bloat_size_in_bytes: u64,
    pub bloat_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table_name: String,
    pub constraint_name: String,
    pub columns: Vec<Column>,
}

/// A finding reported by a diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DbObject {
    Index(Index),
    IndexWithNulls {
        index: Index,
        nullable_column: String,
    },
    IndexWithColumns {
        index: Index,
        columns: Vec<Column>,
    },
    UnusedIndex {
        index: Index,
        index_scans: u64,
    },
    IndexWithBloat {
        index: Index,
        bloat: Bloat,
    },
    /// Two or more indexes on one table. The indexes are kept sorted by name.
    DuplicatedIndexes {
        table_name: String,
        indexes: Vec<Index>,
    },
    Table(Table),
    TableWithColumns {
        table: Table,
        columns: Vec<Column>,
    },
    TableWithBloat {
        table: Table,
        bloat: Bloat,
    },
    TableWithMissingIndex {
        table: Table,
        seq_scans: u64,
        index_scans: u64,
    },
    Column(Column),
    ColumnWithSerialType {
        column: Column,
        serial_type: String,
        sequence_name: String,
    },
    ForeignKey(ForeignKey),
    /// Foreign keys on one table that cover the same or overlapping columns.
    DuplicatedForeignKeys {
        foreign_keys: Vec<ForeignKey>,
    },
    StoredFunction {
        function_name: String,
        function_signature: String,
    },
    Constraint {
        table_name: String,
        constraint_name: String,
        constraint_type: String,
    },
    Sequence {
        sequence_name: String,
        data_type: String,
        remaining_percentage: f64,
    },
    AnyObject {
        object_name: String,
        object_type: PgObjectType,
    },
}

/// Natural identity of a [`DbObject`] in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub table_name: String,
    pub name: String,
    pub detail: String,
    pub result_type: ResultType,
}

impl DbObject {
    pub fn result_type(&self) -> ResultType {
        match self {
            DbObject::Index(_) => ResultType::Index,
            DbObject::IndexWithNulls { .. } => ResultType::IndexWithNulls,
            DbObject::IndexWithColumns { .. } => ResultType::IndexWithColumns,
            DbObject::UnusedIndex { .. } => ResultType::UnusedIndex,
            DbObject::IndexWithBloat { .. } => ResultType::IndexWithBloat,
            DbObject::DuplicatedIndexes { .. } => ResultType::DuplicatedIndexes,
            DbObject::Table(_) => ResultType::Table,
            DbObject::TableWithColumns { .. } => ResultType::TableWithColumns,
            DbObject::TableWithBloat { .. } => ResultType::TableWithBloat,
            DbObject::TableWithMissingIndex { .. } => ResultType::TableWithMissingIndex,
            DbObject::Column(_) => ResultType::Column,
            DbObject::ColumnWithSerialType { .. } => ResultType::ColumnWithSerialType,
            DbObject::ForeignKey(_) => ResultType::ForeignKey,
            DbObject::DuplicatedForeignKeys { .. } => ResultType::DuplicatedForeignKeys,
            DbObject::StoredFunction { .. } => ResultType::StoredFunction,
            DbObject::Constraint { .. } => ResultType::Constraint,
            DbObject::Sequence { .. } => ResultType::Sequence,
            DbObject::AnyObject { .. } => ResultType::AnyObject,
        }
    }

    fn as_index(&self) -> Option<&Index> {
        match self {
            DbObject::Index(index)
            | DbObject::IndexWithNulls { index, .. }
            | DbObject::IndexWithColumns { index, .. }
            | DbObject::UnusedIndex { index, .. }
            | DbObject::IndexWithBloat { index, .. } => Some(index),
            _ => None,
        }
    }

    fn as_table(&self) -> Option<&Table> {
        match self {
            DbObject::Table(table)
            | DbObject::TableWithColumns { table, .. }
            | DbObject::TableWithBloat { table, .. }
            | DbObject::TableWithMissingIndex { table, .. } => Some(table),
            _ => None,
        }
    }

    /// The object's own name. Composite findings join their members' names with `,`.
    pub fn name(&self) -> String {
        if let Some(index) = self.as_index() {
            return index.index_name.clone();
        }
        if let Some(table) = self.as_table() {
            return table.table_name.clone();
        }
        match self {
            DbObject::DuplicatedIndexes { indexes, .. } => {
                indexes.iter().map(|i| i.index_name.as_str()).collect::<Vec<_>>().join(",")
            }
            DbObject::Column(column) | DbObject::ColumnWithSerialType { column, .. } => {
                column.column_name.clone()
            }
            DbObject::ForeignKey(foreign_key) => foreign_key.constraint_name.clone(),
            DbObject::DuplicatedForeignKeys { foreign_keys } => foreign_keys
                .iter()
                .map(|fk| fk.constraint_name.as_str())
                .collect::<Vec<_>>()
                .join(","),
            DbObject::StoredFunction { function_name, .. } => function_name.clone(),
            DbObject::Constraint {
                constraint_name, ..
            } => constraint_name.clone(),
            DbObject::Sequence { sequence_name, .. } => sequence_name.clone(),
            DbObject::AnyObject { object_name, .. } => object_name.clone(),
            _ => String::new(),
        }
    }

    /// The table the object belongs to, for table-bound objects.
    pub fn table_name(&self) -> Option<&str> {
        if let Some(index) = self.as_index() {
            return Some(&index.table_name);
        }
        if let Some(table) = self.as_table() {
            return Some(&table.table_name);
        }
        match self {
            DbObject::DuplicatedIndexes { table_name, .. }
            | DbObject::Constraint { table_name, .. } => Some(table_name),
            DbObject::Column(column) | DbObject::ColumnWithSerialType { column, .. } => {
                Some(&column.table_name)
            }
            DbObject::ForeignKey(foreign_key) => Some(&foreign_key.table_name),
            DbObject::DuplicatedForeignKeys { foreign_keys } => {
                foreign_keys.first().map(|fk| fk.table_name.as_str())
            }
            _ => None,
        }
    }

    /// Names of the indexes this finding is about.
    pub fn index_names(&self) -> Vec<&str> {
        match self {
            DbObject::DuplicatedIndexes { indexes, .. } => {
                indexes.iter().map(|i| i.index_name.as_str()).collect()
            }
            _ => self.as_index().map(|i| i.index_name.as_str()).into_iter().collect(),
        }
    }

    pub fn sequence_name(&self) -> Option<&str> {
        match self {
            DbObject::Sequence { sequence_name, .. }
            | DbObject::ColumnWithSerialType { sequence_name, .. } => Some(sequence_name),
            DbObject::AnyObject {
                object_name,
                object_type: PgObjectType::Sequence,
            } => Some(object_name),
            _ => None,
        }
    }

    /// On-disk size, for objects that have one. Duplicated indexes report their total.
    pub fn size_in_bytes(&self) -> Option<u64> {
        if let Some(index) = self.as_index() {
            return Some(index.index_size_in_bytes);
        }
        if let Some(table) = self.as_table() {
            return Some(table.table_size_in_bytes);
        }
        match self {
            DbObject::DuplicatedIndexes { indexes, .. } => {
                Some(indexes.iter().map(|i| i.index_size_in_bytes).sum())
            }
            _ => None,
        }
    }

    pub fn bloat(&self) -> Option<&Bloat> {
        match self {
            DbObject::IndexWithBloat { bloat, .. } | DbObject::TableWithBloat { bloat, .. } => {
                Some(bloat)
            }
            _ => None,
        }
    }

    pub fn object_type(&self) -> PgObjectType {
        match self {
            DbObject::Index(_)
            | DbObject::IndexWithNulls { .. }
            | DbObject::IndexWithColumns { .. }
            | DbObject::UnusedIndex { .. }
            | DbObject::IndexWithBloat { .. }
            | DbObject::DuplicatedIndexes { .. } => PgObjectType::Index,
            DbObject::Table(_)
            | DbObject::TableWithColumns { .. }
            | DbObject::TableWithBloat { .. }
            | DbObject::TableWithMissingIndex { .. }
            | DbObject::Column(_)
            | DbObject::ColumnWithSerialType { .. } => PgObjectType::Table,
            DbObject::ForeignKey(_)
            | DbObject::DuplicatedForeignKeys { .. }
            | DbObject::Constraint { .. } => PgObjectType::Constraint,
            DbObject::StoredFunction { .. } => PgObjectType::Function,
            DbObject::Sequence { .. } => PgObjectType::Sequence,
            DbObject::AnyObject { object_type, .. } => *object_type,
        }
    }

    pub fn key(&self) -> ObjectKey {
        let detail = match self {
            DbObject::StoredFunction {
                function_signature, ..
            } => function_signature.clone(),
            DbObject::AnyObject { object_type, .. } => object_type.as_str().to_string(),
            _ => String::new(),
        };
        ObjectKey {
            table_name: self.table_name().unwrap_or_default().to_string(),
            name: self.name(),
            detail,
            result_type: self.result_type(),
        }
    }
}

impl PartialEq for DbObject {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DbObject {}

impl Hash for DbObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for DbObject {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DbObject {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for DbObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table_name() {
            Some(table_name) if table_name != self.name() => {
                write!(f, "{}.{}", table_name, self.name())
            }
            _ => f.write_str(&self.name()),
        }
    }
}
