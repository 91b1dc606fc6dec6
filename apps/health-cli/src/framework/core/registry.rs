//! The closed catalog of diagnostics known to the engine.

use super::diagnostic::Diagnostic;
use super::diagnostic::Staticness::{Runtime, Static};
use super::errors::ConfigError;
use super::merge::MergeStrategy;
use super::model::ResultType;

pub const BLOATED_INDEXES: Diagnostic =
    Diagnostic::on_primary("bloated_indexes", ResultType::IndexWithBloat, Runtime);
pub const BLOATED_TABLES: Diagnostic =
    Diagnostic::on_primary("bloated_tables", ResultType::TableWithBloat, Runtime);
pub const DUPLICATED_INDEXES: Diagnostic =
    Diagnostic::on_primary("duplicated_indexes", ResultType::DuplicatedIndexes, Static);
pub const FOREIGN_KEYS_WITHOUT_INDEX: Diagnostic =
    Diagnostic::on_primary("foreign_keys_without_index", ResultType::ForeignKey, Static);
pub const INDEXES_WITH_NULL_VALUES: Diagnostic =
    Diagnostic::on_primary("indexes_with_null_values", ResultType::IndexWithNulls, Static);
pub const INTERSECTED_INDEXES: Diagnostic =
    Diagnostic::on_primary("intersected_indexes", ResultType::DuplicatedIndexes, Static);
pub const INVALID_INDEXES: Diagnostic =
    Diagnostic::on_primary("invalid_indexes", ResultType::Index, Static);
/// Reported when any host flags the table.
pub const TABLES_WITH_MISSING_INDEXES: Diagnostic = Diagnostic::across_cluster(
    "tables_with_missing_indexes",
    ResultType::TableWithMissingIndex,
    MergeStrategy::Union,
);
pub const TABLES_WITHOUT_PRIMARY_KEY: Diagnostic =
    Diagnostic::on_primary("tables_without_primary_key", ResultType::Table, Static);
/// Reported only when the index is unused on every host.
pub const UNUSED_INDEXES: Diagnostic = Diagnostic::across_cluster(
    "unused_indexes",
    ResultType::UnusedIndex,
    MergeStrategy::Intersection,
);
pub const TABLES_WITHOUT_DESCRIPTION: Diagnostic =
    Diagnostic::on_primary("tables_without_description", ResultType::Table, Static);
pub const COLUMNS_WITHOUT_DESCRIPTION: Diagnostic =
    Diagnostic::on_primary("columns_without_description", ResultType::Column, Static);
pub const COLUMNS_WITH_JSON_TYPE: Diagnostic =
    Diagnostic::on_primary("columns_with_json_type", ResultType::Column, Static);
pub const COLUMNS_WITH_SERIAL_TYPES: Diagnostic = Diagnostic::on_primary(
    "columns_with_serial_types",
    ResultType::ColumnWithSerialType,
    Static,
);
pub const FUNCTIONS_WITHOUT_DESCRIPTION: Diagnostic = Diagnostic::on_primary(
    "functions_without_description",
    ResultType::StoredFunction,
    Static,
);
pub const INDEXES_WITH_BOOLEAN: Diagnostic =
    Diagnostic::on_primary("indexes_with_boolean", ResultType::IndexWithColumns, Static);
pub const NOT_VALID_CONSTRAINTS: Diagnostic =
    Diagnostic::on_primary("not_valid_constraints", ResultType::Constraint, Static);
pub const BTREE_INDEXES_ON_ARRAY_COLUMNS: Diagnostic = Diagnostic::on_primary(
    "btree_indexes_on_array_columns",
    ResultType::IndexWithColumns,
    Static,
);
pub const SEQUENCE_OVERFLOW: Diagnostic =
    Diagnostic::on_primary("sequence_overflow", ResultType::Sequence, Runtime);
pub const PRIMARY_KEYS_WITH_SERIAL_TYPES: Diagnostic = Diagnostic::on_primary(
    "primary_keys_with_serial_types",
    ResultType::ColumnWithSerialType,
    Static,
);
pub const DUPLICATED_FOREIGN_KEYS: Diagnostic = Diagnostic::on_primary(
    "duplicated_foreign_keys",
    ResultType::DuplicatedForeignKeys,
    Static,
);
pub const INTERSECTED_FOREIGN_KEYS: Diagnostic = Diagnostic::on_primary(
    "intersected_foreign_keys",
    ResultType::DuplicatedForeignKeys,
    Static,
);
pub const POSSIBLE_OBJECT_NAME_OVERFLOW: Diagnostic =
    Diagnostic::on_primary("possible_object_name_overflow", ResultType::AnyObject, Static);
pub const TABLES_NOT_LINKED_TO_OTHERS: Diagnostic =
    Diagnostic::on_primary("tables_not_linked_to_others", ResultType::Table, Static);
pub const FOREIGN_KEYS_WITH_UNMATCHED_COLUMN_TYPE: Diagnostic = Diagnostic::on_primary(
    "foreign_keys_with_unmatched_column_type",
    ResultType::ForeignKey,
    Static,
);
pub const TABLES_WITH_ZERO_OR_ONE_COLUMN: Diagnostic = Diagnostic::on_primary(
    "tables_with_zero_or_one_column",
    ResultType::TableWithColumns,
    Static,
);
pub const OBJECTS_NOT_FOLLOWING_NAMING_CONVENTION: Diagnostic = Diagnostic::on_primary(
    "objects_not_following_naming_convention",
    ResultType::AnyObject,
    Static,
);
pub const COLUMNS_NOT_FOLLOWING_NAMING_CONVENTION: Diagnostic = Diagnostic::on_primary(
    "columns_not_following_naming_convention",
    ResultType::Column,
    Static,
);
pub const PRIMARY_KEYS_WITH_VARCHAR: Diagnostic = Diagnostic::on_primary(
    "primary_keys_with_varchar",
    ResultType::IndexWithColumns,
    Static,
);
pub const COLUMNS_WITH_FIXED_LENGTH_VARCHAR: Diagnostic =
    Diagnostic::on_primary("columns_with_fixed_length_varchar", ResultType::Column, Static);
pub const INDEXES_WITH_UNNECESSARY_WHERE_CLAUSE: Diagnostic = Diagnostic::on_primary(
    "indexes_with_unnecessary_where_clause",
    ResultType::IndexWithColumns,
    Static,
);
pub const PRIMARY_KEYS_THAT_MOST_LIKELY_NATURAL_KEYS: Diagnostic = Diagnostic::on_primary(
    "primary_keys_that_most_likely_natural_keys",
    ResultType::IndexWithColumns,
    Static,
);
pub const COLUMNS_WITH_MONEY_TYPE: Diagnostic =
    Diagnostic::on_primary("columns_with_money_type", ResultType::Column, Static);
pub const INDEXES_WITH_TIMESTAMP_IN_THE_MIDDLE: Diagnostic = Diagnostic::on_primary(
    "indexes_with_timestamp_in_the_middle",
    ResultType::IndexWithColumns,
    Static,
);
pub const COLUMNS_WITH_TIMESTAMP_OR_TIMETZ_TYPE: Diagnostic = Diagnostic::on_primary(
    "columns_with_timestamp_or_timetz_type",
    ResultType::Column,
    Static,
);
pub const TABLES_WHERE_PRIMARY_KEY_COLUMNS_NOT_FIRST: Diagnostic = Diagnostic::on_primary(
    "tables_where_primary_key_columns_not_first",
    ResultType::Table,
    Static,
);
pub const TABLES_WHERE_ALL_COLUMNS_NULLABLE_EXCEPT_PRIMARY_KEY: Diagnostic =
    Diagnostic::on_primary(
        "tables_where_all_columns_nullable_except_primary_key",
        ResultType::Table,
        Static,
    );

static ALL: [Diagnostic; 37] = [
    BLOATED_INDEXES,
    BLOATED_TABLES,
    DUPLICATED_INDEXES,
    FOREIGN_KEYS_WITHOUT_INDEX,
    INDEXES_WITH_NULL_VALUES,
    INTERSECTED_INDEXES,
    INVALID_INDEXES,
    TABLES_WITH_MISSING_INDEXES,
    TABLES_WITHOUT_PRIMARY_KEY,
    UNUSED_INDEXES,
    TABLES_WITHOUT_DESCRIPTION,
    COLUMNS_WITHOUT_DESCRIPTION,
    COLUMNS_WITH_JSON_TYPE,
    COLUMNS_WITH_SERIAL_TYPES,
    FUNCTIONS_WITHOUT_DESCRIPTION,
    INDEXES_WITH_BOOLEAN,
    NOT_VALID_CONSTRAINTS,
    BTREE_INDEXES_ON_ARRAY_COLUMNS,
    SEQUENCE_OVERFLOW,
    PRIMARY_KEYS_WITH_SERIAL_TYPES,
    DUPLICATED_FOREIGN_KEYS,
    INTERSECTED_FOREIGN_KEYS,
    POSSIBLE_OBJECT_NAME_OVERFLOW,
    TABLES_NOT_LINKED_TO_OTHERS,
    FOREIGN_KEYS_WITH_UNMATCHED_COLUMN_TYPE,
    TABLES_WITH_ZERO_OR_ONE_COLUMN,
    OBJECTS_NOT_FOLLOWING_NAMING_CONVENTION,
    COLUMNS_NOT_FOLLOWING_NAMING_CONVENTION,
    PRIMARY_KEYS_WITH_VARCHAR,
    COLUMNS_WITH_FIXED_LENGTH_VARCHAR,
    INDEXES_WITH_UNNECESSARY_WHERE_CLAUSE,
    PRIMARY_KEYS_THAT_MOST_LIKELY_NATURAL_KEYS,
    COLUMNS_WITH_MONEY_TYPE,
    INDEXES_WITH_TIMESTAMP_IN_THE_MIDDLE,
    COLUMNS_WITH_TIMESTAMP_OR_TIMETZ_TYPE,
    TABLES_WHERE_PRIMARY_KEY_COLUMNS_NOT_FIRST,
    TABLES_WHERE_ALL_COLUMNS_NULLABLE_EXCEPT_PRIMARY_KEY,
];

/// Every registered diagnostic, in catalog order.
pub fn all() -> &'static [Diagnostic] {
    &ALL
}

/// Looks a diagnostic up by name, ignoring case and surrounding whitespace.
pub fn find(name: &str) -> Result<Diagnostic, ConfigError> {
    let wanted = name.trim();
    ALL.iter()
        .find(|d| d.name().eq_ignore_ascii_case(wanted))
        .copied()
        .ok_or_else(|| unknown_diagnostics(&[wanted]))
}

/// Resolves a list of names, reporting every unknown one at once.
pub fn find_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Diagnostic>, ConfigError> {
    let mut found = Vec::with_capacity(names.len());
    let mut unknown = Vec::new();
    for name in names {
        match find(name.as_ref()) {
            Ok(diagnostic) if !found.contains(&diagnostic) => found.push(diagnostic),
            Ok(_) => {}
            Err(_) => unknown.push(name.as_ref().trim()),
        }
    }
    if !unknown.is_empty() {
        return Err(unknown_diagnostics(&unknown));
    }
    Ok(found)
}

fn unknown_diagnostics(names: &[&str]) -> ConfigError {
    ConfigError::UnknownDiagnostic {
        names: names.join(", "),
        available: ALL.iter().map(Diagnostic::name).collect::<Vec<_>>().join(", "),
    }
}
