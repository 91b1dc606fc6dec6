//! Turns JSON result rows into [`DbObject`]s according to a diagnostic's result type.

use serde_json::Value;

use crate::framework::core::diagnostic::Diagnostic;
use crate::framework::core::errors::CheckError;
use crate::framework::core::model::{
    Bloat, Column, DbObject, ForeignKey, Index, PgObjectType, ResultType, Table,
};

use super::connection::Row;

pub fn map_row(diagnostic: &Diagnostic, row: &Row) -> Result<DbObject, CheckError> {
    let fields = Fields { diagnostic, row };
    let object = match diagnostic.result_type() {
        ResultType::Index => DbObject::Index(fields.index()?),
        ResultType::IndexWithNulls => DbObject::IndexWithNulls {
            index: fields.index()?,
            nullable_column: fields.string("nullable_field")?,
        },
        ResultType::IndexWithColumns => DbObject::IndexWithColumns {
            index: fields.index()?,
            columns: fields.columns("columns")?,
        },
        ResultType::UnusedIndex => DbObject::UnusedIndex {
            index: fields.index()?,
            index_scans: fields.u64("index_scans")?,
        },
        ResultType::IndexWithBloat => DbObject::IndexWithBloat {
            index: fields.index()?,
            bloat: fields.bloat()?,
        },
        ResultType::DuplicatedIndexes => {
            let table_name = fields.string("table_name")?;
            let mut indexes = fields
                .array("indexes")?
                .iter()
                .map(|item| {
                    let member = fields.nested(item)?;
                    Ok(Index {
                        table_name: table_name.clone(),
                        index_name: member.string("index_name")?,
                        index_size_in_bytes: member.u64("index_size")?,
                    })
                })
                .collect::<Result<Vec<_>, CheckError>>()?;
            indexes.sort_by(|a, b| a.index_name.cmp(&b.index_name));
            DbObject::DuplicatedIndexes {
                table_name,
                indexes,
            }
        }
        ResultType::Table => DbObject::Table(fields.table()?),
        ResultType::TableWithColumns => DbObject::TableWithColumns {
            table: fields.table()?,
            columns: fields.columns("columns")?,
        },
        ResultType::TableWithBloat => DbObject::TableWithBloat {
            table: fields.table()?,
            bloat: fields.bloat()?,
        },
        ResultType::TableWithMissingIndex => DbObject::TableWithMissingIndex {
            table: fields.table()?,
            seq_scans: fields.u64("seq_scans")?,
            index_scans: fields.u64("index_scans")?,
        },
        ResultType::Column => DbObject::Column(fields.column()?),
        ResultType::ColumnWithSerialType => DbObject::ColumnWithSerialType {
            column: fields.column()?,
            serial_type: fields.string("column_type")?,
            sequence_name: fields.string("sequence_name")?,
        },
        ResultType::ForeignKey => DbObject::ForeignKey(ForeignKey {
            table_name: fields.string("table_name")?,
            constraint_name: fields.string("constraint_name")?,
            columns: fields.columns("columns")?,
        }),
        ResultType::DuplicatedForeignKeys => {
            let table_name = fields.string("table_name")?;
            let mut foreign_keys = fields
                .array("foreign_keys")?
                .iter()
                .map(|item| {
                    let member = fields.nested(item)?;
                    Ok(ForeignKey {
                        table_name: table_name.clone(),
                        constraint_name: member.string("constraint_name")?,
                        columns: member.columns_of(&table_name, "columns")?,
                    })
                })
                .collect::<Result<Vec<_>, CheckError>>()?;
            foreign_keys.sort_by(|a, b| a.constraint_name.cmp(&b.constraint_name));
            DbObject::DuplicatedForeignKeys { foreign_keys }
        }
        ResultType::StoredFunction => DbObject::StoredFunction {
            function_name: fields.string("function_name")?,
            function_signature: fields.optional_string("function_signature")?,
        },
        ResultType::Constraint => DbObject::Constraint {
            table_name: fields.string("table_name")?,
            constraint_name: fields.string("constraint_name")?,
            constraint_type: constraint_type_label(&fields.string("constraint_type")?),
        },
        ResultType::Sequence => DbObject::Sequence {
            sequence_name: fields.string("sequence_name")?,
            data_type: fields.string("data_type")?,
            remaining_percentage: fields.f64("remaining_percentage")?,
        },
        ResultType::AnyObject => {
            let label = fields.string("object_type")?;
            let object_type = PgObjectType::from_label(&label)
                .ok_or_else(|| fields.error(format!("unknown object type '{label}'")))?;
            DbObject::AnyObject {
                object_name: fields.string("object_name")?,
                object_type,
            }
        }
    };
    Ok(object)
}

fn constraint_type_label(code: &str) -> String {
    match code {
        "c" => "check".to_string(),
        "f" => "foreign key".to_string(),
        "p" => "primary key".to_string(),
        "u" => "unique".to_string(),
        "x" => "exclusion".to_string(),
        other => other.to_string(),
    }
}

struct Fields<'a> {
    diagnostic: &'a Diagnostic,
    row: &'a serde_json::Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn error(&self, reason: String) -> CheckError {
        CheckError::RowMapping {
            diagnostic: self.diagnostic.name().to_string(),
            reason,
        }
    }

    fn nested(&self, value: &'a Value) -> Result<Fields<'a>, CheckError> {
        match value {
            Value::Object(row) => Ok(Fields {
                diagnostic: self.diagnostic,
                row,
            }),
            other => Err(self.error(format!("expected a JSON object, got {other}"))),
        }
    }

    fn value(&self, column: &str) -> Result<&'a Value, CheckError> {
        match self.row.get(column) {
            Some(Value::Null) | None => Err(self.error(format!("column '{column}' is missing"))),
            Some(value) => Ok(value),
        }
    }

    fn string(&self, column: &str) -> Result<String, CheckError> {
        match self.value(column)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(self.error(format!("column '{column}' is not a string: {other}"))),
        }
    }

    fn optional_string(&self, column: &str) -> Result<String, CheckError> {
        match self.row.get(column) {
            Some(Value::Null) | None => Ok(String::new()),
            Some(_) => self.string(column),
        }
    }

    fn u64(&self, column: &str) -> Result<u64, CheckError> {
        let value = self.value(column)?;
        value
            .as_u64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .ok_or_else(|| {
                self.error(format!("column '{column}' is not a non-negative number: {value}"))
            })
    }

    fn f64(&self, column: &str) -> Result<f64, CheckError> {
        let value = self.value(column)?;
        value
            .as_f64()
            .ok_or_else(|| self.error(format!("column '{column}' is not a number: {value}")))
    }

    fn bool(&self, column: &str) -> Result<bool, CheckError> {
        let value = self.value(column)?;
        value
            .as_bool()
            .ok_or_else(|| self.error(format!("column '{column}' is not a boolean: {value}")))
    }

    fn array(&self, column: &str) -> Result<&'a Vec<Value>, CheckError> {
        match self.value(column)? {
            Value::Array(items) => Ok(items),
            other => Err(self.error(format!("column '{column}' is not an array: {other}"))),
        }
    }

    fn index(&self) -> Result<Index, CheckError> {
        Ok(Index {
            table_name: self.string("table_name")?,
            index_name: self.string("index_name")?,
            index_size_in_bytes: self.u64("index_size")?,
        })
    }

    fn table(&self) -> Result<Table, CheckError> {
        Ok(Table {
            table_name: self.string("table_name")?,
            table_size_in_bytes: self.u64("table_size")?,
        })
    }

    fn column(&self) -> Result<Column, CheckError> {
        Ok(Column {
            table_name: self.string("table_name")?,
            column_name: self.string("column_name")?,
            not_null: self.bool("column_not_null")?,
        })
    }

    fn bloat(&self) -> Result<Bloat, CheckError> {
        Ok(Bloat {
            bloat_size_in_bytes: self.u64("bloat_size")?,
            bloat_percentage: self.f64("bloat_percentage")?,
        })
    }

    fn columns(&self, column: &str) -> Result<Vec<Column>, CheckError> {
        let table_name = self.string("table_name")?;
        self.columns_of(&table_name, column)
    }

    /// An empty or null array is an empty column list.
    fn columns_of(&self, table_name: &str, column: &str) -> Result<Vec<Column>, CheckError> {
        let items = match self.row.get(column) {
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(_) => self.array(column)?,
        };
        items
            .iter()
            .map(|item| {
                let member = self.nested(item)?;
                Ok(Column {
                    table_name: table_name.to_string(),
                    column_name: member.string("column_name")?,
                    not_null: member.bool("not_null")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::core::registry;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    #[test]
    fn test_maps_unused_index() {
        let object = map_row(
            &registry::UNUSED_INDEXES,
            &row(json!({
                "table_name": "orders",
                "index_name": "orders_created_idx",
                "index_size": 8192,
                "index_scans": 0
            })),
        )
        .unwrap();
        match object {
            DbObject::UnusedIndex { index, index_scans } => {
                assert_eq!(index.index_name, "orders_created_idx");
                assert_eq!(index.index_size_in_bytes, 8192);
                assert_eq!(index_scans, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_duplicated_indexes_are_sorted() {
        let object = map_row(
            &registry::DUPLICATED_INDEXES,
            &row(json!({
                "table_name": "orders",
                "indexes": [
                    {"index_name": "orders_b_idx", "index_size": 10},
                    {"index_name": "orders_a_idx", "index_size": 20}
                ]
            })),
        )
        .unwrap();
        assert_eq!(object.name(), "orders_a_idx,orders_b_idx");
        assert_eq!(object.table_name(), Some("orders"));
    }

    #[test]
    fn test_maps_bloat_with_fractional_numbers() {
        let object = map_row(
            &registry::BLOATED_TABLES,
            &row(json!({
                "table_name": "clients",
                "table_size": 81920,
                "bloat_size": 16384,
                "bloat_percentage": 20.5
            })),
        )
        .unwrap();
        let bloat = object.bloat().unwrap();
        assert_eq!(bloat.bloat_size_in_bytes, 16384);
        assert_eq!(bloat.bloat_percentage, 20.5);
    }

    #[test]
    fn test_maps_foreign_key_columns() {
        let object = map_row(
            &registry::FOREIGN_KEYS_WITHOUT_INDEX,
            &row(json!({
                "table_name": "orders",
                "constraint_name": "orders_client_fk",
                "columns": [{"column_name": "client_id", "not_null": true}]
            })),
        )
        .unwrap();
        match object {
            DbObject::ForeignKey(fk) => {
                assert_eq!(fk.columns.len(), 1);
                assert_eq!(fk.columns[0].table_name, "orders");
                assert!(fk.columns[0].not_null);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_maps_any_object_and_constraint() {
        let object = map_row(
            &registry::OBJECTS_NOT_FOLLOWING_NAMING_CONVENTION,
            &row(json!({"object_name": "\"Orders\"", "object_type": "table"})),
        )
        .unwrap();
        assert_eq!(object.object_type(), PgObjectType::Table);

        let constraint = map_row(
            &registry::NOT_VALID_CONSTRAINTS,
            &row(json!({
                "table_name": "orders",
                "constraint_name": "orders_amount_check",
                "constraint_type": "c"
            })),
        )
        .unwrap();
        match constraint {
            DbObject::Constraint {
                constraint_type, ..
            } => assert_eq!(constraint_type, "check"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_column_is_a_mapping_error() {
        let err = map_row(
            &registry::INVALID_INDEXES,
            &row(json!({"table_name": "orders", "index_size": 1})),
        )
        .unwrap_err();
        match err {
            CheckError::RowMapping { diagnostic, reason } => {
                assert_eq!(diagnostic, "invalid_indexes");
                assert!(reason.contains("index_name"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_object_type_is_rejected() {
        let err = map_row(
            &registry::POSSIBLE_OBJECT_NAME_OVERFLOW,
            &row(json!({"object_name": "x", "object_type": "trigger"})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown object type 'trigger'"));
    }
}
