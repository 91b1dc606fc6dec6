//! Migrations that add the index a foreign key is missing.
//!
//! Index names follow `<table>_<columns>[_without_nulls]_idx`. Names longer than
//! PostgreSQL keeps are shortened by replacing the column list with its hash, and the
//! full name is kept in a leading comment.

use itertools::Itertools;
use serde::Deserialize;

use super::errors::CheckError;
use super::model::{Column, DbObject, ForeignKey};

/// Longest identifier, in bytes, PostgreSQL stores without truncating it.
pub const MAX_IDENTIFIER_LENGTH: usize = 63;
pub const MAX_INDENTATION: usize = 8;

const DELIMITER: &str = "_";
const IDX: &str = "idx";
const WITHOUT_NULLS: &str = "without_nulls";

/// Where `idx` goes in a generated index name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdxPosition {
    Prefix,
    #[default]
    Suffix,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratingOptions {
    /// Emit `create index concurrently`
    pub concurrently: bool,
    /// Add a partial `where <col> is not null` for nullable columns
    pub exclude_nulls: bool,
    pub break_lines: bool,
    pub indentation: usize,
    pub uppercase_for_keywords: bool,
    /// Mark partial indexes with `without_nulls` in their name
    pub name_without_nulls: bool,
    pub idx_position: IdxPosition,
}

impl Default for GeneratingOptions {
    fn default() -> Self {
        Self {
            concurrently: true,
            exclude_nulls: true,
            break_lines: true,
            indentation: 4,
            uppercase_for_keywords: false,
            name_without_nulls: true,
            idx_position: IdxPosition::Suffix,
        }
    }
}

impl GeneratingOptions {
    pub fn validate(&self) -> Result<(), CheckError> {
        if self.indentation > MAX_INDENTATION {
            return Err(CheckError::InvalidParameter(format!(
                "indentation should be in the range [0, {MAX_INDENTATION}] but was {}",
                self.indentation
            )));
        }
        Ok(())
    }

    fn keyword(&self, keyword: &str) -> String {
        if self.uppercase_for_keywords {
            keyword.to_uppercase()
        } else {
            keyword.to_string()
        }
    }

    fn line_break(&self) -> &'static str {
        if self.break_lines {
            "\n"
        } else {
            " "
        }
    }
}

/// One `create index` statement per foreign key found in `objects`, in input order.
/// Every other kind of finding is skipped.
pub fn generate_migrations(
    objects: &[DbObject],
    options: &GeneratingOptions,
) -> Result<Vec<String>, CheckError> {
    options.validate()?;
    Ok(objects
        .iter()
        .filter_map(|object| match object {
            DbObject::ForeignKey(foreign_key) => Some(index_on_foreign_key(foreign_key, options)),
            _ => None,
        })
        .collect())
}

pub fn index_on_foreign_key(foreign_key: &ForeignKey, options: &GeneratingOptions) -> String {
    let name = IndexName::of(foreign_key, options);
    let full_name = name.full();
    let too_long = full_name.len() > MAX_IDENTIFIER_LENGTH;

    let mut sql = String::new();
    if too_long {
        sql.push_str(&format!("/* {full_name} */{}", options.line_break()));
    }
    sql.push_str(&options.keyword("create index "));
    if options.concurrently {
        sql.push_str(&options.keyword("concurrently "));
    }
    sql.push_str(&options.keyword("if not exists "));
    sql.push_str(&if too_long { name.truncated() } else { full_name });
    sql.push_str(options.line_break());
    if options.break_lines {
        sql.push_str(&" ".repeat(options.indentation));
    }
    sql.push_str(&options.keyword("on "));
    sql.push_str(&format!(
        "{} ({})",
        foreign_key.table_name,
        foreign_key.columns.iter().map(|c| &c.column_name).join(", ")
    ));

    let nullable = nullable_columns(foreign_key).collect_vec();
    if options.exclude_nulls && !nullable.is_empty() {
        sql.push_str(&options.keyword(" where "));
        sql.push_str(
            &nullable
                .iter()
                .map(|column| {
                    format!("{}{}", column.column_name, options.keyword(" is not null"))
                })
                .join(" and "),
        );
    }
    sql.push(';');
    sql
}

fn nullable_columns(foreign_key: &ForeignKey) -> impl Iterator<Item = &Column> {
    foreign_key.columns.iter().filter(|column| !column.not_null)
}

struct IndexName<'a> {
    table: &'a str,
    columns: String,
    without_nulls: bool,
    idx_position: IdxPosition,
}

impl<'a> IndexName<'a> {
    fn of(foreign_key: &'a ForeignKey, options: &GeneratingOptions) -> Self {
        let table = foreign_key
            .table_name
            .split_once('.')
            .map_or(foreign_key.table_name.as_str(), |(_, table)| table);
        Self {
            table,
            columns: foreign_key
                .columns
                .iter()
                .map(|c| &c.column_name)
                .join(DELIMITER),
            without_nulls: options.name_without_nulls
                && options.exclude_nulls
                && nullable_columns(foreign_key).next().is_some(),
            idx_position: options.idx_position,
        }
    }

    fn main_part_length(&self) -> usize {
        self.table.len() + DELIMITER.len() + self.columns.len()
    }

    fn full(&self) -> String {
        let mut name = format!("{}{DELIMITER}{}", self.table, self.columns);
        if self.without_nulls {
            name.push_str(DELIMITER);
            name.push_str(WITHOUT_NULLS);
        }
        self.with_idx(name)
    }

    /// Fits in `MAX_IDENTIFIER_LENGTH`. `without_nulls` is dropped when it does not fit.
    fn truncated(&self) -> String {
        let mut remaining = MAX_IDENTIFIER_LENGTH as isize;
        if self.idx_position != IdxPosition::None {
            remaining -= (IDX.len() + DELIMITER.len()) as isize;
        }

        let main_part_length = self.main_part_length() as isize;
        let mut name = if main_part_length > remaining {
            let hash = java_string_hash(&self.columns);
            let columns_part = if hash < 0 {
                format!("n{}", hash.unsigned_abs())
            } else {
                hash.to_string()
            };
            remaining -= (DELIMITER.len() + columns_part.len()) as isize;
            let name = format!(
                "{}{DELIMITER}{columns_part}",
                truncate(self.table, remaining.max(0) as usize)
            );
            remaining -= self.table.len() as isize;
            name
        } else {
            remaining -= main_part_length;
            format!("{}{DELIMITER}{}", self.table, self.columns)
        };

        if self.without_nulls && remaining > WITHOUT_NULLS.len() as isize {
            name.push_str(DELIMITER);
            name.push_str(WITHOUT_NULLS);
        }
        self.with_idx(name)
    }

    fn with_idx(&self, name: String) -> String {
        match self.idx_position {
            IdxPosition::Prefix => format!("{IDX}{DELIMITER}{name}"),
            IdxPosition::Suffix => format!("{name}{DELIMITER}{IDX}"),
            IdxPosition::None => name,
        }
    }
}

/// The 31-based hash over UTF-16 code units that earlier releases used, so names
/// of already generated indexes stay stable.
fn java_string_hash(value: &str) -> i32 {
    value
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

fn truncate(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let end = value
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max_bytes)
        .last()
        .unwrap_or(0);
    &value[..end]
}
