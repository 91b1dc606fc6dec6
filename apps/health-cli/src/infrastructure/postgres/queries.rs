//! Catalog SQL for every registered diagnostic.
//!
//! Every query takes the schema name as `$1`. Threshold-driven diagnostics take their
//! threshold as `$2`. Each query returns plain columns named after the fields the row
//! mapper reads; nested collections (index columns, duplicated index groups) come back as
//! JSON arrays.

use std::borrow::Cow;

use crate::framework::core::context::PgContext;
use crate::framework::core::diagnostic::Diagnostic;

use super::connection::QueryParam;

/// Which context values a query binds after the schema name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryBinding {
    Schema,
    SchemaAndBloatThreshold,
    SchemaAndRemainingPercentage,
}

impl QueryBinding {
    pub fn params(self, ctx: &PgContext) -> Vec<QueryParam> {
        let schema = QueryParam::Text(ctx.schema_name().to_string());
        match self {
            QueryBinding::Schema => vec![schema],
            QueryBinding::SchemaAndBloatThreshold => vec![
                schema,
                QueryParam::Float(ctx.bloat_percentage_threshold()),
            ],
            QueryBinding::SchemaAndRemainingPercentage => vec![
                schema,
                QueryParam::Float(ctx.remaining_percentage_threshold()),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryTemplate {
    pub sql: Cow<'static, str>,
    pub binding: QueryBinding,
}

impl QueryTemplate {
    pub fn new(sql: impl Into<Cow<'static, str>>, binding: QueryBinding) -> Self {
        Self {
            sql: sql.into(),
            binding,
        }
    }
}

/// Source of the query text for a diagnostic.
pub trait QueryProvider: Send + Sync {
    /// `None` when the provider has no query for the diagnostic.
    fn query_for(&self, diagnostic: &Diagnostic) -> Option<QueryTemplate>;
}

/// The built-in PostgreSQL catalog queries.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardQueries;

impl QueryProvider for StandardQueries {
    fn query_for(&self, diagnostic: &Diagnostic) -> Option<QueryTemplate> {
        use QueryBinding::*;

        let (sql, binding) = match diagnostic.name() {
            "bloated_indexes" => (BLOATED_INDEXES, SchemaAndBloatThreshold),
            "bloated_tables" => (BLOATED_TABLES, SchemaAndBloatThreshold),
            "duplicated_indexes" => (DUPLICATED_INDEXES, Schema),
            "foreign_keys_without_index" => (FOREIGN_KEYS_WITHOUT_INDEX, Schema),
            "indexes_with_null_values" => (INDEXES_WITH_NULL_VALUES, Schema),
            "intersected_indexes" => (INTERSECTED_INDEXES, Schema),
            "invalid_indexes" => (INVALID_INDEXES, Schema),
            "tables_with_missing_indexes" => (TABLES_WITH_MISSING_INDEXES, Schema),
            "tables_without_primary_key" => (TABLES_WITHOUT_PRIMARY_KEY, Schema),
            "unused_indexes" => (UNUSED_INDEXES, Schema),
            "tables_without_description" => (TABLES_WITHOUT_DESCRIPTION, Schema),
            "columns_without_description" => (COLUMNS_WITHOUT_DESCRIPTION, Schema),
            "columns_with_json_type" => (COLUMNS_WITH_JSON_TYPE, Schema),
            "columns_with_serial_types" => (COLUMNS_WITH_SERIAL_TYPES, Schema),
            "functions_without_description" => (FUNCTIONS_WITHOUT_DESCRIPTION, Schema),
            "indexes_with_boolean" => (INDEXES_WITH_BOOLEAN, Schema),
            "not_valid_constraints" => (NOT_VALID_CONSTRAINTS, Schema),
            "btree_indexes_on_array_columns" => (BTREE_INDEXES_ON_ARRAY_COLUMNS, Schema),
            "sequence_overflow" => (SEQUENCE_OVERFLOW, SchemaAndRemainingPercentage),
            "primary_keys_with_serial_types" => (PRIMARY_KEYS_WITH_SERIAL_TYPES, Schema),
            "duplicated_foreign_keys" => (DUPLICATED_FOREIGN_KEYS, Schema),
            "intersected_foreign_keys" => (INTERSECTED_FOREIGN_KEYS, Schema),
            "possible_object_name_overflow" => (POSSIBLE_OBJECT_NAME_OVERFLOW, Schema),
            "tables_not_linked_to_others" => (TABLES_NOT_LINKED_TO_OTHERS, Schema),
            "foreign_keys_with_unmatched_column_type" => {
                (FOREIGN_KEYS_WITH_UNMATCHED_COLUMN_TYPE, Schema)
            }
            "tables_with_zero_or_one_column" => (TABLES_WITH_ZERO_OR_ONE_COLUMN, Schema),
            "objects_not_following_naming_convention" => {
                (OBJECTS_NOT_FOLLOWING_NAMING_CONVENTION, Schema)
            }
            "columns_not_following_naming_convention" => {
                (COLUMNS_NOT_FOLLOWING_NAMING_CONVENTION, Schema)
            }
            "primary_keys_with_varchar" => (PRIMARY_KEYS_WITH_VARCHAR, Schema),
            "columns_with_fixed_length_varchar" => (COLUMNS_WITH_FIXED_LENGTH_VARCHAR, Schema),
            "indexes_with_unnecessary_where_clause" => {
                (INDEXES_WITH_UNNECESSARY_WHERE_CLAUSE, Schema)
            }
            "primary_keys_that_most_likely_natural_keys" => {
                (PRIMARY_KEYS_THAT_MOST_LIKELY_NATURAL_KEYS, Schema)
            }
            "columns_with_money_type" => (COLUMNS_WITH_MONEY_TYPE, Schema),
            "indexes_with_timestamp_in_the_middle" => {
                (INDEXES_WITH_TIMESTAMP_IN_THE_MIDDLE, Schema)
            }
            "columns_with_timestamp_or_timetz_type" => {
                (COLUMNS_WITH_TIMESTAMP_OR_TIMETZ_TYPE, Schema)
            }
            "tables_where_primary_key_columns_not_first" => {
                (TABLES_WHERE_PRIMARY_KEY_COLUMNS_NOT_FIRST, Schema)
            }
            "tables_where_all_columns_nullable_except_primary_key" => {
                (TABLES_WHERE_ALL_COLUMNS_NULLABLE_EXCEPT_PRIMARY_KEY, Schema)
            }
            _ => return None,
        };
        Some(QueryTemplate::new(sql, binding))
    }
}

/// Reads the statistics reset time of the database the connection points at.
pub const LAST_STATS_RESET: &str = r#"
select stats_reset
from pg_catalog.pg_stat_database
where datname = pg_catalog.current_database()"#;

/// `true` when the host accepts writes.
pub const IS_PRIMARY: &str = r#"
select not pg_catalog.pg_is_in_recovery() as is_primary"#;

// Index health

const BLOATED_INDEXES: &str = r#"
with indexes_data as (
    select
        i.indrelid,
        i.indexrelid,
        ic.relpages,
        ic.reltuples,
        coalesce(substring(array_to_string(ic.reloptions, ' ') from 'fillfactor=([0-9]+)')::integer, 90) as fill_factor,
        current_setting('block_size')::numeric as block_size,
        (
            select coalesce(sum(s.avg_width), 0)
            from pg_catalog.pg_attribute a
                join pg_catalog.pg_stats s on s.schemaname = n.nspname and s.tablename = tc.relname and s.attname = a.attname
            where a.attrelid = i.indrelid and a.attnum = any(i.indkey::smallint[])
        ) as data_width
    from pg_catalog.pg_index i
        join pg_catalog.pg_class ic on ic.oid = i.indexrelid
        join pg_catalog.pg_class tc on tc.oid = i.indrelid
        join pg_catalog.pg_namespace n on n.oid = ic.relnamespace
        join pg_catalog.pg_am am on am.oid = ic.relam
    where
        am.amname = 'btree' and
        ic.relpages > 0 and
        n.nspname = $1::text
),
estimation as (
    select
        d.*,
        ceil(d.reltuples * (d.data_width + 12) / ((d.block_size - 24) * d.fill_factor / 100.0)) as estimated_pages
    from indexes_data d
)
select
    e.indrelid::regclass::text as table_name,
    e.indexrelid::regclass::text as index_name,
    pg_catalog.pg_relation_size(e.indexrelid) as index_size,
    greatest(((e.relpages - e.estimated_pages) * e.block_size)::bigint, 0) as bloat_size,
    greatest(round(100 * (e.relpages - e.estimated_pages)::numeric / e.relpages, 2), 0) as bloat_percentage
from estimation e
where 100 * (e.relpages - e.estimated_pages)::numeric / e.relpages >= $2::float8
order by table_name, index_name"#;

const DUPLICATED_INDEXES: &str = r#"
select
    x.indrelid::regclass::text as table_name,
    json_agg(
        json_build_object('index_name', x.indexrelid::regclass::text, 'index_size', pg_catalog.pg_relation_size(x.indexrelid))
        order by x.indexrelid::regclass::text
    ) as indexes
from pg_catalog.pg_index x
    join pg_catalog.pg_class c on c.oid = x.indexrelid
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
where n.nspname = $1::text
group by
    x.indrelid,
    x.indkey::text,
    x.indclass::text,
    x.indcollation::text,
    x.indoption::text,
    coalesce(pg_catalog.pg_get_expr(x.indexprs, x.indrelid), ''),
    coalesce(pg_catalog.pg_get_expr(x.indpred, x.indrelid), '')
having count(*) > 1
order by table_name"#;

const INTERSECTED_INDEXES: &str = r#"
select
    a.indrelid::regclass::text as table_name,
    json_build_array(
        json_build_object('index_name', a.indexrelid::regclass::text, 'index_size', pg_catalog.pg_relation_size(a.indexrelid)),
        json_build_object('index_name', b.indexrelid::regclass::text, 'index_size', pg_catalog.pg_relation_size(b.indexrelid))
    ) as indexes
from pg_catalog.pg_index a
    join pg_catalog.pg_index b on b.indrelid = a.indrelid and b.indexrelid > a.indexrelid
    join pg_catalog.pg_class ac on ac.oid = a.indexrelid
    join pg_catalog.pg_class bc on bc.oid = b.indexrelid
    join pg_catalog.pg_namespace n on n.oid = ac.relnamespace
where
    n.nspname = $1::text and
    ac.relam = bc.relam and
    a.indkey[0] <> 0 and
    a.indkey[0] = b.indkey[0] and
    a.indkey::text <> b.indkey::text and
    a.indpred is null and
    b.indpred is null
order by table_name, a.indexrelid::regclass::text, b.indexrelid::regclass::text"#;

const FOREIGN_KEYS_WITHOUT_INDEX: &str = r#"
select
    c.conrelid::regclass::text as table_name,
    c.conname as constraint_name,
    (
        select json_agg(json_build_object('column_name', a.attname, 'not_null', a.attnotnull) order by u.pos)
        from unnest(c.conkey) with ordinality u(attnum, pos)
            join pg_catalog.pg_attribute a on a.attrelid = c.conrelid and a.attnum = u.attnum
    ) as columns
from pg_catalog.pg_constraint c
    join pg_catalog.pg_namespace n on n.oid = c.connamespace
where
    c.contype = 'f' and
    n.nspname = $1::text and
    not exists (
        select 1
        from pg_catalog.pg_index i
        where
            i.indrelid = c.conrelid and
            i.indpred is null and
            (i.indkey::smallint[])[0:array_length(c.conkey, 1) - 1] @> c.conkey
    )
order by table_name, constraint_name"#;

const INDEXES_WITH_NULL_VALUES: &str = r#"
select
    i.indrelid::regclass::text as table_name,
    i.indexrelid::regclass::text as index_name,
    pg_catalog.pg_relation_size(i.indexrelid) as index_size,
    a.attname as nullable_field
from pg_catalog.pg_index i
    join pg_catalog.pg_class ic on ic.oid = i.indexrelid
    join pg_catalog.pg_namespace n on n.oid = ic.relnamespace
    join pg_catalog.pg_attribute a on a.attrelid = i.indrelid and a.attnum = i.indkey[0]
where
    n.nspname = $1::text and
    not i.indisunique and
    i.indnatts = 1 and
    i.indpred is null and
    not a.attnotnull
order by table_name, index_name"#;

const INVALID_INDEXES: &str = r#"
select
    i.indrelid::regclass::text as table_name,
    i.indexrelid::regclass::text as index_name,
    pg_catalog.pg_relation_size(i.indexrelid) as index_size
from pg_catalog.pg_index i
    join pg_catalog.pg_class ic on ic.oid = i.indexrelid
    join pg_catalog.pg_namespace n on n.oid = ic.relnamespace
where
    not i.indisvalid and
    n.nspname = $1::text
order by table_name, index_name"#;

const TABLES_WITH_MISSING_INDEXES: &str = r#"
select
    s.relid::regclass::text as table_name,
    pg_catalog.pg_table_size(s.relid) as table_size,
    coalesce(s.seq_scan, 0) as seq_scans,
    coalesce(s.idx_scan, 0) as index_scans
from pg_catalog.pg_stat_all_tables s
where
    s.schemaname = $1::text and
    pg_catalog.pg_table_size(s.relid) > 5 * 8192 and
    coalesce(s.seq_scan, 0) - coalesce(s.idx_scan, 0) > 50
order by table_name"#;

const TABLES_WITHOUT_PRIMARY_KEY: &str = r#"
select
    c.oid::regclass::text as table_name,
    pg_catalog.pg_table_size(c.oid) as table_size
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    n.nspname = $1::text and
    not exists (
        select 1 from pg_catalog.pg_constraint pc where pc.conrelid = c.oid and pc.contype = 'p'
    )
order by table_name"#;

const UNUSED_INDEXES: &str = r#"
select
    s.relid::regclass::text as table_name,
    s.indexrelid::regclass::text as index_name,
    pg_catalog.pg_relation_size(i.indexrelid) as index_size,
    s.idx_scan as index_scans
from pg_catalog.pg_stat_all_indexes s
    join pg_catalog.pg_index i on i.indexrelid = s.indexrelid
where
    s.schemaname = $1::text and
    not i.indisunique and
    i.indisvalid and
    s.idx_scan < 50 and
    not exists (
        select 1 from pg_catalog.pg_constraint c
        where c.conindid = i.indexrelid and c.contype in ('p', 'u', 'x')
    )
order by table_name, index_name"#;

const INDEXES_WITH_BOOLEAN: &str = r#"
select
    i.indrelid::regclass::text as table_name,
    i.indexrelid::regclass::text as index_name,
    pg_catalog.pg_relation_size(i.indexrelid) as index_size,
    (
        select json_agg(json_build_object('column_name', a.attname, 'not_null', a.attnotnull) order by k.pos)
        from unnest(i.indkey::smallint[]) with ordinality k(attnum, pos)
            join pg_catalog.pg_attribute a on a.attrelid = i.indrelid and a.attnum = k.attnum
        where a.atttypid = 'boolean'::regtype
    ) as columns
from pg_catalog.pg_index i
    join pg_catalog.pg_class ic on ic.oid = i.indexrelid
    join pg_catalog.pg_namespace n on n.oid = ic.relnamespace
where
    n.nspname = $1::text and
    not i.indisunique and
    exists (
        select 1 from pg_catalog.pg_attribute a
        where a.attrelid = i.indrelid and a.attnum = any(i.indkey::smallint[]) and a.atttypid = 'boolean'::regtype
    )
order by table_name, index_name"#;

const BTREE_INDEXES_ON_ARRAY_COLUMNS: &str = r#"
select
    i.indrelid::regclass::text as table_name,
    i.indexrelid::regclass::text as index_name,
    pg_catalog.pg_relation_size(i.indexrelid) as index_size,
    (
        select json_agg(json_build_object('column_name', a.attname, 'not_null', a.attnotnull) order by k.pos)
        from unnest(i.indkey::smallint[]) with ordinality k(attnum, pos)
            join pg_catalog.pg_attribute a on a.attrelid = i.indrelid and a.attnum = k.attnum
            join pg_catalog.pg_type t on t.oid = a.atttypid
        where t.typcategory = 'A'
    ) as columns
from pg_catalog.pg_index i
    join pg_catalog.pg_class ic on ic.oid = i.indexrelid
    join pg_catalog.pg_namespace n on n.oid = ic.relnamespace
    join pg_catalog.pg_am am on am.oid = ic.relam
where
    n.nspname = $1::text and
    am.amname = 'btree' and
    exists (
        select 1
        from pg_catalog.pg_attribute a
            join pg_catalog.pg_type t on t.oid = a.atttypid
        where a.attrelid = i.indrelid and a.attnum = any(i.indkey::smallint[]) and t.typcategory = 'A'
    )
order by table_name, index_name"#;

const INDEXES_WITH_UNNECESSARY_WHERE_CLAUSE: &str = r#"
select
    i.indrelid::regclass::text as table_name,
    i.indexrelid::regclass::text as index_name,
    pg_catalog.pg_relation_size(i.indexrelid) as index_size,
    (
        select json_agg(json_build_object('column_name', a.attname, 'not_null', a.attnotnull) order by k.pos)
        from unnest(i.indkey::smallint[]) with ordinality k(attnum, pos)
            join pg_catalog.pg_attribute a on a.attrelid = i.indrelid and a.attnum = k.attnum
    ) as columns
from pg_catalog.pg_index i
    join pg_catalog.pg_class ic on ic.oid = i.indexrelid
    join pg_catalog.pg_namespace n on n.oid = ic.relnamespace
where
    n.nspname = $1::text and
    i.indpred is not null and
    exists (
        select 1 from pg_catalog.pg_attribute a
        where
            a.attrelid = i.indrelid and
            a.attnum = any(i.indkey::smallint[]) and
            a.attnotnull and
            pg_catalog.pg_get_expr(i.indpred, i.indrelid) ilike '%' || quote_ident(a.attname) || ' is not null%'
    )
order by table_name, index_name"#;

const INDEXES_WITH_TIMESTAMP_IN_THE_MIDDLE: &str = r#"
select
    i.indrelid::regclass::text as table_name,
    i.indexrelid::regclass::text as index_name,
    pg_catalog.pg_relation_size(i.indexrelid) as index_size,
    (
        select json_agg(json_build_object('column_name', a.attname, 'not_null', a.attnotnull) order by k.pos)
        from unnest(i.indkey::smallint[]) with ordinality k(attnum, pos)
            join pg_catalog.pg_attribute a on a.attrelid = i.indrelid and a.attnum = k.attnum
    ) as columns
from pg_catalog.pg_index i
    join pg_catalog.pg_class ic on ic.oid = i.indexrelid
    join pg_catalog.pg_namespace n on n.oid = ic.relnamespace
    join pg_catalog.pg_am am on am.oid = ic.relam
where
    n.nspname = $1::text and
    am.amname = 'btree' and
    i.indnkeyatts > 1 and
    exists (
        select 1
        from unnest(i.indkey::smallint[]) with ordinality k(attnum, pos)
            join pg_catalog.pg_attribute a on a.attrelid = i.indrelid and a.attnum = k.attnum
        where
            k.pos < i.indnkeyatts and
            a.atttypid in ('timestamp'::regtype, 'timestamptz'::regtype)
    )
order by table_name, index_name"#;

// Table health

const BLOATED_TABLES: &str = r#"
with tables_data as (
    select
        c.oid,
        c.relpages,
        c.reltuples,
        coalesce(substring(array_to_string(c.reloptions, ' ') from 'fillfactor=([0-9]+)')::integer, 100) as fill_factor,
        current_setting('block_size')::numeric as block_size,
        (
            select coalesce(sum(s.avg_width), 0)
            from pg_catalog.pg_stats s
            where s.schemaname = n.nspname and s.tablename = c.relname
        ) as data_width
    from pg_catalog.pg_class c
        join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    where
        c.relkind = 'r' and
        c.relpages > 0 and
        n.nspname = $1::text
),
estimation as (
    select
        d.*,
        ceil(d.reltuples * (d.data_width + 28) / ((d.block_size - 24) * d.fill_factor / 100.0)) as estimated_pages
    from tables_data d
)
select
    e.oid::regclass::text as table_name,
    pg_catalog.pg_table_size(e.oid) as table_size,
    greatest(((e.relpages - e.estimated_pages) * e.block_size)::bigint, 0) as bloat_size,
    greatest(round(100 * (e.relpages - e.estimated_pages)::numeric / e.relpages, 2), 0) as bloat_percentage
from estimation e
where 100 * (e.relpages - e.estimated_pages)::numeric / e.relpages >= $2::float8
order by table_name"#;

const TABLES_WITHOUT_DESCRIPTION: &str = r#"
select
    c.oid::regclass::text as table_name,
    pg_catalog.pg_table_size(c.oid) as table_size
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    n.nspname = $1::text and
    coalesce(trim(pg_catalog.obj_description(c.oid, 'pg_class')), '') = ''
order by table_name"#;

const TABLES_NOT_LINKED_TO_OTHERS: &str = r#"
select
    c.oid::regclass::text as table_name,
    pg_catalog.pg_table_size(c.oid) as table_size
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    n.nspname = $1::text and
    not exists (
        select 1 from pg_catalog.pg_constraint pc
        where pc.contype = 'f' and (pc.conrelid = c.oid or pc.confrelid = c.oid)
    )
order by table_name"#;

const TABLES_WITH_ZERO_OR_ONE_COLUMN: &str = r#"
select
    c.oid::regclass::text as table_name,
    pg_catalog.pg_table_size(c.oid) as table_size,
    coalesce((
        select json_agg(json_build_object('column_name', a.attname, 'not_null', a.attnotnull) order by a.attnum)
        from pg_catalog.pg_attribute a
        where a.attrelid = c.oid and a.attnum > 0 and not a.attisdropped
    ), '[]'::json) as columns
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    n.nspname = $1::text and
    (
        select count(*) from pg_catalog.pg_attribute a
        where a.attrelid = c.oid and a.attnum > 0 and not a.attisdropped
    ) <= 1
order by table_name"#;

const TABLES_WHERE_PRIMARY_KEY_COLUMNS_NOT_FIRST: &str = r#"
select
    c.oid::regclass::text as table_name,
    pg_catalog.pg_table_size(c.oid) as table_size
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    join pg_catalog.pg_constraint pk on pk.conrelid = c.oid and pk.contype = 'p'
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    n.nspname = $1::text and
    exists (
        select 1
        from pg_catalog.pg_attribute a
        where
            a.attrelid = c.oid and
            a.attnum > 0 and
            not a.attisdropped and
            not (a.attnum = any(pk.conkey)) and
            a.attnum < (select max(k) from unnest(pk.conkey) k)
    )
order by table_name"#;

const TABLES_WHERE_ALL_COLUMNS_NULLABLE_EXCEPT_PRIMARY_KEY: &str = r#"
select
    c.oid::regclass::text as table_name,
    pg_catalog.pg_table_size(c.oid) as table_size
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    join pg_catalog.pg_constraint pk on pk.conrelid = c.oid and pk.contype = 'p'
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    n.nspname = $1::text and
    exists (
        select 1 from pg_catalog.pg_attribute a
        where a.attrelid = c.oid and a.attnum > 0 and not a.attisdropped and not (a.attnum = any(pk.conkey))
    ) and
    not exists (
        select 1 from pg_catalog.pg_attribute a
        where
            a.attrelid = c.oid and
            a.attnum > 0 and
            not a.attisdropped and
            a.attnotnull and
            not (a.attnum = any(pk.conkey))
    )
order by table_name"#;

// Column health

const COLUMNS_WITHOUT_DESCRIPTION: &str = r#"
select
    c.oid::regclass::text as table_name,
    a.attname as column_name,
    a.attnotnull as column_not_null
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    join pg_catalog.pg_attribute a on a.attrelid = c.oid
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    a.attnum > 0 and
    not a.attisdropped and
    n.nspname = $1::text and
    coalesce(trim(pg_catalog.col_description(c.oid, a.attnum)), '') = ''
order by table_name, column_name"#;

const COLUMNS_WITH_JSON_TYPE: &str = r#"
select
    c.oid::regclass::text as table_name,
    a.attname as column_name,
    a.attnotnull as column_not_null
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    join pg_catalog.pg_attribute a on a.attrelid = c.oid
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    a.attnum > 0 and
    not a.attisdropped and
    n.nspname = $1::text and
    a.atttypid = 'json'::regtype
order by table_name, column_name"#;

const COLUMNS_WITH_SERIAL_TYPES: &str = r#"
select
    c.oid::regclass::text as table_name,
    a.attname as column_name,
    a.attnotnull as column_not_null,
    case a.atttypid
        when 'int2'::regtype then 'smallserial'
        when 'int4'::regtype then 'serial'
        else 'bigserial'
    end as column_type,
    seq.oid::regclass::text as sequence_name
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    join pg_catalog.pg_attribute a on a.attrelid = c.oid
    join pg_catalog.pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum
    join pg_catalog.pg_depend dep on dep.refobjid = a.attrelid and dep.refobjsubid = a.attnum and dep.deptype = 'a'
    join pg_catalog.pg_class seq on seq.oid = dep.objid and seq.relkind = 'S'
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    a.attnum > 0 and
    not a.attisdropped and
    n.nspname = $1::text and
    a.atttypid in ('int2'::regtype, 'int4'::regtype, 'int8'::regtype) and
    pg_catalog.pg_get_expr(ad.adbin, ad.adrelid) like 'nextval(%' and
    not exists (
        select 1 from pg_catalog.pg_constraint pk
        where pk.conrelid = c.oid and pk.contype = 'p' and a.attnum = any(pk.conkey)
    )
order by table_name, column_name"#;

const PRIMARY_KEYS_WITH_SERIAL_TYPES: &str = r#"
select
    c.oid::regclass::text as table_name,
    a.attname as column_name,
    a.attnotnull as column_not_null,
    case a.atttypid
        when 'int2'::regtype then 'smallserial'
        when 'int4'::regtype then 'serial'
        else 'bigserial'
    end as column_type,
    seq.oid::regclass::text as sequence_name
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    join pg_catalog.pg_constraint pk on pk.conrelid = c.oid and pk.contype = 'p'
    join pg_catalog.pg_attribute a on a.attrelid = c.oid and a.attnum = any(pk.conkey)
    join pg_catalog.pg_attrdef ad on ad.adrelid = a.attrelid and ad.adnum = a.attnum
    join pg_catalog.pg_depend dep on dep.refobjid = a.attrelid and dep.refobjsubid = a.attnum and dep.deptype = 'a'
    join pg_catalog.pg_class seq on seq.oid = dep.objid and seq.relkind = 'S'
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    n.nspname = $1::text and
    a.atttypid in ('int2'::regtype, 'int4'::regtype, 'int8'::regtype) and
    pg_catalog.pg_get_expr(ad.adbin, ad.adrelid) like 'nextval(%'
order by table_name, column_name"#;

const COLUMNS_NOT_FOLLOWING_NAMING_CONVENTION: &str = r#"
select
    c.oid::regclass::text as table_name,
    a.attname as column_name,
    a.attnotnull as column_not_null
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    join pg_catalog.pg_attribute a on a.attrelid = c.oid
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    a.attnum > 0 and
    not a.attisdropped and
    n.nspname = $1::text and
    pg_catalog.quote_ident(a.attname) <> a.attname
order by table_name, column_name"#;

const COLUMNS_WITH_FIXED_LENGTH_VARCHAR: &str = r#"
select
    c.oid::regclass::text as table_name,
    a.attname as column_name,
    a.attnotnull as column_not_null
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    join pg_catalog.pg_attribute a on a.attrelid = c.oid
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    a.attnum > 0 and
    not a.attisdropped and
    n.nspname = $1::text and
    a.atttypid = 'varchar'::regtype and
    a.atttypmod > 0
order by table_name, column_name"#;

const COLUMNS_WITH_MONEY_TYPE: &str = r#"
select
    c.oid::regclass::text as table_name,
    a.attname as column_name,
    a.attnotnull as column_not_null
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    join pg_catalog.pg_attribute a on a.attrelid = c.oid
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    a.attnum > 0 and
    not a.attisdropped and
    n.nspname = $1::text and
    a.atttypid = 'money'::regtype
order by table_name, column_name"#;

const COLUMNS_WITH_TIMESTAMP_OR_TIMETZ_TYPE: &str = r#"
select
    c.oid::regclass::text as table_name,
    a.attname as column_name,
    a.attnotnull as column_not_null
from pg_catalog.pg_class c
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    join pg_catalog.pg_attribute a on a.attrelid = c.oid
where
    c.relkind in ('r', 'p') and
    not c.relispartition and
    a.attnum > 0 and
    not a.attisdropped and
    n.nspname = $1::text and
    a.atttypid in ('timestamp'::regtype, 'timetz'::regtype)
order by table_name, column_name"#;

// Primary keys

const PRIMARY_KEYS_WITH_VARCHAR: &str = r#"
select
    c.oid::regclass::text as table_name,
    i.indexrelid::regclass::text as index_name,
    pg_catalog.pg_relation_size(i.indexrelid) as index_size,
    (
        select json_agg(json_build_object('column_name', a.attname, 'not_null', a.attnotnull) order by k.pos)
        from unnest(i.indkey::smallint[]) with ordinality k(attnum, pos)
            join pg_catalog.pg_attribute a on a.attrelid = i.indrelid and a.attnum = k.attnum
    ) as columns
from pg_catalog.pg_index i
    join pg_catalog.pg_class c on c.oid = i.indrelid
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
where
    i.indisprimary and
    n.nspname = $1::text and
    exists (
        select 1 from pg_catalog.pg_attribute a
        where
            a.attrelid = i.indrelid and
            a.attnum = any(i.indkey::smallint[]) and
            a.atttypid in ('varchar'::regtype, 'text'::regtype, 'bpchar'::regtype)
    )
order by table_name, index_name"#;

const PRIMARY_KEYS_THAT_MOST_LIKELY_NATURAL_KEYS: &str = r#"
select
    c.oid::regclass::text as table_name,
    i.indexrelid::regclass::text as index_name,
    pg_catalog.pg_relation_size(i.indexrelid) as index_size,
    (
        select json_agg(json_build_object('column_name', a.attname, 'not_null', a.attnotnull) order by k.pos)
        from unnest(i.indkey::smallint[]) with ordinality k(attnum, pos)
            join pg_catalog.pg_attribute a on a.attrelid = i.indrelid and a.attnum = k.attnum
    ) as columns
from pg_catalog.pg_index i
    join pg_catalog.pg_class c on c.oid = i.indrelid
    join pg_catalog.pg_namespace n on n.oid = c.relnamespace
where
    i.indisprimary and
    n.nspname = $1::text and
    exists (
        select 1 from pg_catalog.pg_attribute a
        where
            a.attrelid = i.indrelid and
            a.attnum = any(i.indkey::smallint[]) and
            not a.atthasdef and
            a.attidentity = '' and
            a.atttypid not in ('int2'::regtype, 'int4'::regtype, 'int8'::regtype, 'uuid'::regtype)
    )
order by table_name, index_name"#;

// Constraints and foreign keys

const NOT_VALID_CONSTRAINTS: &str = r#"
select
    c.conrelid::regclass::text as table_name,
    c.conname as constraint_name,
    c.contype as constraint_type
from pg_catalog.pg_constraint c
    join pg_catalog.pg_namespace n on n.oid = c.connamespace
where
    not c.convalidated and
    c.contype in ('c', 'f') and
    n.nspname = $1::text
order by table_name, constraint_name"#;

const DUPLICATED_FOREIGN_KEYS: &str = r#"
select
    a.conrelid::regclass::text as table_name,
    json_build_array(
        json_build_object('constraint_name', a.conname, 'columns', (
            select json_agg(json_build_object('column_name', att.attname, 'not_null', att.attnotnull) order by u.pos)
            from unnest(a.conkey) with ordinality u(attnum, pos)
                join pg_catalog.pg_attribute att on att.attrelid = a.conrelid and att.attnum = u.attnum
        )),
        json_build_object('constraint_name', b.conname, 'columns', (
            select json_agg(json_build_object('column_name', att.attname, 'not_null', att.attnotnull) order by u.pos)
            from unnest(b.conkey) with ordinality u(attnum, pos)
                join pg_catalog.pg_attribute att on att.attrelid = b.conrelid and att.attnum = u.attnum
        ))
    ) as foreign_keys
from pg_catalog.pg_constraint a
    join pg_catalog.pg_constraint b on
        b.conrelid = a.conrelid and
        b.confrelid = a.confrelid and
        b.conkey = a.conkey and
        b.confkey = a.confkey and
        b.oid > a.oid
    join pg_catalog.pg_namespace n on n.oid = a.connamespace
where
    a.contype = 'f' and
    b.contype = 'f' and
    n.nspname = $1::text
order by table_name, a.conname, b.conname"#;

const INTERSECTED_FOREIGN_KEYS: &str = r#"
select
    a.conrelid::regclass::text as table_name,
    json_build_array(
        json_build_object('constraint_name', a.conname, 'columns', (
            select json_agg(json_build_object('column_name', att.attname, 'not_null', att.attnotnull) order by u.pos)
            from unnest(a.conkey) with ordinality u(attnum, pos)
                join pg_catalog.pg_attribute att on att.attrelid = a.conrelid and att.attnum = u.attnum
        )),
        json_build_object('constraint_name', b.conname, 'columns', (
            select json_agg(json_build_object('column_name', att.attname, 'not_null', att.attnotnull) order by u.pos)
            from unnest(b.conkey) with ordinality u(attnum, pos)
                join pg_catalog.pg_attribute att on att.attrelid = b.conrelid and att.attnum = u.attnum
        ))
    ) as foreign_keys
from pg_catalog.pg_constraint a
    join pg_catalog.pg_constraint b on
        b.conrelid = a.conrelid and
        b.confrelid = a.confrelid and
        b.conkey && a.conkey and
        b.conkey <> a.conkey and
        b.oid > a.oid
    join pg_catalog.pg_namespace n on n.oid = a.connamespace
where
    a.contype = 'f' and
    b.contype = 'f' and
    n.nspname = $1::text
order by table_name, a.conname, b.conname"#;

const FOREIGN_KEYS_WITH_UNMATCHED_COLUMN_TYPE: &str = r#"
select
    c.conrelid::regclass::text as table_name,
    c.conname as constraint_name,
    (
        select json_agg(json_build_object('column_name', a.attname, 'not_null', a.attnotnull) order by u.pos)
        from unnest(c.conkey) with ordinality u(attnum, pos)
            join pg_catalog.pg_attribute a on a.attrelid = c.conrelid and a.attnum = u.attnum
    ) as columns
from pg_catalog.pg_constraint c
    join pg_catalog.pg_namespace n on n.oid = c.connamespace
where
    c.contype = 'f' and
    n.nspname = $1::text and
    exists (
        select 1
        from unnest(c.conkey, c.confkey) as pair(attnum, ref_attnum)
            join pg_catalog.pg_attribute a on a.attrelid = c.conrelid and a.attnum = pair.attnum
            join pg_catalog.pg_attribute r on r.attrelid = c.confrelid and r.attnum = pair.ref_attnum
        where a.atttypid <> r.atttypid or a.atttypmod <> r.atttypmod
    )
order by table_name, constraint_name"#;

// Functions, sequences and naming

const FUNCTIONS_WITHOUT_DESCRIPTION: &str = r#"
select
    p.oid::regproc::text as function_name,
    pg_catalog.pg_get_function_identity_arguments(p.oid) as function_signature
from pg_catalog.pg_proc p
    join pg_catalog.pg_namespace n on n.oid = p.pronamespace
where
    n.nspname = $1::text and
    coalesce(trim(pg_catalog.obj_description(p.oid, 'pg_proc')), '') = '' and
    not exists (
        select 1 from pg_catalog.pg_depend d where d.objid = p.oid and d.deptype = 'e'
    )
order by function_name, function_signature"#;

const SEQUENCE_OVERFLOW: &str = r#"
select * from (
    select
        (pg_catalog.quote_ident(s.schemaname) || '.' || pg_catalog.quote_ident(s.sequencename))::regclass::text as sequence_name,
        s.data_type::text as data_type,
        round(
            100.0 * (
                case when s.increment_by > 0
                    then s.max_value::numeric - coalesce(s.last_value, s.start_value)
                    else coalesce(s.last_value, s.start_value)::numeric - s.min_value
                end
            ) / (s.max_value::numeric - s.min_value::numeric), 2
        ) as remaining_percentage
    from pg_catalog.pg_sequences s
    where
        s.schemaname = $1::text and
        not s.cycle
) sequences
where remaining_percentage < $2::float8
order by sequence_name"#;

const POSSIBLE_OBJECT_NAME_OVERFLOW: &str = r#"
select object_name, object_type
from (
    select
        c.oid::regclass::text as object_name,
        case c.relkind
            when 'r' then 'table'
            when 'p' then 'partitioned table'
            when 'i' then 'index'
            when 'I' then 'partitioned index'
            when 'S' then 'sequence'
            when 'v' then 'view'
            when 'm' then 'materialized view'
        end as object_type,
        c.relname::text as raw_name
    from pg_catalog.pg_class c
        join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    where n.nspname = $1::text and c.relkind in ('r', 'p', 'i', 'I', 'S', 'v', 'm')
    union all
    select
        p.oid::regproc::text,
        case p.prokind when 'p' then 'procedure' else 'function' end,
        p.proname::text
    from pg_catalog.pg_proc p
        join pg_catalog.pg_namespace n on n.oid = p.pronamespace
    where n.nspname = $1::text
    union all
    select con.conname::text, 'constraint', con.conname::text
    from pg_catalog.pg_constraint con
        join pg_catalog.pg_namespace n on n.oid = con.connamespace
    where n.nspname = $1::text
) objects
where octet_length(objects.raw_name) >= current_setting('max_identifier_length')::integer
order by object_type, object_name"#;

const OBJECTS_NOT_FOLLOWING_NAMING_CONVENTION: &str = r#"
select object_name, object_type
from (
    select
        c.oid::regclass::text as object_name,
        case c.relkind
            when 'r' then 'table'
            when 'p' then 'partitioned table'
            when 'i' then 'index'
            when 'I' then 'partitioned index'
            when 'S' then 'sequence'
            when 'v' then 'view'
            when 'm' then 'materialized view'
        end as object_type,
        c.relname::text as raw_name
    from pg_catalog.pg_class c
        join pg_catalog.pg_namespace n on n.oid = c.relnamespace
    where n.nspname = $1::text and c.relkind in ('r', 'p', 'i', 'I', 'S', 'v', 'm')
    union all
    select
        p.oid::regproc::text,
        case p.prokind when 'p' then 'procedure' else 'function' end,
        p.proname::text
    from pg_catalog.pg_proc p
        join pg_catalog.pg_namespace n on n.oid = p.pronamespace
    where n.nspname = $1::text
    union all
    select con.conname::text, 'constraint', con.conname::text
    from pg_catalog.pg_constraint con
        join pg_catalog.pg_namespace n on n.oid = con.connamespace
    where n.nspname = $1::text
) objects
where pg_catalog.quote_ident(objects.raw_name) <> objects.raw_name
order by object_type, object_name"#;
