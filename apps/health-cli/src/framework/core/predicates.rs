//! Exclusion predicates applied to the rows of a diagnostic before they are returned.
//!
//! A predicate answers "should this object be dropped from the results". Predicates
//! compose with [`ExclusionPredicate::and`] and [`ExclusionPredicate::or`] and are
//! cheap to clone, so one predicate can be shared by every host of a cluster run.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::context::{validate_percentage, PgContext};
use super::errors::CheckError;
use super::model::DbObject;

type CustomRule = Arc<dyn Fn(&DbObject) -> bool + Send + Sync>;

#[derive(Clone, Default)]
enum Rule {
    #[default]
    Nothing,
    Names(HashSet<String>),
    TableNames(HashSet<String>),
    IndexNames(HashSet<String>),
    SequenceNames(HashSet<String>),
    SizeAbove(u64),
    SizeBelow(u64),
    BloatUnder {
        size_in_bytes: u64,
        percentage: f64,
    },
    Custom(CustomRule),
    And(Box<Rule>, Box<Rule>),
    Or(Box<Rule>, Box<Rule>),
}

impl Rule {
    fn excludes(&self, object: &DbObject) -> bool {
        match self {
            Rule::Nothing => false,
            Rule::Names(names) => names.contains(&object.name().to_lowercase()),
            Rule::TableNames(names) => object
                .table_name()
                .is_some_and(|table| names.contains(&table.to_lowercase())),
            Rule::IndexNames(names) => object
                .index_names()
                .iter()
                .any(|index| names.contains(&index.to_lowercase())),
            Rule::SequenceNames(names) => object
                .sequence_name()
                .is_some_and(|sequence| names.contains(&sequence.to_lowercase())),
            Rule::SizeAbove(threshold) => object.size_in_bytes().is_some_and(|s| s > *threshold),
            Rule::SizeBelow(threshold) => object.size_in_bytes().is_some_and(|s| s < *threshold),
            Rule::BloatUnder {
                size_in_bytes,
                percentage,
            } => object.bloat().is_some_and(|bloat| {
                bloat.bloat_size_in_bytes < *size_in_bytes || bloat.bloat_percentage < *percentage
            }),
            Rule::Custom(rule) => rule(object),
            Rule::And(left, right) => left.excludes(object) && right.excludes(object),
            Rule::Or(left, right) => left.excludes(object) || right.excludes(object),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Nothing => write!(f, "Nothing"),
            Rule::Names(names) => f.debug_tuple("Names").field(names).finish(),
            Rule::TableNames(names) => f.debug_tuple("TableNames").field(names).finish(),
            Rule::IndexNames(names) => f.debug_tuple("IndexNames").field(names).finish(),
            Rule::SequenceNames(names) => f.debug_tuple("SequenceNames").field(names).finish(),
            Rule::SizeAbove(size) => f.debug_tuple("SizeAbove").field(size).finish(),
            Rule::SizeBelow(size) => f.debug_tuple("SizeBelow").field(size).finish(),
            Rule::BloatUnder {
                size_in_bytes,
                percentage,
            } => f
                .debug_struct("BloatUnder")
                .field("size_in_bytes", size_in_bytes)
                .field("percentage", percentage)
                .finish(),
            Rule::Custom(_) => write!(f, "Custom(..)"),
            Rule::And(left, right) => f.debug_tuple("And").field(left).field(right).finish(),
            Rule::Or(left, right) => f.debug_tuple("Or").field(left).field(right).finish(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExclusionPredicate {
    rule: Rule,
}

impl ExclusionPredicate {
    /// Excludes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Excludes objects whose own name is in the set, compared case-insensitively.
    pub fn by_name<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_names(names, None, Rule::Names)
    }

    /// Excludes objects that belong to one of the given tables. Bare names are
    /// qualified with the context schema first.
    pub fn by_table_name<I, S>(ctx: &PgContext, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_names(names, Some(ctx), Rule::TableNames)
    }

    /// Excludes objects that are, or contain, one of the given indexes.
    pub fn by_index_name<I, S>(ctx: &PgContext, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_names(names, Some(ctx), Rule::IndexNames)
    }

    pub fn by_sequence_name<I, S>(ctx: &PgContext, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_names(names, Some(ctx), Rule::SequenceNames)
    }

    /// Excludes sized objects strictly larger than `size_in_bytes`.
    pub fn by_size_above(size_in_bytes: u64) -> Self {
        Self {
            rule: Rule::SizeAbove(size_in_bytes),
        }
    }

    /// Excludes sized objects strictly smaller than `size_in_bytes`. Zero excludes nothing.
    pub fn by_size_below(size_in_bytes: u64) -> Self {
        if size_in_bytes == 0 {
            return Self::none();
        }
        Self {
            rule: Rule::SizeBelow(size_in_bytes),
        }
    }

    /// Excludes bloated objects whose bloat is under either threshold. Two zero
    /// thresholds exclude nothing.
    pub fn by_bloat_under(size_in_bytes: u64, percentage: f64) -> Result<Self, CheckError> {
        let percentage = validate_percentage("bloat_percentage_threshold", percentage)?;
        if size_in_bytes == 0 && percentage == 0.0 {
            return Ok(Self::none());
        }
        Ok(Self {
            rule: Rule::BloatUnder {
                size_in_bytes,
                percentage,
            },
        })
    }

    pub fn matching<F>(rule: F) -> Self
    where
        F: Fn(&DbObject) -> bool + Send + Sync + 'static,
    {
        Self {
            rule: Rule::Custom(Arc::new(rule)),
        }
    }

    /// Excludes an object only when both predicates exclude it.
    pub fn and(self, other: ExclusionPredicate) -> Self {
        Self {
            rule: Rule::And(Box::new(self.rule), Box::new(other.rule)),
        }
    }

    /// Excludes an object when either predicate excludes it.
    pub fn or(self, other: ExclusionPredicate) -> Self {
        match (&self.rule, &other.rule) {
            (Rule::Nothing, _) => other,
            (_, Rule::Nothing) => self,
            _ => Self {
                rule: Rule::Or(Box::new(self.rule), Box::new(other.rule)),
            },
        }
    }

    pub fn is_excluded(&self, object: &DbObject) -> bool {
        self.rule.excludes(object)
    }

    pub fn excludes_nothing(&self) -> bool {
        matches!(self.rule, Rule::Nothing)
    }

    fn from_names<I, S>(
        names: I,
        ctx: Option<&PgContext>,
        rule: fn(HashSet<String>) -> Rule,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: HashSet<String> = names
            .into_iter()
            .map(|name| match ctx {
                Some(ctx) => ctx.enrich_with_schema(name.as_ref()).to_lowercase(),
                None => name.as_ref().trim().to_lowercase(),
            })
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return Self::none();
        }
        Self { rule: rule(names) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::core::model::{Bloat, Index, Table};

    fn index(table: &str, name: &str, size: u64) -> DbObject {
        DbObject::Index(Index {
            table_name: table.to_string(),
            index_name: name.to_string(),
            index_size_in_bytes: size,
        })
    }

    fn bloated_table(name: &str, bloat_size: u64, bloat_percentage: f64) -> DbObject {
        DbObject::TableWithBloat {
            table: Table {
                table_name: name.to_string(),
                table_size_in_bytes: 1_000_000,
            },
            bloat: Bloat {
                bloat_size_in_bytes: bloat_size,
                bloat_percentage,
            },
        }
    }

    #[test]
    fn test_none_excludes_nothing() {
        let none = ExclusionPredicate::none();
        assert!(none.excludes_nothing());
        assert!(!none.is_excluded(&index("t", "i", 1)));
        assert!(ExclusionPredicate::by_name(Vec::<String>::new()).excludes_nothing());
    }

    #[test]
    fn test_by_name_is_case_insensitive() {
        let predicate = ExclusionPredicate::by_name(["Orders_Pkey"]);
        assert!(predicate.is_excluded(&index("orders", "orders_pkey", 1)));
        assert!(!predicate.is_excluded(&index("orders", "orders_idx", 1)));
    }

    #[test]
    fn test_by_table_name_uses_context_schema() {
        let ctx = PgContext::of("sales").unwrap();
        let predicate = ExclusionPredicate::by_table_name(&ctx, ["orders"]);
        assert!(predicate.is_excluded(&index("sales.orders", "sales.orders_idx", 1)));
        assert!(!predicate.is_excluded(&index("orders", "orders_idx", 1)));
    }

    #[test]
    fn test_by_name_with_quoted_mixed_case_schema() {
        let ctx = PgContext::of("\"Sales\"").unwrap();
        let tables = ExclusionPredicate::by_table_name(&ctx, ["orders"]);
        assert!(tables.is_excluded(&index("\"Sales\".orders", "\"Sales\".orders_idx", 1)));
        let indexes = ExclusionPredicate::by_index_name(&ctx, ["Orders_Idx"]);
        assert!(indexes.is_excluded(&index("\"Sales\".orders", "\"Sales\".orders_idx", 1)));
        assert!(!indexes.is_excluded(&index("\"Sales\".orders", "\"Sales\".other_idx", 1)));
    }

    #[test]
    fn test_by_index_name_matches_duplicated_members() {
        let ctx = PgContext::of_default();
        let predicate = ExclusionPredicate::by_index_name(&ctx, ["i2"]);
        let duplicated = DbObject::DuplicatedIndexes {
            table_name: "t".to_string(),
            indexes: vec![
                Index {
                    table_name: "t".to_string(),
                    index_name: "i1".to_string(),
                    index_size_in_bytes: 1,
                },
                Index {
                    table_name: "t".to_string(),
                    index_name: "i2".to_string(),
                    index_size_in_bytes: 1,
                },
            ],
        };
        assert!(predicate.is_excluded(&duplicated));
    }

    #[test]
    fn test_size_thresholds() {
        let above = ExclusionPredicate::by_size_above(100);
        assert!(above.is_excluded(&index("t", "big", 101)));
        assert!(!above.is_excluded(&index("t", "edge", 100)));

        let below = ExclusionPredicate::by_size_below(100);
        assert!(below.is_excluded(&index("t", "small", 99)));
        assert!(!below.is_excluded(&index("t", "edge", 100)));
        assert!(ExclusionPredicate::by_size_below(0).excludes_nothing());
    }

    #[test]
    fn test_bloat_under() {
        let predicate = ExclusionPredicate::by_bloat_under(1000, 20.0).unwrap();
        assert!(predicate.is_excluded(&bloated_table("small_bloat", 999, 50.0)));
        assert!(predicate.is_excluded(&bloated_table("low_percentage", 5000, 19.9)));
        assert!(!predicate.is_excluded(&bloated_table("bloated", 1000, 20.0)));
        assert!(!predicate.is_excluded(&index("t", "not_bloat_aware", 1)));

        assert!(ExclusionPredicate::by_bloat_under(0, 0.0)
            .unwrap()
            .excludes_nothing());
        assert!(ExclusionPredicate::by_bloat_under(0, 101.0).is_err());
    }

    #[test]
    fn test_composition() {
        let named = ExclusionPredicate::by_name(["i1"]);
        let large = ExclusionPredicate::by_size_above(10);

        let either = named.clone().or(large.clone());
        assert!(either.is_excluded(&index("t", "i1", 1)));
        assert!(either.is_excluded(&index("t", "i2", 11)));
        assert!(!either.is_excluded(&index("t", "i2", 1)));

        let both = named.and(large);
        assert!(both.is_excluded(&index("t", "i1", 11)));
        assert!(!both.is_excluded(&index("t", "i1", 1)));
        assert!(!both.is_excluded(&index("t", "i2", 11)));
    }

    #[test]
    fn test_or_with_none_is_identity() {
        let custom = ExclusionPredicate::matching(|o| o.name().starts_with("tmp_"));
        let combined = ExclusionPredicate::none().or(custom);
        assert!(!combined.excludes_nothing());
        assert!(combined.is_excluded(&index("t", "tmp_idx", 1)));
        assert!(format!("{combined:?}").contains("Custom(..)"));
    }
}
