use serde::{Deserialize, Serialize};

use super::context::PgContext;
use super::errors::CheckError;
use super::model::PgObjectType;
use super::predicates::ExclusionPredicate;

/// Known-acceptable findings to leave out of a health report.
///
/// An object is excluded when any configured rule matches it. Zero thresholds and
/// empty name lists switch the corresponding rule off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExclusionsConfig {
    #[serde(default)]
    pub table_names: Vec<String>,
    #[serde(default)]
    pub index_names: Vec<String>,
    #[serde(default)]
    pub sequence_names: Vec<String>,
    /// Tables smaller than this many bytes are not reported.
    #[serde(default)]
    pub table_size_threshold: u64,
    /// Indexes smaller than this many bytes are not reported.
    #[serde(default)]
    pub index_size_threshold: u64,
    #[serde(default)]
    pub bloat_size_threshold: u64,
    #[serde(default)]
    pub bloat_percentage_threshold: f64,
}

impl ExclusionsConfig {
    pub fn to_predicate(&self, ctx: &PgContext) -> Result<ExclusionPredicate, CheckError> {
        let size_below = |threshold: u64, object_type: PgObjectType| {
            if threshold == 0 {
                return ExclusionPredicate::none();
            }
            ExclusionPredicate::matching(move |object| {
                object.object_type() == object_type
                    && object.size_in_bytes().is_some_and(|size| size < threshold)
            })
        };

        Ok(ExclusionPredicate::none()
            .or(ExclusionPredicate::by_table_name(ctx, &self.table_names))
            .or(ExclusionPredicate::by_index_name(ctx, &self.index_names))
            .or(ExclusionPredicate::by_sequence_name(ctx, &self.sequence_names))
            .or(size_below(self.table_size_threshold, PgObjectType::Table))
            .or(size_below(self.index_size_threshold, PgObjectType::Index))
            .or(ExclusionPredicate::by_bloat_under(
                self.bloat_size_threshold,
                self.bloat_percentage_threshold,
            )?))
    }
}
