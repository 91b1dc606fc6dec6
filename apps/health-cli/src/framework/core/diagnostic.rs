use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::merge::MergeStrategy;
use super::model::ResultType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Staticness {
    /// Depends only on schema metadata.
    Static,
    /// Depends on cumulative statistics counters.
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionTopology {
    OnPrimary,
    AcrossCluster,
}

/// Descriptor of one anti-pattern detector. Identity is the name.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Diagnostic {
    name: &'static str,
    result_type: ResultType,
    staticness: Staticness,
    topology: ExecutionTopology,
    merge_strategy: Option<MergeStrategy>,
}

impl Diagnostic {
    pub const fn new(
        name: &'static str,
        result_type: ResultType,
        staticness: Staticness,
        topology: ExecutionTopology,
    ) -> Self {
        Self {
            name,
            result_type,
            staticness,
            topology,
            merge_strategy: None,
        }
    }

    pub const fn on_primary(
        name: &'static str,
        result_type: ResultType,
        staticness: Staticness,
    ) -> Self {
        Self::new(name, result_type, staticness, ExecutionTopology::OnPrimary)
    }

    /// A runtime diagnostic executed on every host and merged with `merge_strategy`.
    pub const fn across_cluster(
        name: &'static str,
        result_type: ResultType,
        merge_strategy: MergeStrategy,
    ) -> Self {
        Self::new(
            name,
            result_type,
            Staticness::Runtime,
            ExecutionTopology::AcrossCluster,
        )
        .with_merge_strategy(merge_strategy)
    }

    pub const fn with_merge_strategy(mut self, merge_strategy: MergeStrategy) -> Self {
        self.merge_strategy = Some(merge_strategy);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    pub fn staticness(&self) -> Staticness {
        self.staticness
    }

    pub fn topology(&self) -> ExecutionTopology {
        self.topology
    }

    pub fn merge_strategy(&self) -> Option<MergeStrategy> {
        self.merge_strategy
    }

    pub fn is_static(&self) -> bool {
        self.staticness == Staticness::Static
    }

    pub fn is_runtime(&self) -> bool {
        self.staticness == Staticness::Runtime
    }

    pub fn is_across_cluster(&self) -> bool {
        self.topology == ExecutionTopology::AcrossCluster
    }
}

impl PartialEq for Diagnostic {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Diagnostic {}

impl Hash for Diagnostic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
