use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::model::{DbObject, ObjectKey};

/// How per-host result lists of a cluster-wide diagnostic become one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// A finding reported by any host is kept.
    Union,
    /// A finding is kept only when every host reports it.
    Intersection,
}

impl MergeStrategy {
    /// Merges one list per host, in topology order. The output is sorted by natural key
    /// and has no duplicates, whatever the host order was.
    pub fn merge(self, per_host: Vec<Vec<DbObject>>) -> Vec<DbObject> {
        match self {
            MergeStrategy::Union => union(per_host),
            MergeStrategy::Intersection => intersection(per_host),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::Union => "union",
            MergeStrategy::Intersection => "intersection",
        }
    }
}

fn union(per_host: Vec<Vec<DbObject>>) -> Vec<DbObject> {
    per_host
        .into_iter()
        .flatten()
        .unique_by(DbObject::key)
        .sorted()
        .collect()
}

fn intersection(per_host: Vec<Vec<DbObject>>) -> Vec<DbObject> {
    let mut hosts = per_host.into_iter();
    let Some(first) = hosts.next() else {
        return Vec::new();
    };

    // The first host's objects are the ones returned, so their counters win.
    hosts
        .fold(first, |common, next| {
            let keys: HashSet<ObjectKey> = next.iter().map(DbObject::key).collect();
            common
                .into_iter()
                .filter(|object| keys.contains(&object.key()))
                .collect()
        })
        .into_iter()
        .unique_by(DbObject::key)
        .sorted()
        .collect()
}
