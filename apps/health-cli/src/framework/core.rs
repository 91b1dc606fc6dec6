//! The check engine. Diagnostics are plain data; one generic host executor and one
//! generic cluster coordinator run every one of them.

pub mod check_on_cluster;
pub mod check_on_host;
pub mod context;
pub mod database_checks;
pub mod diagnostic;
pub mod errors;
pub mod exclusions;
pub mod generator;
pub mod health_report;
pub mod merge;
pub mod model;
pub mod predicates;
pub mod registry;
pub mod statistics;

#[cfg(test)]
pub mod test_support;
