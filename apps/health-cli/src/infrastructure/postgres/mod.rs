//! PostgreSQL collaborators of the check engine: connections, topology, the query
//! catalog and the row mapper.

pub mod client;
pub mod config;
pub mod connection;
pub mod errors;
pub mod mapper;
pub mod queries;
pub mod topology;
