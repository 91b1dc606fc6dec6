//! Cluster topology: which host is the primary and which hosts exist at all.
//!
//! The engine never works topology out on its own. It is handed a [`ClusterTopology`]
//! and asks it for connections.

use std::sync::Arc;

use futures::future::try_join_all;
use itertools::Itertools;
use tracing::{debug, info};

use super::client::PostgresConnection;
use super::config::PostgresConfig;
use super::connection::PgConnection;
use super::errors::ConnectionError;
use super::queries::IS_PRIMARY;

pub trait ClusterTopology: Send + Sync {
    fn connection_to_primary(&self) -> Arc<dyn PgConnection>;

    /// Every host of the cluster, primary first.
    fn connections_to_all_hosts(&self) -> Vec<Arc<dyn PgConnection>>;
}

/// A topology fixed at construction time.
#[derive(Clone)]
pub struct StaticTopology {
    primary: Arc<dyn PgConnection>,
    replicas: Vec<Arc<dyn PgConnection>>,
}

impl StaticTopology {
    pub fn new(primary: Arc<dyn PgConnection>) -> Self {
        Self::with_replicas(primary, Vec::new())
    }

    /// Replicas that share the primary's host, or each other's, are dropped.
    pub fn with_replicas(
        primary: Arc<dyn PgConnection>,
        replicas: Vec<Arc<dyn PgConnection>>,
    ) -> Self {
        let replicas = replicas
            .into_iter()
            .filter(|replica| replica.host() != primary.host())
            .unique_by(|replica| replica.host().clone())
            .collect();
        Self { primary, replicas }
    }

    /// Opens lazy pools for every configured url. Nothing is connected yet.
    pub fn from_config(config: &PostgresConfig) -> Result<Self, ConnectionError> {
        let mut connections = config
            .all_urls()
            .into_iter()
            .map(|url| {
                PostgresConnection::connect_lazy(url, config.max_connections)
                    .map(|c| Arc::new(c) as Arc<dyn PgConnection>)
            })
            .collect::<Result<Vec<_>, _>>()?;
        if connections.is_empty() {
            return Err(ConnectionError::InvalidUrl {
                url: String::new(),
                reason: "no primary url is configured".to_string(),
            });
        }
        let primary = connections.remove(0);
        Ok(Self::with_replicas(primary, connections))
    }

    /// Builds the topology from configuration, discovering the primary when asked to.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, ConnectionError> {
        let configured = Self::from_config(config)?;
        if !config.discover_primary {
            return Ok(configured);
        }
        Self::discover(configured.connections_to_all_hosts()).await
    }

    /// Asks every host whether it is in recovery and promotes the first writable one.
    pub async fn discover(
        connections: Vec<Arc<dyn PgConnection>>,
    ) -> Result<Self, ConnectionError> {
        let roles = try_join_all(connections.iter().map(|connection| async move {
            let rows = connection.query(IS_PRIMARY, &[]).await?;
            let is_primary = rows
                .first()
                .and_then(|row| row.get("is_primary"))
                .and_then(|value| value.as_bool())
                .ok_or_else(|| ConnectionError::UnexpectedResponse {
                    host: connection.host().to_string(),
                    reason: "pg_is_in_recovery() returned no boolean".to_string(),
                })?;
            debug!(host = %connection.host(), is_primary, "Checked host role");
            Ok::<bool, ConnectionError>(is_primary)
        }))
        .await?;

        let Some(position) = roles.iter().position(|is_primary| *is_primary) else {
            return Err(ConnectionError::NoPrimary {
                hosts: connections.iter().map(|c| c.host().to_string()).join(", "),
            });
        };
        let mut replicas = connections;
        let primary = replicas.remove(position);
        info!(host = %primary.host(), "Discovered primary host");
        Ok(Self::with_replicas(primary, replicas))
    }
}

impl ClusterTopology for StaticTopology {
    fn connection_to_primary(&self) -> Arc<dyn PgConnection> {
        self.primary.clone()
    }

    fn connections_to_all_hosts(&self) -> Vec<Arc<dyn PgConnection>> {
        std::iter::once(self.primary.clone())
            .chain(self.replicas.iter().cloned())
            .collect()
    }
}
