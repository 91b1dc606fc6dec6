use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY_URL: &str = "postgres://postgres@localhost:5432/postgres";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostgresConfig {
    #[serde(default = "default_primary_url")]
    pub primary_url: String,
    #[serde(default)]
    pub replica_urls: Vec<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Per-host query deadline. No deadline when absent.
    #[serde(default)]
    pub query_timeout_secs: Option<u64>,
    /// Ask every host whether it is in recovery instead of trusting `primary_url`.
    #[serde(default)]
    pub discover_primary: bool,
}

fn default_primary_url() -> String {
    DEFAULT_PRIMARY_URL.to_string()
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            replica_urls: Vec::new(),
            max_connections: default_max_connections(),
            query_timeout_secs: None,
            discover_primary: false,
        }
    }
}

impl PostgresConfig {
    /// Primary first, then replicas in configuration order, without repeats.
    pub fn all_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::with_capacity(1 + self.replica_urls.len());
        for url in std::iter::once(&self.primary_url).chain(&self.replica_urls) {
            let url = url.trim();
            if !url.is_empty() && !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}
