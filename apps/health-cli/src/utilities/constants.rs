pub const CLI_NAME: &str = "pg-health";
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CLI_USER_DIRECTORY: &str = ".pg-health";
pub const CLI_CONFIG_FILE: &str = "config.toml";

/// Environment variables with this prefix override the config file, `__` separating
/// nesting levels: `PG_HEALTH_POSTGRES__PRIMARY_URL`.
pub const ENV_PREFIX: &str = "PG_HEALTH";
pub const ENV_SEPARATOR: &str = "__";
