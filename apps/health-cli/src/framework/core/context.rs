//! Execution context shared by every check: the schema to inspect and the
//! thresholds some diagnostics are parameterized with.
//!
//! Schema names are validated against the PostgreSQL identifier grammar and folded to
//! their catalog form before they reach a query. They are always bound as a query
//! parameter, never interpolated into SQL text.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use super::errors::CheckError;

pub const DEFAULT_SCHEMA_NAME: &str = "public";
pub const DEFAULT_BLOAT_PERCENTAGE_THRESHOLD: f64 = 10.0;
pub const DEFAULT_REMAINING_PERCENTAGE_THRESHOLD: f64 = 10.0;

/// `NAMEDATALEN - 1` on a stock PostgreSQL build.
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

static UNQUOTED_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct PgContext {
    schema_name: String,
    bloat_percentage_threshold: f64,
    remaining_percentage_threshold: f64,
    query_timeout: Option<Duration>,
}

impl PgContext {
    /// Context for the given schema with default thresholds.
    pub fn of(schema_name: &str) -> Result<Self, CheckError> {
        Ok(Self {
            schema_name: validate_identifier(schema_name)?,
            ..Self::of_default()
        })
    }

    pub fn of_default() -> Self {
        Self {
            schema_name: DEFAULT_SCHEMA_NAME.to_string(),
            bloat_percentage_threshold: DEFAULT_BLOAT_PERCENTAGE_THRESHOLD,
            remaining_percentage_threshold: DEFAULT_REMAINING_PERCENTAGE_THRESHOLD,
            query_timeout: None,
        }
    }

    pub fn with_bloat_percentage_threshold(mut self, threshold: f64) -> Result<Self, CheckError> {
        self.bloat_percentage_threshold =
            validate_percentage("bloat_percentage_threshold", threshold)?;
        Ok(self)
    }

    pub fn with_remaining_percentage_threshold(
        mut self,
        threshold: f64,
    ) -> Result<Self, CheckError> {
        self.remaining_percentage_threshold =
            validate_percentage("remaining_percentage_threshold", threshold)?;
        Ok(self)
    }

    /// Upper bound for every per-host query run with this context.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn bloat_percentage_threshold(&self) -> f64 {
        self.bloat_percentage_threshold
    }

    pub fn remaining_percentage_threshold(&self) -> f64 {
        self.remaining_percentage_threshold
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }

    pub fn is_default_schema(&self) -> bool {
        self.schema_name == DEFAULT_SCHEMA_NAME
    }

    /// Qualifies a bare object name with the context schema, the way the catalog
    /// renders `oid::regclass` for objects outside the search path.
    ///
    /// Names that are already qualified, and any name in the default schema, are
    /// returned lower-cased and otherwise untouched.
    pub fn enrich_with_schema(&self, object_name: &str) -> String {
        let lowered = object_name.trim().to_lowercase();
        if self.is_default_schema() || lowered.contains('.') {
            lowered
        } else {
            format!("{}.{}", quote_if_needed(&self.schema_name), lowered)
        }
    }
}

/// Renders a catalog name the way `quote_ident` would.
fn quote_if_needed(name: &str) -> String {
    if UNQUOTED_IDENTIFIER.is_match(name) && name == name.to_lowercase() {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

impl Default for PgContext {
    fn default() -> Self {
        Self::of_default()
    }
}

/// Builds a context from an optional schema name. `None` means the default schema.
pub fn make_context(schema_name: Option<&str>) -> Result<PgContext, CheckError> {
    match schema_name {
        Some(name) => PgContext::of(name),
        None => Ok(PgContext::of_default()),
    }
}

pub fn is_valid_identifier(raw: &str) -> bool {
    validate_identifier(raw).is_ok()
}

/// Validates a schema identifier and returns the name the catalog stores for it.
///
/// Unquoted identifiers are folded to lower case. Quoted identifiers keep their case and
/// may contain any character except NUL, with `""` standing for a literal quote.
pub fn validate_identifier(raw: &str) -> Result<String, CheckError> {
    let invalid = |reason: String| CheckError::InvalidIdentifier {
        name: raw.to_string(),
        reason,
    };

    let catalog_name = if let Some(rest) = raw.strip_prefix('"') {
        let inner = rest
            .strip_suffix('"')
            .ok_or_else(|| invalid("quoted identifier is not terminated".to_string()))?;
        unescape_quoted(inner)
            .ok_or_else(|| invalid("quoted identifier contains an unescaped '\"'".to_string()))?
    } else {
        if raw.is_empty() {
            return Err(invalid("identifier cannot be empty".to_string()));
        }
        if !UNQUOTED_IDENTIFIER.is_match(raw) {
            let reason = if raw.starts_with(|c: char| c.is_ascii_digit()) {
                "identifier cannot start with a digit".to_string()
            } else {
                "unquoted identifier may only contain letters, digits, '_' and '$'".to_string()
            };
            return Err(invalid(reason));
        }
        raw.to_lowercase()
    };

    if catalog_name.is_empty() {
        return Err(invalid("identifier cannot be empty".to_string()));
    }
    if catalog_name.contains('\0') {
        return Err(invalid("identifier cannot contain NUL characters".to_string()));
    }
    if catalog_name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(invalid(format!(
            "identifier is longer than {MAX_IDENTIFIER_LENGTH} bytes"
        )));
    }
    Ok(catalog_name)
}

fn unescape_quoted(inner: &str) -> Option<String> {
    let mut unescaped = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '"' {
            // Only a doubled quote is legal inside a quoted identifier.
            if chars.next() != Some('"') {
                return None;
            }
        }
        unescaped.push(c);
    }
    Some(unescaped)
}

pub(crate) fn validate_percentage(parameter: &str, value: f64) -> Result<f64, CheckError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(CheckError::InvalidParameter(format!(
            "{parameter} should be in the range from 0.0 to 100.0 inclusive, got {value}"
        )));
    }
    Ok(value)
}
