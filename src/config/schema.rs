/// Configuration schema and defaults for the oxbow client.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[backend]`, `[defaults]`, and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override — typically just `backend.base_url` and
/// `backend.session_cookie`.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level oxbow configuration.
///
/// Maps directly to the `~/.oxbow/config.toml` and `.oxbow.toml` file
/// schemas. All sections and fields are optional — missing values fall back
/// to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OxbowConfig {
    pub backend: BackendConfig,
    pub defaults: DefaultsConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the routing backend, e.g. `https://api.example.com`.
    ///
    /// Injected into the API client at construction — call sites never read
    /// it from the environment themselves.
    pub base_url: String,
    /// Backend-issued session cookie value, sent as `Cookie: session_id=…`
    /// on every request. Empty means unauthenticated.
    pub session_cookie: String,
    /// Timeout for establishing a connection and for simple fetches.
    pub connect_timeout_ms: u64,
    /// Idle timeout for an open query stream. A stream that produces no
    /// frame for this long is treated as a transport failure and closed.
    pub stream_idle_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            session_cookie: String::new(),
            connect_timeout_ms: 10_000,
            stream_idle_timeout_ms: 120_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [defaults]
// ---------------------------------------------------------------------------

/// Default routing priority weights, used when a query does not set them
/// explicitly. Each weight is on the backend's 0–10 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub cost_priority: f64,
    pub accuracy_priority: f64,
    pub latency_priority: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            cost_priority: 5.0,
            accuracy_priority: 5.0,
            latency_priority: 5.0,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Local query-history logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append completed queries to `~/.oxbow/query-log.jsonl`.
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Default TOML template
// ---------------------------------------------------------------------------

impl OxbowConfig {
    /// Annotated default config file content for `oxbow config init`.
    pub fn default_toml() -> &'static str {
        r#"# oxbow configuration
# Layers (highest priority last): built-in defaults, this file,
# ./.oxbow.toml, OXBOW_* environment variables.

[backend]
# Base URL of the routing backend.
base_url = "http://localhost:8000"
# Backend-issued session cookie value (sent as Cookie: session_id=...).
session_cookie = ""
# Connection / simple-fetch timeout in milliseconds.
connect_timeout_ms = 10000
# Idle timeout for an open query stream in milliseconds.
stream_idle_timeout_ms = 120000

[defaults]
# Routing priority weights on a 0-10 scale.
cost_priority = 5.0
accuracy_priority = 5.0
latency_priority = 5.0

[logging]
# Record completed queries in ~/.oxbow/query-log.jsonl.
enabled = true
"#
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
