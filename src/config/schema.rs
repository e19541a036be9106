/// Configuration schema and defaults for the dashboard.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[polling]`, `[memory]`, `[web]` and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level nexus-dash configuration.
///
/// Maps directly to the `~/.nexus-dash/config.toml` and `.nexus-dash.toml`
/// file schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub memory: MemoryConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Backend agent service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is resolved against.
    pub base_url: String,
    /// Per-request timeout in milliseconds. `0` keeps the transport default.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 0,
        }
    }
}

impl ApiConfig {
    /// The configured timeout, or `None` when the transport default applies.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

// ---------------------------------------------------------------------------
// [polling]
// ---------------------------------------------------------------------------

/// Poll intervals for the views that refresh on a timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Learning view refresh interval (patterns + skills).
    pub learning_interval_ms: u64,
    /// Stats side panel refresh interval.
    pub stats_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            learning_interval_ms: 5000,
            stats_interval_ms: 5000,
        }
    }
}

impl PollingConfig {
    pub fn learning_interval(&self) -> Duration {
        Duration::from_millis(self.learning_interval_ms.max(1))
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms.max(1))
    }
}

// ---------------------------------------------------------------------------
// [memory]
// ---------------------------------------------------------------------------

/// Memory view request sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// `n_results` sent with every vector search.
    pub search_results: u32,
    /// Number of recent episodes requested on mount.
    pub episode_count: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            search_results: 10,
            episode_count: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Embedded browser dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Address the local dashboard server binds to.
    pub bind: String,
    /// Open the system browser when the server starts.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether request outcomes are appended to the activity log.
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Default TOML
// ---------------------------------------------------------------------------

impl DashConfig {
    /// Annotated default config written by `nexus-dash config init`.
    pub fn default_toml() -> String {
        r#"# nexus-dash Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. --api-url flag
#   2. Environment variables (NEXUS_API_URL, NEXUS_DASH_*)
#   3. Project config (.nexus-dash.toml in current directory)
#   4. User global config (~/.nexus-dash/config.toml)
#   5. Built-in defaults

[api]
base_url = "http://localhost:8000"
timeout_ms = 0                        # 0 = HTTP transport default

[polling]
learning_interval_ms = 5000
stats_interval_ms = 5000

[memory]
search_results = 10
episode_count = 20

[web]
bind = "127.0.0.1:9747"
open_browser = true

[logging]
enabled = true                        # ~/.nexus-dash/activity.jsonl
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
