/// Configuration system for nexus-dash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::DashConfig::default()`]
/// 2. **User global config**: `~/.nexus-dash/config.toml`
/// 3. **Project local config**: `.nexus-dash.toml` in the current directory
/// 4. **Environment variables**: `NEXUS_API_URL` / `NEXUS_DASH_*`
///
/// Later layers override earlier ones. Missing sections in a TOML file fall
/// back to built-in defaults. The `--api-url` CLI flag is applied on top by
/// the binary.
///
/// The resolved [`schema::ApiConfig`] is handed to
/// [`ApiClient::new`](crate::api::ApiClient::new); nothing reads the backend
/// URL from a global.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::DashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> DashConfig {
    let mut config = DashConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Read one config layer.
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A broken file never stops the dashboard starting.
fn load_toml_file(path: Option<PathBuf>) -> Option<DashConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Directory holding the global config and the activity log.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".nexus-dash"))
}

fn global_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".nexus-dash.toml"))
}

/// `~/.nexus-dash/config.toml`, whether or not it exists.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// `.nexus-dash.toml` in the working directory.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence file layer).
///
/// Supported variables:
/// - `NEXUS_API_URL`: backend base URL
/// - `NEXT_PUBLIC_API_URL`: accepted when `NEXUS_API_URL` is unset
/// - `NEXUS_DASH_TIMEOUT_MS`: request timeout
/// - `NEXUS_DASH_POLL_MS`: both poll intervals
/// - `NEXUS_DASH_LOGGING`: activity log on/off
fn apply_env_overrides(config: &mut DashConfig, lookup: impl Fn(&str) -> Option<String>) {
    let url = lookup("NEXUS_API_URL")
        .filter(|v| !v.is_empty())
        .or_else(|| lookup("NEXT_PUBLIC_API_URL").filter(|v| !v.is_empty()));
    if let Some(url) = url {
        config.api.base_url = url;
    }

    if let Some(val) = lookup("NEXUS_DASH_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }

    if let Some(val) = lookup("NEXUS_DASH_POLL_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.polling.learning_interval_ms = ms;
        config.polling.stats_interval_ms = ms;
    }

    if let Some(val) = lookup("NEXUS_DASH_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.nexus-dash/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.nexus-dash/ directory")?;
    }

    fs::write(&path, DashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Write `key = value` into the global config file. The value is coerced to
/// the type already stored under `key`; a missing file starts from the
/// defaults so that type is known.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DashConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Assign through a dotted path such as `api.base_url`.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("config key '{key}' cannot be set from the command line"),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Overwrite the global config with the annotated defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The merged config, serialized back to TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
