//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `nexus-dash health`: backend reachability, service info, local files
//! - `nexus-dash chat|memory|learning|stats|tools`: one-shot views
//! - `nexus-dash memory clear --yes`: wipe the backend's memory
//! - `nexus-dash log`: recent activity-log entries
//! - `nexus-dash config show|init|set|reset`: configuration management
//!
//! One-shot views mount the same controllers the dashboard uses, wait for
//! their first completions, and print the resulting view model. Unlike the
//! dashboard, a failed request here is an error.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde::Serialize;

use crate::activity::{ActivityEvent, ActivityLog, Outcome};
use crate::api::{ApiClient, RequestFailed, endpoints};
use crate::config;
use crate::config::schema::DashConfig;
use crate::monitor::{ConnectionMonitor, ConnectionState};
use crate::render;
use crate::runtime::{Dispatcher, Event, MountId, RequestKind};
use crate::views::ViewController;
use crate::views::chat::{ChatController, SendOutcome};
use crate::views::learning::LearningController;
use crate::views::memory::{MemoryController, MemoryView};
use crate::views::stats::StatsController;
use crate::views::tools::ToolsController;

/// How long a one-shot command waits for the backend before giving up.
const ONE_SHOT_WAIT: Duration = Duration::from_secs(120);

/// Output format for view commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// One-shot session
// ---------------------------------------------------------------------------

/// A dispatcher plus the channel its completions arrive on.
struct Session {
    client: Arc<ApiClient>,
    dispatcher: Dispatcher,
    events: Receiver<Event>,
}

impl Session {
    fn new(config: &DashConfig) -> Self {
        let client = Arc::new(ApiClient::new(&config.api));
        let (dispatcher, events) = Dispatcher::new(client.clone());
        Self {
            client,
            dispatcher,
            events,
        }
    }
}

/// Apply the next `expected` completions addressed to `controller`.
///
/// Ticks and events for other mounts are skipped. Returns the first failure
/// after every expected completion has been applied.
fn settle(
    controller: &mut dyn ViewController,
    events: &Receiver<Event>,
    expected: usize,
) -> Result<()> {
    settle_except(controller, events, expected, None)
}

/// Like [`settle`], but a failure of the `ignored` kind is applied without
/// failing the command.
fn settle_except(
    controller: &mut dyn ViewController,
    events: &Receiver<Event>,
    mut expected: usize,
    ignored: Option<RequestKind>,
) -> Result<()> {
    let mut failure: Option<RequestFailed> = None;
    while expected > 0 {
        let event = events
            .recv_timeout(ONE_SHOT_WAIT)
            .context("timed out waiting for the backend")?;
        let Event::Completed(completion) = event else {
            continue;
        };
        if completion.mount != controller.mount_id() {
            continue;
        }
        expected -= 1;
        if let Err(e) = &completion.result
            && failure.is_none()
            && ignored != Some(completion.kind)
        {
            failure = Some(e.clone());
        }
        controller.on_completion(completion);
    }
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// nexus-dash health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthReport {
    api_url: String,
    connection: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<crate::api::types::ServiceInfo>,
    global_config: bool,
    project_config: bool,
    activity_log_entries: usize,
}

/// Check the backend and report local configuration state.
pub fn run_health(config: &DashConfig, format: OutputFormat) -> Result<()> {
    let mut session = Session::new(config);
    let mut monitor = ConnectionMonitor::mount(MountId(1), &mut session.dispatcher);
    // A failed check is the answer here, not an error.
    let _ = settle(&mut monitor, &session.events, 1);

    let service = if monitor.is_connected() {
        endpoints::info(session.client.as_ref()).ok()
    } else {
        None
    };

    let report = HealthReport {
        api_url: session.client.base_url().to_string(),
        connection: monitor.state(),
        service,
        global_config: config::global_config_file()
            .map(|p| p.exists())
            .unwrap_or(false),
        project_config: config::project_config_file()
            .map(|p| p.exists())
            .unwrap_or(false),
        activity_log_entries: ActivityLog::from_config(&config.logging).entry_count(),
    };

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            print_health_table(&report);
            Ok(())
        }
    }
}

fn print_health_table(report: &HealthReport) {
    println!("{}", "Nexus AGI Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let connected = report.connection == ConnectionState::Connected;
    print_health_item(
        "Backend",
        connected,
        &format!("{} ({})", report.api_url, report.connection.label()),
    );
    if let Some(service) = &report.service {
        print_health_item(
            "Service",
            service.status.is_empty() || service.status == "running",
            &format!("{} {} {}", service.name, service.version, service.status),
        );
        if !service.capabilities.is_empty() {
            print_health_item("Capabilities", true, &service.capabilities.join(", "));
        }
    }
    print_health_item(
        "Global config",
        report.global_config,
        if report.global_config {
            "~/.nexus-dash/config.toml found"
        } else {
            "not found (run `nexus-dash config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        report.project_config,
        if report.project_config {
            ".nexus-dash.toml found"
        } else {
            "none (optional)"
        },
    );
    print_health_item(
        "Activity log",
        report.activity_log_entries > 0,
        &format!("{} entries", report.activity_log_entries),
    );
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// nexus-dash chat
// ---------------------------------------------------------------------------

/// Send one message and print the exchange.
pub fn run_chat(config: &DashConfig, message: &str, format: OutputFormat) -> Result<()> {
    let mut session = Session::new(config);
    let mut chat = ChatController::mount(MountId(1));
    match chat.send(message, &mut session.dispatcher) {
        SendOutcome::Dispatched => {}
        SendOutcome::Empty => bail!("message is empty"),
        SendOutcome::Busy => bail!("a message is already being sent"),
    }
    settle(&mut chat, &session.events, 1)?;

    match format {
        OutputFormat::Json => print_json(&chat.transcript()),
        OutputFormat::Table => {
            print!("{}", render::chat(&chat.view_model(), usize::MAX));
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// nexus-dash memory
// ---------------------------------------------------------------------------

/// Vector search over the backend's memory.
pub fn run_memory_search(config: &DashConfig, query: &str, format: OutputFormat) -> Result<()> {
    let mut session = Session::new(config);
    let mut memory = MemoryController::mount(MountId(1), &config.memory, &mut session.dispatcher);
    if !memory.search(query, &mut session.dispatcher) {
        bail!("query is empty");
    }
    // Episodes load on mount too; only the search decides the outcome.
    settle_except(&mut memory, &session.events, 2, Some(RequestKind::Episodes))?;

    match format {
        OutputFormat::Json => print_json(&memory.memories()),
        OutputFormat::Table => {
            print!("{}", render::memory(&memory.view_model()));
            Ok(())
        }
    }
}

/// Most recent episodes, newest last as the backend returns them.
pub fn run_memory_episodes(config: &DashConfig, n: Option<u32>, format: OutputFormat) -> Result<()> {
    let mut memory_config = config.memory.clone();
    if let Some(n) = n {
        memory_config.episode_count = n;
    }

    let mut session = Session::new(config);
    let mut memory = MemoryController::mount(MountId(1), &memory_config, &mut session.dispatcher);
    memory.set_view(MemoryView::Episodes);
    settle(&mut memory, &session.events, 1)?;

    match format {
        OutputFormat::Json => print_json(&memory.episodes()),
        OutputFormat::Table => {
            print!("{}", render::memory(&memory.view_model()));
            Ok(())
        }
    }
}

/// Wipe the backend's memory. Refuses without `--yes`.
pub fn run_memory_clear(config: &DashConfig, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to clear memory without --yes");
    }
    let client = ApiClient::new(&config.api);
    let message = endpoints::clear_memory(&client)?;

    ActivityLog::from_config(&config.logging).record(&ActivityEvent::new(
        "cli",
        endpoints::MEMORY_CLEAR,
        Outcome::Ok,
        None,
    ));

    let message = if message.is_empty() {
        "Memory cleared".to_string()
    } else {
        message
    };
    println!("{} {}", "✓".green().bold(), message);
    Ok(())
}

// ---------------------------------------------------------------------------
// nexus-dash learning | stats | tools
// ---------------------------------------------------------------------------

/// Detected patterns and learned skills.
pub fn run_learning(config: &DashConfig, format: OutputFormat) -> Result<()> {
    let mut session = Session::new(config);
    let mut learning = LearningController::mount(
        MountId(1),
        config.polling.learning_interval(),
        &mut session.dispatcher,
    );
    settle(&mut learning, &session.events, 2)?;

    match format {
        OutputFormat::Json => print_json(&learning.view_model()),
        OutputFormat::Table => {
            print!("{}", render::learning(&learning.view_model()));
            Ok(())
        }
    }
}

/// Backend statistics.
pub fn run_stats(config: &DashConfig, format: OutputFormat) -> Result<()> {
    let mut session = Session::new(config);
    let mut stats = StatsController::mount(
        MountId(1),
        config.polling.stats_interval(),
        &mut session.dispatcher,
    );
    settle(&mut stats, &session.events, 1)?;

    match format {
        OutputFormat::Json => print_json(&stats.snapshot()),
        OutputFormat::Table => {
            print!("{}", render::stats(&stats.view_model()));
            Ok(())
        }
    }
}

/// Registered tools and their parameters.
pub fn run_tools(config: &DashConfig, format: OutputFormat) -> Result<()> {
    let mut session = Session::new(config);
    let mut tools = ToolsController::mount(MountId(1), &mut session.dispatcher);
    settle(&mut tools, &session.events, 1)?;

    match format {
        OutputFormat::Json => print_json(&tools.view_model()),
        OutputFormat::Table => {
            print!("{}", render::tools(&tools.view_model()));
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// nexus-dash log
// ---------------------------------------------------------------------------

/// Print the most recent activity-log entries.
pub fn run_log(config: &DashConfig, limit: usize, format: OutputFormat) -> Result<()> {
    let log = ActivityLog::from_config(&config.logging);
    let events = log.read_recent(limit);

    if format == OutputFormat::Json {
        return print_json(&events);
    }

    if events.is_empty() {
        let hint = if config.logging.enabled {
            "No activity yet. Run `nexus-dash watch` or `nexus-dash web` to record some."
        } else {
            "Activity logging is disabled (logging.enabled = false)."
        };
        println!("{}", hint.yellow());
        return Ok(());
    }

    println!("{}", "Recent Activity".bold().cyan());
    println!("{}", "=".repeat(72));
    println!(
        "  {:<19} {:<8} {:<9} {:<22} Detail",
        "Time", "Outcome", "View", "Request"
    );
    println!("  {}", "-".repeat(70));
    for event in &events {
        println!(
            "  {:<19} {} {:<9} {:<22} {}",
            crate::views::format::date_time(&event.timestamp),
            colorize_outcome(event.outcome),
            event.view,
            truncate(&event.request, 22),
            truncate(event.detail.as_deref().unwrap_or(""), 60).dimmed(),
        );
    }
    Ok(())
}

fn colorize_outcome(outcome: Outcome) -> colored::ColoredString {
    let label = format!("{:<8}", outcome.as_str());
    match outcome {
        Outcome::Ok => label.green(),
        Outcome::Failed => label.red(),
        Outcome::Stale => label.yellow(),
        Outcome::Dropped => label.dimmed(),
    }
}

// ---------------------------------------------------------------------------
// nexus-dash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective nexus-dash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.nexus-dash/config.toml");
    print_source(project_exists, ".nexus-dash.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "NEXUS_API_URL / NEXUS_DASH_* environment variables".dimmed()
    );
    println!("  {} {}", "·".dimmed(), "--api-url flag".dimmed());

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.nexus-dash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Edit the file to point the dashboard at your backend.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
