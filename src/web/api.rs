//! JSON handlers for the dashboard endpoints.
//!
//! Each handler acts on the live shell and answers with the resulting
//! dashboard state, so the page can redraw from a single response.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::activity;
use crate::config;
use crate::monitor::ConnectionState;
use crate::runtime::Runtime;
use crate::shell::{Shell, ShellSnapshot, Tab};
use crate::views::chat::SendOutcome;
use crate::views::memory::MemoryView;

// ---------------------------------------------------------------------------
// Request and response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TabRequest {
    tab: Tab,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

#[derive(Deserialize)]
struct ViewRequest {
    view: MemoryView,
}

#[derive(Serialize)]
struct StateResponse {
    api_url: String,
    #[serde(flatten)]
    state: ShellSnapshot,
}

/// Answer to an action: whether the shell took it, and the state after.
#[derive(Serialize)]
struct ActionResponse {
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    state: ShellSnapshot,
}

impl ActionResponse {
    fn new(shell: &Shell, accepted: bool, reason: Option<&'static str>) -> Self {
        Self {
            accepted,
            reason,
            state: shell.snapshot(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    api_url: String,
    connection: ConnectionState,
    connection_label: &'static str,
    config_exists: bool,
    log_exists: bool,
}

fn to_value<T: Serialize>(data: &T) -> Result<Value> {
    serde_json::to_value(data).context("failed to serialize JSON response")
}

fn parse<'a, T: Deserialize<'a>>(body: &'a str, what: &str) -> Result<T> {
    serde_json::from_str(body).with_context(|| format!("invalid JSON in {what} request"))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/state`: the whole dashboard.
pub fn get_state(shell: &Shell, api_url: &str) -> Result<Value> {
    to_value(&StateResponse {
        api_url: api_url.to_string(),
        state: shell.snapshot(),
    })
}

/// `GET /api/health`: backend connection and local file status.
pub fn get_health(shell: &Shell, api_url: &str) -> Result<Value> {
    let connection = shell.connection();
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let log_exists = activity::default_log_path()
        .map(|p| p.exists())
        .unwrap_or(false);

    to_value(&HealthResponse {
        api_url: api_url.to_string(),
        connection,
        connection_label: connection.label(),
        config_exists,
        log_exists,
    })
}

/// `POST /api/tab` with `{"tab": "memory"}`.
pub fn post_tab(shell: &mut Shell, rt: &mut dyn Runtime, body: &str) -> Result<Value> {
    let req: TabRequest = parse(body, "tab")?;
    let changed = shell.select(req.tab, rt);
    let reason = (!changed).then_some("already active");
    to_value(&ActionResponse::new(shell, changed, reason))
}

/// `POST /api/chat` with `{"message": "..."}`.
pub fn post_chat(shell: &mut Shell, rt: &mut dyn Runtime, body: &str) -> Result<Value> {
    let req: ChatRequest = parse(body, "chat")?;
    let (accepted, reason) = match shell.send_chat(&req.message, rt) {
        Some(SendOutcome::Dispatched) => (true, None),
        Some(SendOutcome::Empty) => (false, Some("empty message")),
        Some(SendOutcome::Busy) => (false, Some("a message is already being sent")),
        None => (false, Some("chat tab is not active")),
    };
    to_value(&ActionResponse::new(shell, accepted, reason))
}

/// `POST /api/memory/search` with `{"query": "..."}`.
pub fn post_memory_search(shell: &mut Shell, rt: &mut dyn Runtime, body: &str) -> Result<Value> {
    let req: SearchRequest = parse(body, "search")?;
    let accepted = shell.search_memory(&req.query, rt);
    let reason = (!accepted).then_some("empty query or memory tab not active");
    to_value(&ActionResponse::new(shell, accepted, reason))
}

/// `POST /api/memory/view` with `{"view": "search" | "episodes"}`.
pub fn post_memory_view(shell: &mut Shell, body: &str) -> Result<Value> {
    let req: ViewRequest = parse(body, "view")?;
    let changed = shell.set_memory_view(req.view);
    to_value(&ActionResponse::new(shell, changed, None))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
