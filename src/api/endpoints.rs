//! Typed calls for each backend endpoint.
//!
//! A 2xx body that does not match the expected shape is reported as the
//! same [`RequestFailed`] as a transport error.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::types::{
    ChatReply, ChatRequest, Episode, EpisodesEnvelope, MemoriesEnvelope, MemoryQuery,
    MemoryRecord, NamedSkill, Pattern, PatternsEnvelope, ServiceInfo, SkillsEnvelope,
    StatsSnapshot, ToolDescriptor, ToolsEnvelope,
};
use super::{ApiResult, Backend, RequestFailed};

pub const HEALTH: &str = "/health";
pub const INFO: &str = "/";
pub const CHAT: &str = "/chat";
pub const MEMORY_QUERY: &str = "/memory/query";
pub const MEMORY_EPISODES: &str = "/memory/episodes";
pub const MEMORY_STATS: &str = "/memory/stats";
pub const MEMORY_CLEAR: &str = "/memory/clear";
pub const LEARNING_PATTERNS: &str = "/learning/patterns";
pub const LEARNING_SKILLS: &str = "/learning/skills";
pub const TOOLS: &str = "/tools";

fn decode<T: DeserializeOwned>(method: &'static str, path: &str, value: Value) -> ApiResult<T> {
    serde_json::from_value(value)
        .map_err(|e| RequestFailed::new(method, path, format!("unexpected response shape: {e}")))
}

/// `GET /health`: any 2xx means the backend is reachable.
pub fn health(backend: &dyn Backend) -> ApiResult<()> {
    backend.check(HEALTH)
}

/// `GET /`: service name, version and capabilities.
pub fn info(backend: &dyn Backend) -> ApiResult<ServiceInfo> {
    decode("GET", INFO, backend.get(INFO)?)
}

/// `POST /chat {message}`.
pub fn chat(backend: &dyn Backend, message: &str) -> ApiResult<ChatReply> {
    let body = json!(ChatRequest { message });
    decode("POST", CHAT, backend.post(CHAT, &body)?)
}

/// `POST /memory/query {query, n_results}`.
pub fn query_memory(
    backend: &dyn Backend,
    query: &str,
    n_results: u32,
) -> ApiResult<Vec<MemoryRecord>> {
    let body = json!(MemoryQuery { query, n_results });
    let envelope: MemoriesEnvelope = decode("POST", MEMORY_QUERY, backend.post(MEMORY_QUERY, &body)?)?;
    Ok(envelope.memories)
}

/// `GET /memory/episodes?n=N`, most recent first as ordered by the backend.
pub fn recent_episodes(backend: &dyn Backend, n: u32) -> ApiResult<Vec<Episode>> {
    let path = format!("{MEMORY_EPISODES}?n={n}");
    let envelope: EpisodesEnvelope = decode("GET", &path, backend.get(&path)?)?;
    Ok(envelope.episodes)
}

/// `GET /memory/stats`.
pub fn memory_stats(backend: &dyn Backend) -> ApiResult<StatsSnapshot> {
    decode("GET", MEMORY_STATS, backend.get(MEMORY_STATS)?)
}

/// `GET /learning/patterns`.
pub fn patterns(backend: &dyn Backend) -> ApiResult<Vec<Pattern>> {
    let envelope: PatternsEnvelope =
        decode("GET", LEARNING_PATTERNS, backend.get(LEARNING_PATTERNS)?)?;
    Ok(envelope.patterns)
}

/// `GET /learning/skills`, flattened into name/skill pairs.
pub fn skills(backend: &dyn Backend) -> ApiResult<Vec<NamedSkill>> {
    let envelope: SkillsEnvelope = decode("GET", LEARNING_SKILLS, backend.get(LEARNING_SKILLS)?)?;
    envelope.into_named().map_err(|e| {
        RequestFailed::new("GET", LEARNING_SKILLS, format!("unexpected response shape: {e}"))
    })
}

/// `GET /tools`.
pub fn tools(backend: &dyn Backend) -> ApiResult<Vec<ToolDescriptor>> {
    let envelope: ToolsEnvelope = decode("GET", TOOLS, backend.get(TOOLS)?)?;
    Ok(envelope.tools)
}

/// `DELETE /memory/clear`. Returns the backend's confirmation message.
pub fn clear_memory(backend: &dyn Backend) -> ApiResult<String> {
    let value = backend.delete(MEMORY_CLEAR)?;
    Ok(value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("memories cleared")
        .to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
