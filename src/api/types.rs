//! Wire types for the backend endpoints.
//!
//! Optional or loosely typed fields (`tool_results`, `tools_used`, schema
//! `properties`, memory `metadata`) default to empty values here, so the
//! view layer never has to check for absence.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Request body for `POST /chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// One tool invocation reported with an assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool: String,
    /// Everything else the backend attached (parameters, result, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub timestamp: String,
    #[serde(default)]
    pub tool_results: Vec<ToolResult>,
    #[serde(default)]
    pub pattern_detected: Option<String>,
    #[serde(default)]
    pub memories_used: Option<u32>,
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// Request body for `POST /memory/query`.
#[derive(Debug, Serialize)]
pub struct MemoryQuery<'a> {
    pub query: &'a str,
    pub n_results: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A vector-memory hit. `distance` is cosine-style, pre-normalized by the
/// backend to `[0, 2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub content: String,
    pub distance: f64,
    #[serde(default)]
    pub metadata: MemoryMetadata,
}

impl MemoryRecord {
    /// `1 - distance`. Not clamped: an out-of-range distance shows through.
    pub fn similarity(&self) -> f64 {
        1.0 - self.distance
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemoriesEnvelope {
    pub memories: Vec<MemoryRecord>,
}

/// One recorded user/agent turn from the backend history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub user_message: String,
    pub agent_response: String,
    #[serde(default)]
    pub tools_used: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpisodesEnvelope {
    pub episodes: Vec<Episode>,
}

// ---------------------------------------------------------------------------
// Learning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub keywords: Vec<String>,
    pub frequency: u64,
    pub last_seen: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatternsEnvelope {
    pub patterns: Vec<Pattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub level: f64,
    pub uses: u64,
    pub success_rate: f64,
}

/// A skill with its map key, in backend order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSkill {
    pub name: String,
    #[serde(flatten)]
    pub skill: Skill,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SkillsEnvelope {
    pub skills: Map<String, Value>,
}

impl SkillsEnvelope {
    /// Flatten the name-keyed map, keeping the backend's key order.
    pub fn into_named(self) -> Result<Vec<NamedSkill>, serde_json::Error> {
        self.skills
            .into_iter()
            .map(|(name, value)| {
                Ok(NamedSkill {
                    name,
                    skill: serde_json::from_value(value)?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    #[serde(default)]
    pub total_patterns: u64,
    #[serde(default)]
    pub total_skills: u64,
    #[serde(default)]
    pub avg_skill_level: f64,
    /// `[name, skill]` pairs, best first.
    #[serde(default)]
    pub top_skills: Vec<(String, Skill)>,
}

/// Response body of `GET /memory/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub vector_memories: u64,
    pub episodes: u64,
    pub learning_stats: LearningStats,
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_schema: InputSchema,
}

/// A declared tool parameter as shown in the Tools view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ToolDescriptor {
    /// Declared parameters in schema order. The schema itself is not
    /// validated; a property without a string `type` reads as `any`.
    pub fn parameters(&self) -> Vec<ToolParameter> {
        self.input_schema
            .properties
            .iter()
            .map(|(name, spec)| ToolParameter {
                name: name.clone(),
                kind: spec
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("any")
                    .to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolsEnvelope {
    pub tools: Vec<ToolDescriptor>,
}

// ---------------------------------------------------------------------------
// Service info
// ---------------------------------------------------------------------------

/// Response body of `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn chat_reply_defaults_optional_fields() {
        let reply: ChatReply =
            serde_json::from_value(json!({"response": "pong", "timestamp": "2025-01-01T00:00:00"}))
                .unwrap();
        assert!(reply.tool_results.is_empty());
        assert_eq!(reply.pattern_detected, None);
        assert_eq!(reply.memories_used, None);
    }

    #[test]
    fn tool_result_keeps_opaque_fields() {
        let result: ToolResult = serde_json::from_value(
            json!({"tool": "calculate", "parameters": {"expression": "2+2"}, "result": 4}),
        )
        .unwrap();
        assert_eq!(result.tool, "calculate");
        assert_eq!(result.extra["result"], 4);
    }

    #[test]
    fn similarity_is_one_minus_distance() {
        let record: MemoryRecord = serde_json::from_value(
            json!({"content": "x", "distance": 0.3, "metadata": {"timestamp": "t", "type": "conversation"}}),
        )
        .unwrap();
        assert!((record.similarity() - 0.7).abs() < 1e-9);
        assert_eq!(record.metadata.timestamp.as_deref(), Some("t"));
        assert_eq!(record.metadata.extra["type"], "conversation");
    }

    #[test]
    fn similarity_is_not_clamped() {
        let record = MemoryRecord {
            content: String::new(),
            distance: 1.5,
            metadata: MemoryMetadata::default(),
        };
        assert!(record.similarity() < 0.0);
    }

    #[test]
    fn episode_without_tools_defaults_empty() {
        let ep: Episode = serde_json::from_value(json!({
            "user_message": "hi", "agent_response": "hello", "timestamp": "t"
        }))
        .unwrap();
        assert!(ep.tools_used.is_empty());
    }

    #[test]
    fn skills_keep_backend_order() {
        let envelope: SkillsEnvelope = serde_json::from_value(json!({"skills": {
            "zeta": {"level": 2, "uses": 1, "success_rate": 1.0},
            "alpha": {"level": 9, "uses": 40, "success_rate": 0.95}
        }}))
        .unwrap();
        let named = envelope.into_named().unwrap();
        assert_eq!(named[0].name, "zeta");
        assert_eq!(named[1].name, "alpha");
        assert_eq!(named[1].skill.level, 9.0);
    }

    #[test]
    fn stats_top_skills_decode_from_pairs() {
        let stats: StatsSnapshot = serde_json::from_value(json!({
            "vector_memories": 12,
            "episodes": 4,
            "learning_stats": {
                "total_patterns": 3,
                "total_skills": 2,
                "avg_skill_level": 4.5,
                "top_skills": [["search", {"level": 6, "uses": 10, "success_rate": 0.9}]]
            }
        }))
        .unwrap();
        assert_eq!(stats.learning_stats.top_skills[0].0, "search");
        assert_eq!(stats.learning_stats.top_skills[0].1.uses, 10);
    }

    #[test]
    fn tool_parameters_follow_schema_order() {
        let tool: ToolDescriptor = serde_json::from_value(json!({
            "name": "read_file",
            "description": "Read a file",
            "input_schema": {"type": "object", "properties": {
                "path": {"type": "string"},
                "limit": {"type": "integer"},
                "options": {}
            }}
        }))
        .unwrap();
        let params = tool.parameters();
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "path");
        assert_eq!(params[1].kind, "integer");
        assert_eq!(params[2].kind, "any");
    }

    #[test]
    fn tool_without_schema_has_no_parameters() {
        let tool: ToolDescriptor = serde_json::from_value(json!({"name": "noop"})).unwrap();
        assert!(tool.parameters().is_empty());
    }
}
