//! A canned agent backend on an ephemeral local port.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{Value, json};
use tiny_http::{Header, Response, Server};

use nexus_dash::config::schema::ApiConfig;

pub struct FakeAgent {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl FakeAgent {
    /// Serve `routes` (keyed by `"METHOD /path"`, query string stripped).
    /// Unknown routes answer 500.
    pub fn start(routes: HashMap<String, Value>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&hits);

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let path = request.url().split('?').next().unwrap_or("").to_string();
                let key = format!("{} {}", request.method(), path);
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                seen.lock().unwrap().push(key.clone());

                let response = match routes.get(&key) {
                    Some(value) => Response::from_string(value.to_string())
                        .with_header(
                            Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                                .unwrap(),
                        ),
                    None => Response::from_string("boom").with_status_code(500),
                };
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            hits,
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            timeout_ms: 5000,
        }
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

/// Routes for a healthy backend with a little of everything.
pub fn healthy_routes() -> HashMap<String, Value> {
    let mut routes = HashMap::new();
    routes.insert("GET /health".into(), json!({"status": "healthy"}));
    routes.insert(
        "GET /".into(),
        json!({
            "name": "Nexus AGI",
            "version": "1.0.0",
            "status": "running",
            "capabilities": ["chat", "memory"]
        }),
    );
    routes.insert(
        "POST /chat".into(),
        json!({
            "response": "Hello from the agent",
            "timestamp": "2026-03-01T10:00:00",
            "tool_results": [{"tool": "calculator", "result": 4}],
            "pattern_detected": "greeting",
            "memories_used": 2
        }),
    );
    routes.insert(
        "POST /memory/query".into(),
        json!({"memories": [
            {"content": "rust is fast", "distance": 0.25, "metadata": {"timestamp": "2026-02-01T09:00:00"}}
        ]}),
    );
    routes.insert(
        "GET /memory/episodes".into(),
        json!({"episodes": [
            {"user_message": "hi", "agent_response": "hello", "tools_used": [], "timestamp": "2026-02-01T09:00:00"}
        ]}),
    );
    routes.insert(
        "GET /memory/stats".into(),
        json!({
            "vector_memories": 12,
            "episodes": 3,
            "learning_stats": {
                "total_patterns": 2,
                "total_skills": 1,
                "avg_skill_level": 4.5,
                "top_skills": [["coding", {"level": 4.5, "uses": 7, "success_rate": 0.9}]]
            }
        }),
    );
    routes.insert(
        "GET /learning/patterns".into(),
        json!({"patterns": [{"keywords": ["rust", "async"], "frequency": 3, "last_seen": "2026-02-01T09:00:00"}]}),
    );
    routes.insert(
        "GET /learning/skills".into(),
        json!({"skills": {"coding": {"level": 8.2, "uses": 7, "success_rate": 0.9}}}),
    );
    routes.insert(
        "GET /tools".into(),
        json!({"tools": [{
            "name": "web_search",
            "description": "Search the web",
            "input_schema": {"properties": {"query": {"type": "string"}}}
        }]}),
    );
    routes.insert("DELETE /memory/clear".into(), json!({"message": "All memories cleared"}));
    routes
}
