//! Scripted in-memory backend for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{ApiResult, Backend, RequestFailed};

#[derive(Default)]
pub(crate) struct FakeBackend {
    routes: HashMap<String, Result<Value, String>>,
    log: Mutex<Vec<(String, Option<Value>)>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, method: &str, path: &str, body: Value) -> Self {
        self.routes.insert(format!("{method} {path}"), Ok(body));
        self
    }

    pub(crate) fn failing(mut self, method: &str, path: &str) -> Self {
        self.routes
            .insert(format!("{method} {path}"), Err("HTTP 500".to_string()));
        self
    }

    /// Every call made so far as `"METHOD path"`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    /// Request bodies posted to `path`.
    pub(crate) fn bodies(&self, path: &str) -> Vec<Value> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c.ends_with(&format!(" {path}")))
            .filter_map(|(_, b)| b.clone())
            .collect()
    }

    fn respond(
        &self,
        method: &'static str,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let key = format!("{method} {path}");
        self.log.lock().unwrap().push((key.clone(), body.cloned()));
        match self.routes.get(&key) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(detail)) => Err(RequestFailed::new(method, path, detail.clone())),
            None => Err(RequestFailed::new(method, path, "connection refused")),
        }
    }
}

impl Backend for FakeBackend {
    fn get(&self, path: &str) -> ApiResult<Value> {
        self.respond("GET", path, None)
    }

    fn post(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.respond("POST", path, Some(body))
    }

    fn delete(&self, path: &str) -> ApiResult<Value> {
        self.respond("DELETE", path, None)
    }
}
