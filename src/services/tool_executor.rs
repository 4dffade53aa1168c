use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ToolError;
use crate::services::logger::Logger;

/// A family of tools served by one handler. `tool` is the name the call was
/// routed under.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn tools(&self) -> &'static [&'static str];

    async fn handle(&self, tool: &str, args: Map<String, Value>) -> Result<Value, ToolError>;
}

/// Routes a tool call to its registered handler.
#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    /// Registers every tool each handler declares.
    pub fn from_handlers(logger: Logger, handlers: Vec<Arc<dyn ToolHandler>>) -> Self {
        let mut map: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for handler in handlers {
            for tool in handler.tools() {
                map.insert((*tool).to_string(), handler.clone());
            }
        }
        Self::new(logger, map)
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Unknown tools are reported as data so the host sees an ordinary tool
    /// result. Only authentication, transport and argument errors escape.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let Some(handler) = self.handlers.get(name) else {
            self.logger
                .warn("Unknown tool", Some(&serde_json::json!({ "tool": name })));
            return Ok(serde_json::json!({ "error": format!("Unknown tool: {}", name) }));
        };

        let args = match args {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::invalid_params(format!(
                    "arguments: expected object, got {}",
                    value_type_name(&other)
                )))
            }
        };

        let call_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().timestamp_millis();
        self.logger.debug(
            "Tool call started",
            Some(&serde_json::json!({ "tool": name, "call_id": call_id })),
        );

        let result = handler.handle(name, args).await;
        let duration_ms = chrono::Utc::now().timestamp_millis() - started_at;
        match &result {
            Ok(_) => self.logger.debug(
                "Tool call finished",
                Some(&serde_json::json!({
                    "tool": name,
                    "call_id": call_id,
                    "duration_ms": duration_ms,
                })),
            ),
            Err(err) => self.logger.warn(
                "Tool call failed",
                Some(&serde_json::json!({
                    "tool": name,
                    "call_id": call_id,
                    "duration_ms": duration_ms,
                    "kind": err.kind,
                    "code": err.code,
                })),
            ),
        }
        result
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
