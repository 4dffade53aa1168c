use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::nable_client::NableClient;
use crate::utils::tool_errors::unrouted_tool_error;
use serde_json::{Map, Value};
use std::sync::Arc;

const OPTION_TOOLS: &[&str] = &["nable_get_options"];

#[derive(Clone)]
pub struct OptionsManager {
    logger: Logger,
    client: Arc<NableClient>,
}

impl OptionsManager {
    pub fn new(logger: Logger, client: Arc<NableClient>) -> Self {
        Self {
            logger: logger.child("options"),
            client,
        }
    }

    pub async fn handle_action(
        &self,
        tool: &str,
        args: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        if tool != "nable_get_options" {
            return Err(unrouted_tool_error("options", tool, OPTION_TOOLS));
        }
        // the endpoint takes the comma-separated list under a singular key
        let mut query = Map::new();
        if let Some(keys) = args.get("keys").filter(|v| !v.is_null()) {
            query.insert("key".to_string(), keys.clone());
        }
        Ok(self
            .client
            .get("/options", Some(&query))
            .await?
            .into_value())
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for OptionsManager {
    fn tools(&self) -> &'static [&'static str] {
        OPTION_TOOLS
    }

    async fn handle(&self, tool: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        self.logger
            .debug("handle_action", Some(&Value::String(tool.to_string())));
        self.handle_action(tool, args).await
    }
}
