use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::nable_client::NableClient;
use crate::utils::params::path_segment;
use crate::utils::tool_errors::unrouted_tool_error;
use serde_json::{Map, Value};
use std::sync::Arc;

const MESSAGE_TOOLS: &[&str] = &["nable_get_patient_messages", "nable_send_message"];

#[derive(Clone)]
pub struct MessageManager {
    logger: Logger,
    client: Arc<NableClient>,
}

impl MessageManager {
    pub fn new(logger: Logger, client: Arc<NableClient>) -> Self {
        Self {
            logger: logger.child("messages"),
            client,
        }
    }

    pub async fn handle_action(
        &self,
        tool: &str,
        mut args: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let patient_id = match tool {
            "nable_get_patient_messages" | "nable_send_message" => {
                path_segment(&args, "patient_id")?
            }
            _ => return Err(unrouted_tool_error("messages", tool, MESSAGE_TOOLS)),
        };
        let path = format!("/patients/{}/messages", patient_id);

        let result = if tool == "nable_send_message" {
            args.remove("patient_id");
            self.client.post(&path, Some(&args)).await?
        } else {
            self.client.get(&path, None).await?
        };
        Ok(result.into_value())
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for MessageManager {
    fn tools(&self) -> &'static [&'static str] {
        MESSAGE_TOOLS
    }

    async fn handle(&self, tool: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        self.logger
            .debug("handle_action", Some(&Value::String(tool.to_string())));
        self.handle_action(tool, args).await
    }
}
