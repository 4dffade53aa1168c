use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::nable_client::NableClient;
use crate::utils::params::{path_segment, present_str};
use crate::utils::tool_errors::unrouted_tool_error;
use serde_json::{Map, Value};
use std::sync::Arc;

const FINANCE_TOOLS: &[&str] = &["nable_get_patient_finances"];

pub const FINANCE_SECTIONS: &[&str] = &["balances", "quotes", "receipts"];

#[derive(Clone)]
pub struct FinanceManager {
    logger: Logger,
    client: Arc<NableClient>,
}

impl FinanceManager {
    pub fn new(logger: Logger, client: Arc<NableClient>) -> Self {
        Self {
            logger: logger.child("finances"),
            client,
        }
    }

    pub async fn handle_action(
        &self,
        tool: &str,
        args: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        if tool != "nable_get_patient_finances" {
            return Err(unrouted_tool_error("finances", tool, FINANCE_TOOLS));
        }
        let patient_id = path_segment(&args, "patient_id")?;

        match present_str(&args, "type").unwrap_or("all") {
            "all" => {
                let mut out = Map::new();
                for section in FINANCE_SECTIONS {
                    let envelope = self
                        .client
                        .get(&format!("/patients/{}/{}", patient_id, section), None)
                        .await?;
                    out.insert((*section).to_string(), envelope.into_value());
                }
                Ok(Value::Object(out))
            }
            _ => {
                let section = path_segment(&args, "type")?;
                Ok(self
                    .client
                    .get(&format!("/patients/{}/{}", patient_id, section), None)
                    .await?
                    .into_value())
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for FinanceManager {
    fn tools(&self) -> &'static [&'static str] {
        FINANCE_TOOLS
    }

    async fn handle(&self, tool: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        self.logger
            .debug("handle_action", Some(&Value::String(tool.to_string())));
        self.handle_action(tool, args).await
    }
}
