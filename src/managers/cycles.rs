use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::nable_client::NableClient;
use crate::utils::params::{path_segment, present_str, split_list};
use crate::utils::tool_errors::unrouted_tool_error;
use serde_json::{Map, Value};
use std::sync::Arc;

const CYCLE_TOOLS: &[&str] = &["nable_get_patient_cycles", "nable_get_cycle_details"];

/// Sub-resources of a cycle, in the order they are fetched.
pub const CYCLE_SECTIONS: &[&str] = &["embryology", "medications", "ultrasounds"];
pub const DEFAULT_CYCLE_SECTION: &str = "embryology";

#[derive(Clone)]
pub struct CycleManager {
    logger: Logger,
    client: Arc<NableClient>,
}

impl CycleManager {
    pub fn new(logger: Logger, client: Arc<NableClient>) -> Self {
        Self {
            logger: logger.child("cycles"),
            client,
        }
    }

    pub async fn handle_action(
        &self,
        tool: &str,
        args: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        match tool {
            "nable_get_patient_cycles" => {
                let patient_id = path_segment(&args, "patient_id")?;
                Ok(self
                    .client
                    .get(&format!("/patients/{}/cycles", patient_id), None)
                    .await?
                    .into_value())
            }
            "nable_get_cycle_details" => self.cycle_details(&args).await,
            _ => Err(unrouted_tool_error("cycles", tool, CYCLE_TOOLS)),
        }
    }

    async fn cycle_details(&self, args: &Map<String, Value>) -> Result<Value, ToolError> {
        let patient_id = path_segment(args, "patient_id")?;
        let cycle_id = path_segment(args, "cycle_id")?;
        let base = format!("/patients/{}/cycles/{}", patient_id, cycle_id);

        let mut out = Map::new();
        out.insert(
            "cycle".to_string(),
            self.client.get(&base, None).await?.into_value(),
        );
        for section in requested_sections(present_str(args, "include")) {
            let envelope = self
                .client
                .get(&format!("{}/{}", base, section), None)
                .await?;
            out.insert(section.to_string(), envelope.into_value());
        }
        Ok(Value::Object(out))
    }
}

/// Known sections named in `include`, in fetch order. Nothing named at all
/// means embryology only; unknown names are ignored.
pub fn requested_sections(include: Option<&str>) -> Vec<&'static str> {
    let named = include.map(split_list).unwrap_or_default();
    if named.is_empty() {
        return vec![DEFAULT_CYCLE_SECTION];
    }
    CYCLE_SECTIONS
        .iter()
        .copied()
        .filter(|section| named.iter().any(|n| n.as_str() == *section))
        .collect()
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for CycleManager {
    fn tools(&self) -> &'static [&'static str] {
        CYCLE_TOOLS
    }

    async fn handle(&self, tool: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        self.logger
            .debug("handle_action", Some(&Value::String(tool.to_string())));
        self.handle_action(tool, args).await
    }
}
