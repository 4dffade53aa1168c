use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::nable_client::NableClient;
use crate::utils::params::{is_present, path_segment, retain_present};
use crate::utils::tool_errors::unrouted_tool_error;
use serde_json::{Map, Value};
use std::sync::Arc;

const PATIENT_TOOLS: &[&str] = &[
    "nable_search_patient",
    "nable_get_patient",
    "nable_create_patient",
];

#[derive(Clone)]
pub struct PatientManager {
    logger: Logger,
    client: Arc<NableClient>,
}

impl PatientManager {
    pub fn new(logger: Logger, client: Arc<NableClient>) -> Self {
        Self {
            logger: logger.child("patients"),
            client,
        }
    }

    pub async fn handle_action(
        &self,
        tool: &str,
        args: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        match tool {
            "nable_search_patient" => {
                let query = search_query(&args);
                Ok(self
                    .client
                    .get("/patients/search", Some(&query))
                    .await?
                    .into_value())
            }
            "nable_get_patient" => {
                let patient_id = path_segment(&args, "patient_id")?;
                Ok(self
                    .client
                    .get(&format!("/patients/{}", patient_id), None)
                    .await?
                    .into_value())
            }
            "nable_create_patient" => Ok(self
                .client
                .post("/patients", Some(&args))
                .await?
                .into_value()),
            _ => Err(unrouted_tool_error("patients", tool, PATIENT_TOOLS)),
        }
    }
}

/// An account number identifies the patient on its own; otherwise every
/// supplied field narrows the search.
pub fn search_query(args: &Map<String, Value>) -> Map<String, Value> {
    if let Some(account) = args.get("account_number").filter(|v| is_present(v)) {
        let mut query = Map::new();
        query.insert("account_number".to_string(), account.clone());
        return query;
    }
    retain_present(args)
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for PatientManager {
    fn tools(&self) -> &'static [&'static str] {
        PATIENT_TOOLS
    }

    async fn handle(&self, tool: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        self.logger
            .debug("handle_action", Some(&Value::String(tool.to_string())));
        self.handle_action(tool, args).await
    }
}
