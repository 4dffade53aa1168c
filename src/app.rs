use crate::errors::ToolError;
use crate::managers;
use crate::mcp::catalog::tool_catalog;
use crate::services::config::NableConfig;
use crate::services::logger::Logger;
use crate::services::nable_client::NableClient;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub client: Arc<NableClient>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(executor: &ToolExecutor) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !executor.has_tool(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint(
                "Every tool in tool_catalog.json must be declared by a handler.".to_string(),
            )
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    /// Resolves configuration from the process environment and wires the
    /// handlers against a live HTTP client.
    pub fn initialize() -> Result<Self, ToolError> {
        let logger = Logger::new("nable");
        let config = NableConfig::from_env(&logger)?;
        logger.info(
            "Resolved configuration",
            Some(&serde_json::json!({
                "environment": config.environment.as_str(),
                "base_url": config.base_url,
            })),
        );
        let client = Arc::new(NableClient::new(logger.clone(), config)?);
        Self::with_client(logger, client)
    }

    pub fn with_client(logger: Logger, client: Arc<NableClient>) -> Result<Self, ToolError> {
        let handlers: Vec<Arc<dyn ToolHandler>> = vec![
            Arc::new(managers::patients::PatientManager::new(
                logger.clone(),
                client.clone(),
            )),
            Arc::new(managers::appointments::AppointmentManager::new(
                logger.clone(),
                client.clone(),
            )),
            Arc::new(managers::cycles::CycleManager::new(
                logger.clone(),
                client.clone(),
            )),
            Arc::new(managers::messages::MessageManager::new(
                logger.clone(),
                client.clone(),
            )),
            Arc::new(managers::finances::FinanceManager::new(
                logger.clone(),
                client.clone(),
            )),
            Arc::new(managers::records::RecordManager::new(
                logger.clone(),
                client.clone(),
            )),
            Arc::new(managers::options::OptionsManager::new(
                logger.clone(),
                client.clone(),
            )),
        ];

        let tool_executor = ToolExecutor::from_handlers(logger.clone(), handlers);
        Self::validate_tool_wiring(&tool_executor)?;

        Ok(Self {
            logger,
            client,
            tool_executor: Arc::new(tool_executor),
        })
    }
}
