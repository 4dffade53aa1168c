use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::nable_client::NableClient;
use crate::utils::params::{path_segment, pick};
use crate::utils::tool_errors::unrouted_tool_error;
use serde_json::{Map, Value};
use std::sync::Arc;

const APPOINTMENT_TOOLS: &[&str] = &[
    "nable_get_appointments",
    "nable_get_patient_appointments",
    "nable_get_appointment_options",
    "nable_get_available_dates",
    "nable_get_available_times",
    "nable_book_appointment",
];

/// Query fields the schedule endpoints need to resolve availability.
const SCHEDULE_KEYS: &[&str] = &["patient_id", "facility_id", "doctor_id", "appointment_type_id"];

#[derive(Clone)]
pub struct AppointmentManager {
    logger: Logger,
    client: Arc<NableClient>,
}

impl AppointmentManager {
    pub fn new(logger: Logger, client: Arc<NableClient>) -> Self {
        Self {
            logger: logger.child("appointments"),
            client,
        }
    }

    pub async fn handle_action(
        &self,
        tool: &str,
        mut args: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let result = match tool {
            "nable_get_appointments" => {
                let query = pick(&args, &["date"]);
                self.client.get("/appointments", Some(&query)).await?
            }
            "nable_get_patient_appointments" => {
                let patient_id = path_segment(&args, "patient_id")?;
                let mut query = Map::new();
                if args.get("include_past").and_then(|v| v.as_bool()) == Some(true) {
                    query.insert("past".to_string(), Value::String("true".to_string()));
                }
                self.client
                    .get(&format!("/patients/{}/appointments", patient_id), Some(&query))
                    .await?
            }
            "nable_get_appointment_options" => {
                let patient_id = path_segment(&args, "patient_id")?;
                self.client
                    .get(&format!("/patients/{}/appointments/options", patient_id), None)
                    .await?
            }
            "nable_get_available_dates" => {
                let query = pick(&args, SCHEDULE_KEYS);
                self.client
                    .get("/resources/schedules/dates", Some(&query))
                    .await?
            }
            "nable_get_available_times" => {
                let date = path_segment(&args, "date")?;
                let query = pick(&args, SCHEDULE_KEYS);
                self.client
                    .get(
                        &format!("/resources/schedules/dates/{}/times", date),
                        Some(&query),
                    )
                    .await?
            }
            "nable_book_appointment" => {
                // patient_id addresses the resource and is not part of the booking payload
                let patient_id = path_segment(&args, "patient_id")?;
                args.remove("patient_id");
                self.client
                    .post(&format!("/patients/{}/appointments", patient_id), Some(&args))
                    .await?
            }
            _ => return Err(unrouted_tool_error("appointments", tool, APPOINTMENT_TOOLS)),
        };
        Ok(result.into_value())
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for AppointmentManager {
    fn tools(&self) -> &'static [&'static str] {
        APPOINTMENT_TOOLS
    }

    async fn handle(&self, tool: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        self.logger
            .debug("handle_action", Some(&Value::String(tool.to_string())));
        self.handle_action(tool, args).await
    }
}
