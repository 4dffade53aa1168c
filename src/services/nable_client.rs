use crate::constants::{auth, http};
use crate::errors::ToolError;
use crate::services::config::NableConfig;
use crate::services::http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::services::logger::Logger;
use crate::utils::params::to_pairs;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Source of "now" as unix seconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: i64,
}

impl SessionToken {
    pub fn is_fresh(&self, now: i64) -> bool {
        now < self.expires_at.saturating_sub(auth::TOKEN_SAFETY_MARGIN_SECS)
    }
}

/// Uniform shape of every remote call result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiEnvelope {
    pub status_code: u16,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiEnvelope {
    pub fn from_response(response: HttpResponse) -> Self {
        let data = if response.body.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(&response.body)
                    .unwrap_or(Value::String(response.body)),
            )
        };
        Self {
            status_code: response.status,
            success: http::SUCCESS_STATUSES.contains(&response.status),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResult {
    Response(ApiEnvelope),
    UnsupportedMethod { error: String },
}

impl ApiResult {
    pub fn envelope(&self) -> Option<&ApiEnvelope> {
        match self {
            ApiResult::Response(envelope) => Some(envelope),
            ApiResult::UnsupportedMethod { .. } => None,
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Client for the nAble REST API. Holds the bearer token and refreshes it
/// transparently before it gets within the safety margin of expiry.
pub struct NableClient {
    logger: Logger,
    config: NableConfig,
    transport: Arc<dyn HttpTransport>,
    session: Mutex<Option<SessionToken>>,
    clock: Clock,
}

impl NableClient {
    pub fn new(logger: Logger, config: NableConfig) -> Result<Self, ToolError> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Ok(Self::with_transport(logger, config, transport))
    }

    pub fn with_transport(
        logger: Logger,
        config: NableConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            logger: logger.child("client"),
            config,
            transport,
            session: Mutex::new(None),
            clock: Arc::new(|| chrono::Utc::now().timestamp()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &NableConfig {
        &self.config
    }

    pub async fn session(&self) -> Option<SessionToken> {
        self.session.lock().await.clone()
    }

    /// Returns a usable token, issuing a new one when none is held or the
    /// held one is inside the safety margin. The lock is held across the
    /// refresh so concurrent callers share a single `/tokens` call.
    pub async fn ensure_token(&self) -> Result<String, ToolError> {
        let mut guard = self.session.lock().await;
        let now = (self.clock)();
        if let Some(session) = guard.as_ref() {
            if session.is_fresh(now) {
                return Ok(session.token.clone());
            }
            self.logger.debug(
                "Token inside expiry margin, refreshing",
                Some(&serde_json::json!({ "expires_at": session.expires_at, "now": now })),
            );
        }

        let session = self.issue_token().await?;
        let token = session.token.clone();
        *guard = Some(session);
        Ok(token)
    }

    async fn issue_token(&self) -> Result<SessionToken, ToolError> {
        let url = format!("{}{}", self.config.base_url, auth::TOKEN_PATH);
        let request = HttpRequest::new(Method::POST, url).form(vec![
            ("username".to_string(), self.config.username.clone()),
            ("password".to_string(), self.config.password.clone()),
        ]);
        let response = self.transport.send(request).await?;

        if !auth::TOKEN_SUCCESS_STATUSES.contains(&response.status) {
            self.logger.error(
                "Token request rejected",
                Some(&serde_json::json!({
                    "status": response.status,
                    "environment": self.config.environment.as_str(),
                })),
            );
            return Err(ToolError::authentication(response.status, response.body));
        }

        let payload: Value = serde_json::from_str(&response.body).map_err(|_| {
            ToolError::authentication(response.status, response.body.clone())
                .with_hint("Token response was not valid JSON")
        })?;
        let token = payload
            .get("token")
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ToolError::authentication(response.status, response.body.clone())
                    .with_hint("Token response did not contain a token")
            })?
            .to_string();
        let expires_at = read_expiry(&payload);

        self.logger.info(
            "Issued API token",
            Some(&serde_json::json!({
                "environment": self.config.environment.as_str(),
                "expires_at": expires_at,
            })),
        );
        Ok(SessionToken { token, expires_at })
    }

    /// Performs an authenticated call. Every HTTP status yields an envelope;
    /// only authentication and transport failures are errors.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<&Map<String, Value>>,
        form: Option<&Map<String, Value>>,
    ) -> Result<ApiResult, ToolError> {
        let token = self.ensure_token().await?;
        let url = format!("{}{}", self.config.base_url, path);

        let request = if method == Method::GET {
            HttpRequest::new(Method::GET, url).query(query.map(to_pairs).unwrap_or_default())
        } else if method == Method::POST {
            HttpRequest::new(Method::POST, url).form(form.map(to_pairs).unwrap_or_default())
        } else {
            return Ok(ApiResult::UnsupportedMethod {
                error: format!("Unknown method: {}", method),
            });
        };

        let started = std::time::Instant::now();
        let response = self.transport.send(request.bearer(token)).await?;
        self.logger.debug(
            "API call finished",
            Some(&serde_json::json!({
                "method": method.as_str(),
                "path": path,
                "status": response.status,
                "duration_ms": started.elapsed().as_millis() as u64,
            })),
        );
        Ok(ApiResult::Response(ApiEnvelope::from_response(response)))
    }

    pub async fn get(
        &self,
        path: &str,
        query: Option<&Map<String, Value>>,
    ) -> Result<ApiResult, ToolError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        form: Option<&Map<String, Value>>,
    ) -> Result<ApiResult, ToolError> {
        self.request(Method::POST, path, None, form).await
    }
}

/// First non-zero expiry among the accepted field names. Absent means 0,
/// which makes the next call refresh.
fn read_expiry(payload: &Value) -> i64 {
    auth::EXPIRY_FIELDS
        .iter()
        .filter_map(|field| payload.get(*field).and_then(parse_timestamp))
        .find(|ts| *ts != 0)
        .unwrap_or(0)
}

fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(num) => num.as_i64().or_else(|| num.as_f64().map(|f| f as i64)),
        Value::String(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}
