use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    Authentication,
    Transport,
    Timeout,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    /// Token issuance was rejected. Carries the remote status and body text.
    pub fn authentication(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(
            ToolErrorKind::Authentication,
            "AUTHENTICATION_FAILED",
            format!("Authentication failed: {} {}", status, body),
        )
        .with_details(serde_json::json!({ "status": status, "body": body }))
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Transport, "TRANSPORT", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }

    pub fn is_authentication(&self) -> bool {
        self.kind == ToolErrorKind::Authentication
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ToolErrorKind::Transport | ToolErrorKind::Timeout)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}
