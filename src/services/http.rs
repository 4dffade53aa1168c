use crate::constants::http::{ACCEPT_JSON, FORM_CONTENT_TYPE};
use crate::errors::ToolError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};

/// One outgoing HTTP exchange, already resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            query: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.form = pairs;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Network seam under the authenticated client. Implementations return a
/// response for every HTTP status and fail only when no response arrives.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ToolError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ToolError> {
        let client = Client::builder()
            .user_agent(concat!("nable-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ToolError> {
        let mut req = self
            .client
            .request(request.method, &request.url)
            .header(ACCEPT, ACCEPT_JSON);
        if let Some(token) = &request.bearer {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if !request.form.is_empty() {
            let encoded = serde_urlencoded::to_string(&request.form)
                .map_err(|err| ToolError::invalid_params(format!("Unencodable form: {}", err)))?;
            req = req.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(encoded);
        }

        let response = req.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(HttpResponse { status, body })
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        return ToolError::timeout(format!("HTTP request timed out: {}", err));
    }
    ToolError::transport(err.to_string())
}
