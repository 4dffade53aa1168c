use crate::app::App;
use crate::constants::server::{PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::catalog::{list_tools, validate_tool_args};
use crate::mcp::protocol::{text_content, JsonRpcRequest, JsonRpcResponse};
use crate::services::logger::Logger;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

pub struct McpServer {
    app: Arc<App>,
    logger: Logger,
}

impl McpServer {
    pub fn new(app: App) -> Self {
        let logger = app.logger.child("server");
        Self {
            app: Arc::new(app),
            logger,
        }
    }

    async fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    async fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": list_tools() })
    }

    /// Runs one tool call. Errors raised while executing the tool become a
    /// textual `{"error": ...}` result so the host always gets a tool result.
    async fn handle_tools_call(&self, name: &str, raw_args: Value) -> Result<Value, McpError> {
        let args = if raw_args.is_null() {
            Value::Object(Default::default())
        } else {
            raw_args
        };
        validate_tool_args(name, &args)?;

        let text = match self.app.tool_executor.execute(name, args).await {
            Ok(result) => serde_json::to_string_pretty(&result)
                .map_err(|err| McpError::new(ErrorCode::InternalError, err.to_string()))?,
            Err(err) => {
                self.logger.error(
                    "Tool call raised",
                    Some(&serde_json::json!({
                        "tool": name,
                        "code": err.code,
                        "details": err.details,
                    })),
                );
                error_payload(&err)
            }
        };
        Ok(text_content(text))
    }

    /// Answers one line of input. `None` means no response is due
    /// (notifications).
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let parsed: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError.as_i32(),
                    "Parse error".to_string(),
                ))
            }
        };
        let request: JsonRpcRequest = match serde_json::from_value(parsed) {
            Ok(req) => req,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::InvalidRequest.as_i32(),
                    "Invalid request".to_string(),
                ))
            }
        };

        let id = match request.id.clone() {
            Some(id) => id,
            None => return None,
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.handle_initialize().await),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.handle_tools_list().await),
            "tools/call" => {
                let params = request.params.as_object().cloned().unwrap_or_default();
                let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
                if name.is_empty() {
                    JsonRpcResponse::failure(
                        id,
                        ErrorCode::InvalidParams.as_i32(),
                        "Missing tool name".to_string(),
                    )
                } else {
                    let args = params.get("arguments").cloned().unwrap_or(Value::Null);
                    match self.handle_tools_call(name, args).await {
                        Ok(result) => JsonRpcResponse::success(id, result),
                        Err(err) => JsonRpcResponse::failure(id, err.code.as_i32(), err.message),
                    }
                }
            }
            _ => JsonRpcResponse::failure(
                id,
                ErrorCode::MethodNotFound.as_i32(),
                "Method not found".to_string(),
            ),
        };
        Some(response)
    }

    /// Serves newline-delimited JSON-RPC until the reader closes.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ToolError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut writer = BufWriter::new(writer);

        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(trimmed).await {
                let payload = serde_json::to_string(&response)
                    .map_err(|err| ToolError::internal(err.to_string()))?;
                writer.write_all(payload.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        self.logger.info(
            "Serving MCP on stdio",
            Some(&serde_json::json!({
                "environment": self.app.client.config().environment.as_str(),
            })),
        );
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

fn error_payload(err: &ToolError) -> String {
    serde_json::json!({ "error": err.message }).to_string()
}

pub async fn run_stdio() -> Result<(), ToolError> {
    let app = App::initialize()?;
    McpServer::new(app).run_stdio().await
}
