use crate::errors::ToolError;

/// A handler was routed a tool it does not serve. This is a wiring bug, not
/// a caller mistake, so it is reported as internal.
pub fn unrouted_tool_error(handler: &str, tool: &str, known_tools: &[&str]) -> ToolError {
    ToolError::internal(format!("{} handler cannot serve tool: {}", handler, tool))
        .with_hint(format!("Serves: {}.", known_tools.join(", ")))
        .with_details(serde_json::json!({
            "handler": handler,
            "tool": tool,
            "known_tools": known_tools,
        }))
}
