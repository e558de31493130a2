//! MCP (Model Context Protocol) server surface
//!
//! JSON-RPC 2.0 over stdio. One request per line on stdin, one response per
//! line on stdout; logging must go to stderr.

use std::io::{BufRead, BufReader, Write};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, ValetError};

/// Standard MCP methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const LIST_TOOLS: &str = "tools/list";
    pub const CALL_TOOL: &str = "tools/call";
}

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(RpcError { code, message }),
        }
    }

    pub fn from_error(id: Option<Value>, err: &ValetError) -> Self {
        Self::error(id, err.code(), err.to_string())
    }
}

/// A tool as advertised to the runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result payload of `tools/call`; the assistant text goes in a single
/// text content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<TextContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename = "text")]
pub struct TextContent {
    pub text: String,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent { text: text.into() }],
            is_error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }
}

/// What a server exposes: its tool catalog and a way to execute one.
pub trait ToolHandler: Send + Sync {
    fn server_name(&self) -> &str;
    fn tools(&self) -> Vec<ToolSpec>;
    fn call(&self, name: &str, arguments: Value) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Line-delimited JSON-RPC server over stdin/stdout.
pub struct StdioServer<H: ToolHandler> {
    handler: H,
}

impl<H: ToolHandler> StdioServer<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// Route one request. Returns `None` for notifications.
    pub fn handle_request(&self, request: RpcRequest) -> Option<RpcResponse> {
        match request.method.as_str() {
            methods::INITIALIZE => Some(RpcResponse::success(
                request.id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": {
                        "name": self.handler.server_name(),
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            )),
            methods::INITIALIZED => None,
            methods::LIST_TOOLS => Some(RpcResponse::success(
                request.id,
                json!({ "tools": self.handler.tools() }),
            )),
            methods::CALL_TOOL => {
                let params: CallToolParams = match serde_json::from_value(request.params) {
                    Ok(params) => params,
                    Err(e) => {
                        return Some(RpcResponse::error(
                            request.id,
                            -32602,
                            format!("Invalid params: {e}"),
                        ))
                    }
                };
                let result = match self.handler.call(&params.name, params.arguments) {
                    Ok(text) => ToolCallResult::text(text),
                    Err(e) => ToolCallResult::failure(e.to_string()),
                };
                match serde_json::to_value(result) {
                    Ok(value) => Some(RpcResponse::success(request.id, value)),
                    Err(e) => Some(RpcResponse::from_error(request.id, &e.into())),
                }
            }
            other => Some(RpcResponse::error(
                request.id,
                -32601,
                format!("Method not found: {other}"),
            )),
        }
    }

    /// Serve until stdin closes.
    pub fn run(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let mut reader = BufReader::new(stdin.lock());
        let mut writer = stdout.lock();
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let response = match serde_json::from_str::<RpcRequest>(trimmed) {
                        Ok(request) => self.handle_request(request),
                        Err(e) => {
                            Some(RpcResponse::error(None, -32700, format!("Parse error: {e}")))
                        }
                    };
                    if let Some(response) = response {
                        writeln!(writer, "{}", serde_json::to_string(&response)?)?;
                        writer.flush()?;
                    }
                }
                Err(e) => {
                    tracing::error!("error reading stdin: {e}");
                    break;
                }
            }
        }
        Ok(())
    }
}
