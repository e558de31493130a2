//! Chat agent for the web surface
//!
//! Drives an OpenAI-compatible chat-completions endpoint: the model sees the
//! tool catalog, its tool calls are executed against the [`Toolbox`], and the
//! final text comes back to the caller. Each exchange is appended to the
//! conversation history.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{Result, ValetError};
use crate::timefmt;
use crate::tools::{schema, Toolbox};
use crate::types::{ChatMessage, Role};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_TOOL_ROUNDS: usize = 4;
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 500;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl AgentConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// One message on the chat-completions wire
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ApiMessage {
    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool_result(call_id: &str, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    /// JSON-encoded argument object
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ApiMessage,
}

/// Blocking chat agent over a Toolbox.
pub struct Agent {
    config: AgentConfig,
    http: reqwest::blocking::Client,
    toolbox: Toolbox,
}

impl Agent {
    pub fn new(config: AgentConfig, toolbox: Toolbox) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            config,
            http,
            toolbox,
        })
    }

    /// Answer one user message within a session. The user turn and the final
    /// assistant turn are persisted to the conversation history.
    pub fn respond(&self, session_id: &str, user_message: &str) -> Result<String> {
        let history = self.toolbox.conversations.window(session_id)?;
        let mut messages = build_messages(&history, user_message);
        let tools = openai_tools();

        for round in 0..MAX_TOOL_ROUNDS {
            let reply = self.complete(&messages, &tools)?;

            let calls = reply.tool_calls.clone().unwrap_or_default();
            if calls.is_empty() {
                let text = reply.content.unwrap_or_default();
                self.toolbox.conversations.append(
                    session_id,
                    &[
                        ChatMessage::user(user_message),
                        ChatMessage::assistant(text.clone()),
                    ],
                )?;
                return Ok(text);
            }

            debug!(round, count = calls.len(), "executing tool calls");
            messages.push(reply);
            for call in calls {
                let output = self.run_tool(&call);
                messages.push(ApiMessage::tool_result(&call.id, output));
            }
        }

        Err(ValetError::Agent(format!(
            "model kept requesting tools after {MAX_TOOL_ROUNDS} rounds"
        )))
    }

    fn run_tool(&self, call: &ToolCall) -> String {
        let args: Value = match serde_json::from_str(&call.function.arguments) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %call.function.name, error = %e, "unparseable tool arguments");
                return format!("Error: could not parse tool arguments: {e}");
            }
        };
        match self.toolbox.dispatch(&call.function.name, args) {
            Ok(text) => text,
            Err(e) => format!("Error: {}", e.reason()),
        }
    }

    fn complete(&self, messages: &[ApiMessage], tools: &Value) -> Result<ApiMessage> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "model": self.config.model,
                "messages": messages,
                "tools": tools,
                "temperature": TEMPERATURE,
                "max_tokens": MAX_TOKENS,
            }))
            .send()?
            .error_for_status()?;

        let completion: ChatCompletion = response.json()?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ValetError::Agent("completion carried no choices".to_string()))
    }
}

fn system_prompt() -> String {
    format!(
        "You are a helpful personal assistant that can help with scheduling events, \
         managing to-do lists, taking notes, managing contacts, and answering questions. \
         You should be polite, helpful, and concise in your responses.\n\n\
         The current date and time is: {}\n\n\
         When the user asks to perform one of these actions, use the matching tool \
         rather than describing what you would do.",
        timefmt::spoken(timefmt::now_local())
    )
}

fn build_messages(history: &[ChatMessage], user_message: &str) -> Vec<ApiMessage> {
    let mut messages = vec![ApiMessage::plain("system", system_prompt())];
    for turn in history {
        let role = match turn.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        messages.push(ApiMessage::plain(role, turn.content.clone()));
    }
    messages.push(ApiMessage::plain("user", user_message));
    messages
}

/// The tool catalog in the chat-completions `function` wrapper.
fn openai_tools() -> Value {
    let tools: Vec<Value> = schema::tool_specs()
        .into_iter()
        .map(|spec| {
            json!({
                "type": "function",
                "function": {
                    "name": spec.name,
                    "description": spec.description,
                    "parameters": spec.input_schema,
                },
            })
        })
        .collect();
    Value::Array(tools)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_system_history_then_user() {
        let history = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello, how can I help?"),
        ];
        let messages = build_messages(&history, "schedule a standup");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].content.as_deref(), Some("schedule a standup"));
    }

    #[test]
    fn system_prompt_carries_the_current_time() {
        let prompt = system_prompt();
        assert!(prompt.contains("The current date and time is: "));
        assert!(prompt.contains(" at "));
    }

    #[test]
    fn tools_use_the_function_wrapper() {
        let tools = openai_tools();
        let tools = tools.as_array().unwrap();
        assert!(!tools.is_empty());
        for tool in tools {
            assert_eq!(tool["type"], "function");
            assert!(tool["function"]["name"].is_string());
            assert!(tool["function"]["parameters"].is_object());
        }
    }

    #[test]
    fn tool_result_messages_reference_the_call() {
        let msg = ApiMessage::tool_result("call_1", "done");
        assert_eq!(msg.role, "tool");
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }
}
