// crates/core/src/ai_client.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Abstract chat-completion client with tool support.
///
/// Implementations can target OpenAI, Azure, Ollama, or a scripted mock.
pub trait AiClient {
    /// Send one chat completion request with optional tools.
    fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// One turn of the conversation sent to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }

    /// Assistant turn, optionally carrying the tool calls it emitted.
    pub fn assistant(content: Option<String>, tool_calls: Vec<Value>) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            tool_call_id: None,
        }
    }

    /// Tool turn answering one prior tool call.
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatTurn>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self.tool_choice = Some("auto".to_string());
        self
    }
}

/// A chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: ChatToolFunction,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatToolFunction {
    pub name: String,
    /// Raw JSON string of the arguments.
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_turn_carries_call_id() {
        let turn = ChatTurn::tool("call_1", "done");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
        assert_eq!(json["content"], "done");
    }

    #[test]
    fn empty_tool_calls_are_omitted() {
        let turn = ChatTurn::assistant(Some("hi".into()), vec![]);
        let json = serde_json::to_string(&turn).unwrap();
        assert!(!json.contains("tool_calls"));
    }

    #[test]
    fn with_tools_sets_auto_choice() {
        let request =
            ChatRequest::new(vec![ChatTurn::user("hi")]).with_tools(vec![serde_json::json!({})]);
        assert_eq!(request.tool_choice.as_deref(), Some("auto"));
    }
}
