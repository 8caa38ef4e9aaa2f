// crates/core/src/parser.rs

//! Extraction and validation of tool calls from model output.
//!
//! Two entry points: `parse` scrapes a structured payload embedded in free
//! text (the last-resort path), `validate_native` checks tool-call entries
//! the model emitted through the function-calling protocol. Both drop
//! invalid calls with a logged diagnostic and never fail the run.

use serde_json::{Map, Value};

use crate::ai_client::ChatToolCall;
use crate::catalog::{ToolCatalog, ToolKind};
use crate::error::AgentError;

/// A validated tool invocation ready for execution.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// Structured reading of one piece of model output text.
#[derive(Debug, Clone)]
pub struct ParsedOutput {
    pub intent: String,
    pub reasoning: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ParsedOutput {
    fn plain() -> Self {
        Self {
            intent: "other".to_string(),
            reasoning: String::new(),
            tool_calls: Vec::new(),
        }
    }
}

/// Parse model output text for an embedded payload of the shape
/// `{ "intent": ..., "reasoning": ..., "tool_calls": [...] }`.
///
/// No payload, or a malformed one, degrades to a plain answer with
/// `intent = "other"` and zero calls. Pure function, no retained state.
pub fn parse(text: &str, catalog: &ToolCatalog) -> ParsedOutput {
    let Some(payload) = extract_json_block(text) else {
        return ParsedOutput::plain();
    };

    let Ok(value) = serde_json::from_str::<Value>(payload) else {
        eprintln!("[parser] embedded payload is not valid JSON; treating as plain text");
        return ParsedOutput::plain();
    };

    let intent = value
        .get("intent")
        .and_then(|v| v.as_str())
        .unwrap_or("other")
        .to_string();
    let reasoning = value
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let mut tool_calls = Vec::new();
    if let Some(items) = value.get("tool_calls").and_then(|v| v.as_array()) {
        for (i, item) in items.iter().enumerate() {
            let Some(name) = item.get("name").and_then(|v| v.as_str()) else {
                eprintln!("[parser] dropped tool call without a name");
                continue;
            };
            let arguments = item
                .get("arguments")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();

            let call = ToolCall {
                id: format!("embedded-{}", i),
                name: name.to_string(),
                arguments,
            };
            match validate(&call, catalog) {
                Ok(()) => tool_calls.push(call),
                Err(err) => eprintln!("[parser] dropped tool call: {}", err),
            }
        }
    }

    ParsedOutput {
        intent,
        reasoning,
        tool_calls,
    }
}

/// Validate tool-call entries from the function-calling protocol. The
/// arguments arrive as a JSON string which must itself parse to an object;
/// anything else is a per-call validation failure, not a transport error.
pub fn validate_native(raw: &[ChatToolCall], catalog: &ToolCatalog) -> Vec<ToolCall> {
    let mut calls = Vec::new();

    for tc in raw {
        let arguments = match serde_json::from_str::<Value>(&tc.function.arguments) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                eprintln!(
                    "[parser] dropped '{}': arguments are not a JSON object",
                    tc.function.name
                );
                continue;
            }
        };

        let call = ToolCall {
            id: tc.id.clone(),
            name: tc.function.name.clone(),
            arguments,
        };
        match validate(&call, catalog) {
            Ok(()) => calls.push(call),
            Err(err) => eprintln!("[parser] dropped tool call: {}", err),
        }
    }

    calls
}

/// Intent label for a validated call sequence: the first call's operation.
pub fn intent_of(calls: &[ToolCall]) -> String {
    calls
        .first()
        .and_then(|c| ToolKind::from_name(&c.name))
        .map(|k| k.intent().to_string())
        .unwrap_or_else(|| "other".to_string())
}

fn validate(call: &ToolCall, catalog: &ToolCatalog) -> Result<(), AgentError> {
    if !catalog.exists(&call.name) {
        return Err(AgentError::UnknownTool(call.name.clone()));
    }
    for field in catalog.required_fields(&call.name) {
        if !call.arguments.contains_key(field) {
            return Err(AgentError::MissingArgument {
                tool: call.name.clone(),
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

/// First balanced `{...}` span in the text, string- and escape-aware.
fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_client::ChatToolFunction;

    fn catalog() -> ToolCatalog {
        ToolCatalog::new()
    }

    fn native(name: &str, arguments: &str) -> ChatToolCall {
        ChatToolCall {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: ChatToolFunction {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    #[test]
    fn plain_text_has_no_calls() {
        let parsed = parse("hello, how can I help?", &catalog());
        assert_eq!(parsed.intent, "other");
        assert!(parsed.tool_calls.is_empty());
    }

    #[test]
    fn payload_embedded_in_prose_is_extracted() {
        let text = r#"Sure, let me set that up.
{"intent": "create", "reasoning": "user wants a meeting", "tool_calls": [
  {"name": "create_calendar_event", "arguments": {"title": "Meeting", "start": "tomorrow at 2pm"}}
]}
Done."#;
        let parsed = parse(text, &catalog());
        assert_eq!(parsed.intent, "create");
        assert_eq!(parsed.reasoning, "user wants a meeting");
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].name, "create_calendar_event");
    }

    #[test]
    fn malformed_payload_degrades_to_plain() {
        let parsed = parse(r#"{"intent": "create", "tool_calls": [oops"#, &catalog());
        assert_eq!(parsed.intent, "other");
        assert!(parsed.tool_calls.is_empty());
    }

    #[test]
    fn unknown_tool_is_dropped() {
        let text = r#"{"intent": "other", "tool_calls": [
            {"name": "send_email", "arguments": {"to": "john"}},
            {"name": "search_calendar_events", "arguments": {"query": "standup"}}
        ]}"#;
        let parsed = parse(text, &catalog());
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].name, "search_calendar_events");
    }

    #[test]
    fn missing_required_field_is_dropped() {
        let text = r#"{"intent": "create", "tool_calls": [
            {"name": "create_calendar_event", "arguments": {"title": "Meeting"}}
        ]}"#;
        let parsed = parse(text, &catalog());
        assert!(parsed.tool_calls.is_empty());
    }

    #[test]
    fn braces_inside_strings_do_not_break_extraction() {
        let text = r#"{"intent": "search", "reasoning": "query has } in it", "tool_calls": [
            {"name": "search_calendar_events", "arguments": {"query": "a } b"}}
        ]}"#;
        let parsed = parse(text, &catalog());
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].arguments["query"], "a } b");
    }

    #[test]
    fn native_calls_are_validated() {
        let raw = vec![
            native("create_calendar_event", r#"{"title": "Sync", "start": "friday"}"#),
            native("create_calendar_event", r#"{"title": "No start"}"#),
            native("delete_calendar_event", "not json at all"),
            native("send_email", r#"{"to": "john"}"#),
        ];
        let calls = validate_native(&raw, &catalog());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "create_calendar_event");
        assert_eq!(calls[0].arguments["title"], "Sync");
    }

    #[test]
    fn intent_follows_the_first_call() {
        let raw = vec![
            native("search_calendar_events", r#"{"query": "standup"}"#),
            native("delete_calendar_event", r#"{"query": "standup"}"#),
        ];
        let calls = validate_native(&raw, &catalog());
        assert_eq!(intent_of(&calls), "search");
        assert_eq!(intent_of(&[]), "other");
    }
}
