// crates/host/src/agent.rs

//! Conversation orchestrator: the bounded iterate-call-observe loop.
//!
//! One user message expands into a multi-step exchange: the model is shown
//! the catalog, its validated tool calls are executed sequentially in
//! emission order, and each result is appended to the conversation so the
//! next iteration can chain further calls. The loop ends when the model
//! stops calling tools or the iteration ceiling is hit.

use serde_json::{json, Value};

use calchat_core::ai_client::{AiClient, ChatRequest, ChatTurn};
use calchat_core::calendar::CalendarStore;
use calchat_core::catalog::ToolCatalog;
use calchat_core::config::AgentConfig;
use calchat_core::datetime::DateTimeResolver;
use calchat_core::error::AgentError;
use calchat_core::executor::{ToolExecutor, ToolResult};
use calchat_core::parser::{self, ToolCall};

use crate::format;
use crate::log;

pub struct ChatAgent<'a, C: AiClient, S: CalendarStore + ?Sized> {
    client: &'a C,
    store: &'a S,
    resolver: &'a DateTimeResolver,
    catalog: &'a ToolCatalog,
    config: &'a AgentConfig,
}

impl<'a, C: AiClient, S: CalendarStore + ?Sized> ChatAgent<'a, C, S> {
    pub fn new(
        client: &'a C,
        store: &'a S,
        resolver: &'a DateTimeResolver,
        catalog: &'a ToolCatalog,
        config: &'a AgentConfig,
    ) -> Self {
        Self {
            client,
            store,
            resolver,
            catalog,
            config,
        }
    }

    /// Run one orchestration for a single user message.
    ///
    /// The conversation is seeded fresh and discarded afterwards; there is
    /// no cross-run memory.
    pub fn run(&self, user_message: &str) -> Result<String, AgentError> {
        let executor = ToolExecutor::new(self.store, self.resolver, self.config);
        let tools = self.catalog.definitions();

        let today = self.resolver.resolve("today", false);
        let instructions = build_instructions(self.catalog, &today.to_rfc3339());

        let mut messages = vec![
            ChatTurn::system(instructions),
            ChatTurn::user(user_message),
        ];
        let mut intent = String::from("other");
        let mut results: Vec<ToolResult> = Vec::new();

        for iteration in 0..self.config.max_iterations {
            log::step(iteration + 1, messages.len());

            let request = ChatRequest::new(messages.clone()).with_tools(tools.clone());
            let response = self
                .client
                .chat(request)
                .map_err(|e| AgentError::Transport(e.to_string()))?;

            let Some(choice) = response.choices.into_iter().next() else {
                return Err(AgentError::Transport("no choices in chat response".into()));
            };
            let msg = choice.message;
            let content = msg.content.clone().unwrap_or_default();

            // Prefer native tool calls; fall back to scraping a payload
            // embedded in the text.
            let mut stated_intent = None;
            let calls: Vec<ToolCall> = match &msg.tool_calls {
                Some(raw) if !raw.is_empty() => parser::validate_native(raw, self.catalog),
                _ => {
                    let parsed = parser::parse(&content, self.catalog);
                    if parsed.intent != "other" {
                        stated_intent = Some(parsed.intent);
                    }
                    parsed.tool_calls
                }
            };

            if calls.is_empty() {
                log::response(&content);
                log::done("run complete");
                if !content.trim().is_empty() {
                    return Ok(content);
                }
                return Ok(format::format_response(&intent, &results));
            }

            if intent == "other" {
                // An embedded payload states its own intent; native calls
                // derive it from the first operation.
                intent = stated_intent.unwrap_or_else(|| parser::intent_of(&calls));
            }

            messages.push(ChatTurn::assistant(msg.content.clone(), echo_calls(&calls)));

            // Ordering is a correctness requirement: a reschedule must
            // search before it deletes before it creates.
            for call in &calls {
                let args = Value::Object(call.arguments.clone()).to_string();
                log::tool_call(&call.name, &args);

                let result = executor.execute(call);
                log::tool_result(&call.name, &result.content(), !result.success);

                messages.push(ChatTurn::tool(&call.id, result.content()));
                results.push(result);
            }
        }

        log::error("iteration ceiling reached before the model finished");
        Err(AgentError::MaxIterations(self.config.max_iterations))
    }
}

/// Re-encode validated calls as the assistant turn's tool_calls entries, so
/// every tool turn answers a call the conversation actually carries.
fn echo_calls(calls: &[ToolCall]) -> Vec<Value> {
    calls
        .iter()
        .map(|call| {
            json!({
                "id": call.id,
                "type": "function",
                "function": {
                    "name": call.name,
                    "arguments": Value::Object(call.arguments.clone()).to_string(),
                }
            })
        })
        .collect()
}

fn build_instructions(catalog: &ToolCatalog, today: &str) -> String {
    format!(
        r#"You are a calendar assistant. Today is {today}.

You manage the user's calendar through these tools:
{tools}

Rules:
1. Use a tool for any calendar action; answer directly only for small talk.
2. Date and time arguments may be natural language ("tomorrow at 2pm"); they are resolved in the user's timezone.
3. To move or reschedule an event: search for it first, then delete it, then create the replacement, in that order.
4. When a tool reports an error, adapt (for example retry the search with different terms) instead of giving up.
"#,
        today = today,
        tools = catalog.prompt_block(),
    )
}
