// crates/host/src/format.rs

//! Renders executed tool results into a user-facing reply.
//!
//! Used when the model completes a run without final prose of its own.

use calchat_core::executor::ToolResult;

/// Intent-specific phrasing per successful result, an error line per
/// failure, joined in result order. Never returns the empty string.
pub fn format_response(intent: &str, results: &[ToolResult]) -> String {
    if results.is_empty() {
        return "No calendar action was taken.".to_string();
    }

    results
        .iter()
        .map(|r| line_for(intent, r))
        .collect::<Vec<_>>()
        .join("\n")
}

fn line_for(intent: &str, result: &ToolResult) -> String {
    if !result.success {
        return format!(
            "Something went wrong: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    match intent {
        "create" => {
            let title = result.data["title"].as_str().unwrap_or("the event");
            let start = result.data["start"].as_str().unwrap_or("");
            if start.is_empty() {
                format!("Created \"{}\".", title)
            } else {
                format!("Created \"{}\" starting {}.", title, start)
            }
        }
        "update" => "Updated the event.".to_string(),
        "delete" => "Deleted the event.".to_string(),
        "list" | "search" => {
            let count = result.data["count"].as_u64().unwrap_or(0);
            if count == 0 {
                return "No matching events found.".to_string();
            }
            let mut lines = vec![format!(
                "Found {} event{}:",
                count,
                if count == 1 { "" } else { "s" }
            )];
            if let Some(events) = result.data["events"].as_array() {
                for event in events {
                    let title = event["title"].as_str().unwrap_or("(untitled)");
                    let start = event["start"].as_str().unwrap_or("");
                    lines.push(format!("  - {} ({})", title, start));
                }
            }
            lines.join("\n")
        }
        _ => "Done.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calchat_core::calendar::MemoryCalendar;
    use calchat_core::config::AgentConfig;
    use calchat_core::datetime::DateTimeResolver;
    use calchat_core::executor::ToolExecutor;
    use calchat_core::parser::ToolCall;
    use serde_json::json;

    fn run(name: &str, args: serde_json::Value) -> ToolResult {
        let store = MemoryCalendar::new();
        let resolver = DateTimeResolver::new(chrono_tz::UTC);
        let config = AgentConfig::default();
        let executor = ToolExecutor::new(&store, &resolver, &config);
        let call = ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: args.as_object().cloned().unwrap_or_default(),
        };
        executor.execute(&call)
    }

    #[test]
    fn empty_results_render_a_no_action_line() {
        let text = format_response("create", &[]);
        assert!(!text.is_empty());
        assert!(text.contains("No calendar action"));
    }

    #[test]
    fn successful_create_is_never_empty() {
        let result = run(
            "create_calendar_event",
            json!({ "title": "Meeting", "start": "tomorrow at 2pm" }),
        );
        let text = format_response("create", &[result]);
        assert!(!text.is_empty());
        assert!(text.contains("Meeting"));
    }

    #[test]
    fn failures_render_an_error_line() {
        let result = run("delete_calendar_event", json!({ "query": "ghost" }));
        let text = format_response("delete", &[result]);
        assert!(text.contains("Something went wrong"));
    }

    #[test]
    fn lines_preserve_result_order() {
        let created = run(
            "create_calendar_event",
            json!({ "title": "A", "start": "today at 9am" }),
        );
        let failed = run("delete_calendar_event", json!({ "query": "ghost" }));
        let text = format_response("create", &[created, failed]);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Created"));
        assert!(lines[1].starts_with("Something went wrong"));
    }
}
