// crates/core/src/executor.rs

//! Dispatch of validated tool calls against the calendar store.
//!
//! Every date-bearing argument goes through the resolver before the store is
//! touched, and every store failure is folded into a `ToolResult` so the
//! orchestrator never sees an error from here.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, FixedOffset};
use serde_json::{json, Value};

use crate::calendar::{CalendarEvent, CalendarStore, EventDraft, EventPatch};
use crate::catalog::ToolKind;
use crate::config::AgentConfig;
use crate::datetime::DateTimeResolver;
use crate::error::AgentError;
use crate::parser::ToolCall;

/// Uniform result envelope for one executed tool call.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub call: ToolCall,
    pub success: bool,
    pub data: Value,
    pub error: Option<String>,
}

impl ToolResult {
    fn ok(call: &ToolCall, data: Value) -> Self {
        Self {
            call: call.clone(),
            success: true,
            data,
            error: None,
        }
    }

    fn fail(call: &ToolCall, error: impl ToString) -> Self {
        Self {
            call: call.clone(),
            success: false,
            data: Value::Null,
            error: Some(error.to_string()),
        }
    }

    /// Content of the tool turn fed back to the model.
    pub fn content(&self) -> String {
        match &self.error {
            Some(e) => format!("ERROR: {}", e),
            None => self.data.to_string(),
        }
    }
}

pub struct ToolExecutor<'a, S: CalendarStore + ?Sized> {
    store: &'a S,
    resolver: &'a DateTimeResolver,
    config: &'a AgentConfig,
}

impl<'a, S: CalendarStore + ?Sized> ToolExecutor<'a, S> {
    pub fn new(store: &'a S, resolver: &'a DateTimeResolver, config: &'a AgentConfig) -> Self {
        Self {
            store,
            resolver,
            config,
        }
    }

    /// Execute one validated call. Never returns an error; failures become
    /// `success: false` results the model can react to.
    pub fn execute(&self, call: &ToolCall) -> ToolResult {
        // Validation upstream guarantees a known name; guard anyway.
        let Some(kind) = ToolKind::from_name(&call.name) else {
            return ToolResult::fail(call, AgentError::UnknownTool(call.name.clone()));
        };

        let outcome = match kind {
            ToolKind::ListEvents => self.list_events(call),
            ToolKind::CreateEvent => self.create_event(call),
            ToolKind::UpdateEvent => self.update_event(call),
            ToolKind::DeleteEvent => self.delete_event(call),
            ToolKind::SearchEvents => self.search_events(call),
        };

        match outcome {
            Ok(data) => ToolResult::ok(call, data),
            Err(e) => ToolResult::fail(call, e),
        }
    }

    fn list_events(&self, call: &ToolCall) -> Result<Value> {
        let start_expr = arg_str(call, "start").unwrap_or("today");
        let end_expr = arg_str(call, "end").unwrap_or(start_expr);

        let start = self.resolve(start_expr, false);
        let end = self.resolve(end_expr, true);

        let events = self.store.get_events(start, end)?;
        Ok(json!({ "count": events.len(), "events": events }))
    }

    fn create_event(&self, call: &ToolCall) -> Result<Value> {
        let title = arg_str(call, "title").context("missing 'title'")?;
        let start = self.resolve(arg_str(call, "start").context("missing 'start'")?, false);

        // Non-positive durations fall back to the default; values chrono
        // cannot represent are a tool-level error.
        let minutes = match arg_i64(call, "duration_minutes") {
            Some(m) if m > 0 => m,
            _ => self.config.default_event_minutes,
        };
        let length = Duration::try_minutes(minutes)
            .ok_or_else(|| anyhow!("'duration_minutes' {} is out of range", minutes))?;

        let mut end = match arg_str(call, "end") {
            Some(expr) => self.resolve(expr, false),
            None => checked_end(start, length)?,
        };
        if end <= start {
            end = checked_end(start, length)?;
        }

        let draft = EventDraft {
            title: title.to_string(),
            start,
            end,
            location: arg_str(call, "location").map(String::from),
            description: arg_str(call, "description").map(String::from),
        };

        let created = self.store.create_event(&draft)?;
        Ok(json!({
            "id": created.id,
            "link": created.link,
            "title": draft.title,
            "start": draft.start.to_rfc3339(),
            "end": draft.end.to_rfc3339(),
        }))
    }

    fn update_event(&self, call: &ToolCall) -> Result<Value> {
        let id = self.resolve_identifier(call)?;

        let patch = EventPatch {
            title: arg_str(call, "title").map(String::from),
            start: arg_str(call, "start").map(|e| self.resolve(e, false)),
            end: arg_str(call, "end").map(|e| self.resolve(e, false)),
            location: arg_str(call, "location").map(String::from),
            description: arg_str(call, "description").map(String::from),
        };

        self.store.update_event(&id, &patch)?;
        Ok(json!({ "id": id, "updated": true }))
    }

    fn delete_event(&self, call: &ToolCall) -> Result<Value> {
        let id = self.resolve_identifier(call)?;
        self.store.delete_event(&id)?;
        Ok(json!({ "id": id, "deleted": true }))
    }

    fn search_events(&self, call: &ToolCall) -> Result<Value> {
        let query = arg_str(call, "query").context("missing 'query'")?;
        let max = arg_i64(call, "max_results")
            .map(|n| n.max(0) as usize)
            .unwrap_or(self.config.max_search_results);

        let (start, end) = self.recency_window();
        let events = self.store.get_events(start, end)?;

        let matches: Vec<CalendarEvent> = events
            .into_iter()
            .filter(|e| matches_query(e, query))
            .take(max)
            .collect();

        Ok(json!({ "count": matches.len(), "events": matches }))
    }

    /// Store-assigned id when given, otherwise a substring search inside the
    /// recency window. No match is a tool-level error, not a crash.
    fn resolve_identifier(&self, call: &ToolCall) -> Result<String> {
        if let Some(id) = arg_str(call, "event_id") {
            return Ok(id.to_string());
        }
        let query = arg_str(call, "query")
            .ok_or_else(|| anyhow!("missing 'event_id' or 'query' to identify the event"))?;

        let (start, end) = self.recency_window();
        let events = self.store.get_events(start, end)?;

        events
            .iter()
            .find(|e| matches_query(e, query))
            .map(|e| e.id.clone())
            .ok_or_else(|| AgentError::EventNotFound(query.to_string()).into())
    }

    /// Bounded recency window for identifier resolution and search: the
    /// current month, extended to the configured number of days.
    fn recency_window(&self) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        let start = self.resolver.resolve("this month", false).instant;
        let end = start + Duration::days(self.config.search_window_days);
        (start.fixed_offset(), end.fixed_offset())
    }

    fn resolve(&self, expression: &str, end_of_day: bool) -> DateTime<FixedOffset> {
        self.resolver.resolve(expression, end_of_day).instant.fixed_offset()
    }
}

fn checked_end(start: DateTime<FixedOffset>, length: Duration) -> Result<DateTime<FixedOffset>> {
    start
        .checked_add_signed(length)
        .ok_or_else(|| anyhow!("event end is outside the supported time range"))
}

/// Case-insensitive substring containment on title and description only.
fn matches_query(event: &CalendarEvent, query: &str) -> bool {
    let needle = query.to_lowercase();
    event.title.to_lowercase().contains(&needle)
        || event
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false)
}

fn arg_str<'c>(call: &'c ToolCall, key: &str) -> Option<&'c str> {
    call.arguments.get(key).and_then(|v| v.as_str())
}

fn arg_i64(call: &ToolCall, key: &str) -> Option<i64> {
    call.arguments.get(key).and_then(|v| v.as_i64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::MemoryCalendar;
    use serde_json::Map;

    fn call(name: &str, arguments: Value) -> ToolCall {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    struct Fixture {
        store: MemoryCalendar,
        resolver: DateTimeResolver,
        config: AgentConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryCalendar::new(),
                resolver: DateTimeResolver::new(chrono_tz::UTC),
                config: AgentConfig::default(),
            }
        }

        fn executor(&self) -> ToolExecutor<'_, MemoryCalendar> {
            ToolExecutor::new(&self.store, &self.resolver, &self.config)
        }

        fn seed(&self, title: &str, rfc3339: &str) {
            let start = DateTime::parse_from_rfc3339(rfc3339).unwrap();
            self.store
                .create_event(&EventDraft {
                    title: title.to_string(),
                    start,
                    end: start + Duration::minutes(30),
                    location: None,
                    description: None,
                })
                .unwrap();
        }

        fn seed_today(&self, title: &str, hour: u32) {
            let today = self.resolver.now().date_naive();
            self.seed(title, &format!("{}T{:02}:00:00+00:00", today, hour));
        }
    }

    #[test]
    fn create_defaults_to_one_hour() {
        let fx = Fixture::new();
        let result = fx.executor().execute(&call(
            "create_calendar_event",
            json!({ "title": "Meeting with John", "start": "tomorrow at 2pm" }),
        ));

        assert!(result.success, "{:?}", result.error);
        let start = DateTime::parse_from_rfc3339(result.data["start"].as_str().unwrap()).unwrap();
        let end = DateTime::parse_from_rfc3339(result.data["end"].as_str().unwrap()).unwrap();
        assert_eq!(end - start, Duration::minutes(60));
        assert_eq!(start.format("%H:%M").to_string(), "14:00");
    }

    #[test]
    fn create_honors_duration_minutes() {
        let fx = Fixture::new();
        let result = fx.executor().execute(&call(
            "create_calendar_event",
            json!({ "title": "Sync", "start": "friday at 9am", "duration_minutes": 30 }),
        ));

        let start = DateTime::parse_from_rfc3339(result.data["start"].as_str().unwrap()).unwrap();
        let end = DateTime::parse_from_rfc3339(result.data["end"].as_str().unwrap()).unwrap();
        assert_eq!(end - start, Duration::minutes(30));
    }

    #[test]
    fn create_with_extreme_duration_is_a_tool_error() {
        let fx = Fixture::new();
        let result = fx.executor().execute(&call(
            "create_calendar_event",
            json!({ "title": "Forever", "start": "tomorrow at 2pm", "duration_minutes": i64::MAX }),
        ));

        assert!(!result.success);
        assert!(result.content().starts_with("ERROR:"));
    }

    #[test]
    fn create_with_negative_duration_uses_the_default_length() {
        let fx = Fixture::new();
        let result = fx.executor().execute(&call(
            "create_calendar_event",
            json!({ "title": "Backwards", "start": "tomorrow at 2pm", "duration_minutes": -30 }),
        ));

        assert!(result.success, "{:?}", result.error);
        let start = DateTime::parse_from_rfc3339(result.data["start"].as_str().unwrap()).unwrap();
        let end = DateTime::parse_from_rfc3339(result.data["end"].as_str().unwrap()).unwrap();
        assert_eq!(end - start, Duration::minutes(60));
        assert!(end > start);
    }

    #[test]
    fn list_defaults_to_today() {
        let fx = Fixture::new();
        fx.seed_today("Standup", 9);
        fx.seed("Far future", "2099-01-01T09:00:00+00:00");

        let result = fx.executor().execute(&call("list_calendar_events", json!({})));
        assert!(result.success);
        assert_eq!(result.data["count"], 1);
        assert_eq!(result.data["events"][0]["title"], "Standup");
    }

    #[test]
    fn search_matches_title_and_description_case_insensitively() {
        let fx = Fixture::new();
        fx.seed_today("Team Meeting", 10);
        fx.seed_today("Lunch", 12);

        let result = fx.executor().execute(&call(
            "search_calendar_events",
            json!({ "query": "team meeting" }),
        ));
        assert!(result.success);
        assert_eq!(result.data["count"], 1);
        assert_eq!(result.data["events"][0]["title"], "Team Meeting");
    }

    #[test]
    fn search_truncates_to_max_results_in_order() {
        let fx = Fixture::new();
        for hour in 8..14 {
            fx.seed_today(&format!("Standup {}", hour), hour);
        }

        let result = fx.executor().execute(&call(
            "search_calendar_events",
            json!({ "query": "standup", "max_results": 3 }),
        ));
        assert_eq!(result.data["count"], 3);
        assert_eq!(result.data["events"][0]["title"], "Standup 8");
        assert_eq!(result.data["events"][2]["title"], "Standup 10");
    }

    #[test]
    fn delete_by_query_resolves_via_search() {
        let fx = Fixture::new();
        fx.seed_today("Team meeting", 10);

        let result = fx
            .executor()
            .execute(&call("delete_calendar_event", json!({ "query": "team" })));
        assert!(result.success, "{:?}", result.error);

        let remaining = fx.executor().execute(&call("list_calendar_events", json!({})));
        assert_eq!(remaining.data["count"], 0);
    }

    #[test]
    fn delete_unknown_query_is_a_tool_error_not_a_crash() {
        let fx = Fixture::new();
        let result = fx
            .executor()
            .execute(&call("delete_calendar_event", json!({ "query": "nothing here" })));

        assert!(!result.success);
        let error = result.error.as_deref().unwrap();
        assert!(error.contains("no calendar event matched"), "{}", error);
        assert!(result.content().starts_with("ERROR:"));
    }

    #[test]
    fn update_by_human_identifier() {
        let fx = Fixture::new();
        fx.seed_today("Dentist", 11);

        let result = fx.executor().execute(&call(
            "update_calendar_event",
            json!({ "query": "dentist", "start": "friday at 3pm", "title": "Dentist (moved)" }),
        ));
        assert!(result.success, "{:?}", result.error);

        let search = fx
            .executor()
            .execute(&call("search_calendar_events", json!({ "query": "dentist" })));
        assert_eq!(search.data["events"][0]["title"], "Dentist (moved)");
    }

    #[test]
    fn update_without_identifier_fails_cleanly() {
        let fx = Fixture::new();
        let result = fx
            .executor()
            .execute(&call("update_calendar_event", json!({ "title": "Renamed" })));
        assert!(!result.success);
    }
}
