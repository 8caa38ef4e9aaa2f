// crates/core/src/catalog.rs

//! The fixed capability catalog advertised to the model.

use serde_json::{json, Value};

/// The five calendar operations the model may invoke.
///
/// Adding a tool means adding a variant here; dispatch is exhaustive, so the
/// compiler points at every site that needs a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ListEvents,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    SearchEvents,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::ListEvents,
        ToolKind::CreateEvent,
        ToolKind::UpdateEvent,
        ToolKind::DeleteEvent,
        ToolKind::SearchEvents,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::ListEvents => "list_calendar_events",
            ToolKind::CreateEvent => "create_calendar_event",
            ToolKind::UpdateEvent => "update_calendar_event",
            ToolKind::DeleteEvent => "delete_calendar_event",
            ToolKind::SearchEvents => "search_calendar_events",
        }
    }

    pub fn from_name(name: &str) -> Option<ToolKind> {
        ToolKind::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Intent label used by the response formatter.
    pub fn intent(&self) -> &'static str {
        match self {
            ToolKind::ListEvents => "list",
            ToolKind::CreateEvent => "create",
            ToolKind::UpdateEvent => "update",
            ToolKind::DeleteEvent => "delete",
            ToolKind::SearchEvents => "search",
        }
    }
}

/// A named, schema-described operation. Immutable after startup.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Static set of tool specs, in a fixed order so the rendered prompt block
/// is reproducible across runs.
pub struct ToolCatalog {
    specs: Vec<ToolSpec>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        let specs = ToolKind::ALL
            .into_iter()
            .map(|kind| ToolSpec {
                name: kind.name(),
                description: description_for(kind),
                parameters: parameters_for(kind),
            })
            .collect();
        Self { specs }
    }

    pub fn list(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn exists(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }

    pub fn schema_for(&self, name: &str) -> Option<&Value> {
        self.specs
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.parameters)
    }

    /// Field names the schema marks required, empty for unknown tools.
    pub fn required_fields(&self, name: &str) -> Vec<&str> {
        self.schema_for(name)
            .and_then(|schema| schema.get("required"))
            .and_then(|r| r.as_array())
            .map(|fields| fields.iter().filter_map(|f| f.as_str()).collect())
            .unwrap_or_default()
    }

    /// Function-call definitions in the wire format the model expects.
    pub fn definitions(&self) -> Vec<Value> {
        self.specs
            .iter()
            .map(|spec| {
                json!({
                    "type": "function",
                    "function": {
                        "name": spec.name,
                        "description": spec.description,
                        "parameters": spec.parameters,
                    }
                })
            })
            .collect()
    }

    /// Deterministic `name: description` block for the system prompt.
    pub fn prompt_block(&self) -> String {
        self.specs
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn description_for(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::ListEvents => {
            "List calendar events in a date range. Dates may be natural language like 'today' or 'next week'."
        }
        ToolKind::CreateEvent => {
            "Create a calendar event. The start time may be natural language like 'tomorrow at 2pm'."
        }
        ToolKind::UpdateEvent => {
            "Update an existing event, found by its id or by a title query."
        }
        ToolKind::DeleteEvent => {
            "Delete an existing event, found by its id or by a title query."
        }
        ToolKind::SearchEvents => {
            "Search recent events by substring match on title and description."
        }
    }
}

fn parameters_for(kind: ToolKind) -> Value {
    match kind {
        ToolKind::ListEvents => json!({
            "type": "object",
            "properties": {
                "start": {
                    "type": "string",
                    "description": "Start of the range, e.g. 'today' or '2026-09-01'. Defaults to today."
                },
                "end": {
                    "type": "string",
                    "description": "End of the range. Defaults to the end of the start day."
                }
            },
            "required": []
        }),
        ToolKind::CreateEvent => json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Event title" },
                "start": {
                    "type": "string",
                    "description": "Start time, e.g. 'tomorrow at 2pm' or '2026-09-01T14:00:00'"
                },
                "end": {
                    "type": "string",
                    "description": "End time. Defaults to one hour after the start."
                },
                "duration_minutes": {
                    "type": "integer",
                    "description": "Event length when no end time is given."
                },
                "location": { "type": "string" },
                "description": { "type": "string" }
            },
            "required": ["title", "start"]
        }),
        ToolKind::UpdateEvent => json!({
            "type": "object",
            "properties": {
                "event_id": { "type": "string", "description": "Store-assigned event id, if known." },
                "query": {
                    "type": "string",
                    "description": "Title substring identifying the event when the id is unknown."
                },
                "title": { "type": "string", "description": "New title" },
                "start": { "type": "string", "description": "New start time" },
                "end": { "type": "string", "description": "New end time" },
                "location": { "type": "string" },
                "description": { "type": "string" }
            },
            "required": []
        }),
        ToolKind::DeleteEvent => json!({
            "type": "object",
            "properties": {
                "event_id": { "type": "string", "description": "Store-assigned event id, if known." },
                "query": {
                    "type": "string",
                    "description": "Title substring identifying the event when the id is unknown."
                }
            },
            "required": []
        }),
        ToolKind::SearchEvents => json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Substring to match against title and description" },
                "max_results": { "type": "integer", "description": "Result cap, default 10" }
            },
            "required": ["query"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_the_five_tools() {
        let catalog = ToolCatalog::new();
        assert_eq!(catalog.list().len(), 5);
        assert!(catalog.exists("create_calendar_event"));
        assert!(catalog.exists("search_calendar_events"));
        assert!(!catalog.exists("send_email"));
    }

    #[test]
    fn kind_round_trips_through_name() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("nonexistent"), None);
    }

    #[test]
    fn required_fields_follow_the_schema() {
        let catalog = ToolCatalog::new();
        assert_eq!(
            catalog.required_fields("create_calendar_event"),
            vec!["title", "start"]
        );
        assert_eq!(catalog.required_fields("search_calendar_events"), vec!["query"]);
        assert!(catalog.required_fields("delete_calendar_event").is_empty());
        assert!(catalog.required_fields("nonexistent").is_empty());
    }

    #[test]
    fn prompt_block_is_deterministic_and_ordered() {
        let a = ToolCatalog::new().prompt_block();
        let b = ToolCatalog::new().prompt_block();
        assert_eq!(a, b);

        let list_pos = a.find("list_calendar_events").unwrap();
        let search_pos = a.find("search_calendar_events").unwrap();
        assert!(list_pos < search_pos);
    }

    #[test]
    fn definitions_use_the_function_envelope() {
        let defs = ToolCatalog::new().definitions();
        assert_eq!(defs.len(), 5);
        for def in defs {
            assert_eq!(def["type"], "function");
            assert!(def["function"]["name"].is_string());
            assert!(def["function"]["parameters"]["type"] == "object");
        }
    }
}
