// crates/core/src/calendar.rs

//! Calendar store interface and the in-memory backend.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A calendar event as returned from a store query. The store owns the
/// record; these are transient copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fields for a new event.
#[derive(Debug, Clone, Serialize)]
pub struct EventDraft {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Outcome of creating an event.
#[derive(Debug, Clone)]
pub struct CreatedEvent {
    pub id: String,
    pub link: Option<String>,
}

/// System of record for events. All persistence lives behind this seam;
/// query results come back in chronological order by start time.
pub trait CalendarStore {
    fn get_events(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>>;

    fn create_event(&self, draft: &EventDraft) -> Result<CreatedEvent>;

    fn update_event(&self, id: &str, patch: &EventPatch) -> Result<()>;

    fn delete_event(&self, id: &str) -> Result<()>;
}

/// In-process store. Backs the tests and serves as the credential-free
/// fallback backend.
pub struct MemoryCalendar {
    inner: Mutex<Inner>,
}

struct Inner {
    events: Vec<CalendarEvent>,
    next_id: u64,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| anyhow!("store lock poisoned"))
    }
}

impl Default for MemoryCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarStore for MemoryCalendar {
    fn get_events(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>> {
        let inner = self.lock()?;
        let mut events: Vec<CalendarEvent> = inner
            .events
            .iter()
            .filter(|e| e.start <= end && e.end >= start)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    fn create_event(&self, draft: &EventDraft) -> Result<CreatedEvent> {
        let mut inner = self.lock()?;
        let id = format!("evt-{}", inner.next_id);
        inner.next_id += 1;
        inner.events.push(CalendarEvent {
            id: id.clone(),
            title: draft.title.clone(),
            start: draft.start,
            end: draft.end,
            location: draft.location.clone(),
            description: draft.description.clone(),
        });
        Ok(CreatedEvent { id, link: None })
    }

    fn update_event(&self, id: &str, patch: &EventPatch) -> Result<()> {
        let mut inner = self.lock()?;
        let event = inner
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow!("event '{}' not found", id))?;

        if let Some(title) = &patch.title {
            event.title = title.clone();
        }
        if let Some(start) = patch.start {
            event.start = start;
        }
        if let Some(end) = patch.end {
            event.end = end;
        }
        if let Some(location) = &patch.location {
            event.location = Some(location.clone());
        }
        if let Some(description) = &patch.description {
            event.description = Some(description.clone());
        }
        Ok(())
    }

    fn delete_event(&self, id: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let before = inner.events.len();
        inner.events.retain(|e| e.id != id);
        if inner.events.len() == before {
            anyhow::bail!("event '{}' not found", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(&format!("2026-08-24T{:02}:00:00+00:00", h)).unwrap()
    }

    fn draft(title: &str, start_hour: u32) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            start: at(start_hour),
            end: at(start_hour + 1),
            location: None,
            description: None,
        }
    }

    #[test]
    fn create_then_query() {
        let store = MemoryCalendar::new();
        let created = store.create_event(&draft("Standup", 9)).unwrap();
        assert_eq!(created.id, "evt-1");

        let events = store.get_events(at(8), at(12)).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Standup");
    }

    #[test]
    fn query_is_chronological() {
        let store = MemoryCalendar::new();
        store.create_event(&draft("Later", 15)).unwrap();
        store.create_event(&draft("Earlier", 9)).unwrap();

        let events = store.get_events(at(0), at(23)).unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Earlier", "Later"]);
    }

    #[test]
    fn query_excludes_events_outside_the_window() {
        let store = MemoryCalendar::new();
        store.create_event(&draft("Morning", 7)).unwrap();
        store.create_event(&draft("Evening", 19)).unwrap();

        let events = store.get_events(at(9), at(17)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn update_patches_only_set_fields() {
        let store = MemoryCalendar::new();
        let created = store.create_event(&draft("Standup", 9)).unwrap();

        let patch = EventPatch {
            title: Some("Daily standup".to_string()),
            ..Default::default()
        };
        store.update_event(&created.id, &patch).unwrap();

        let events = store.get_events(at(0), at(23)).unwrap();
        assert_eq!(events[0].title, "Daily standup");
        assert_eq!(events[0].start, at(9));
    }

    #[test]
    fn delete_missing_event_errors() {
        let store = MemoryCalendar::new();
        assert!(store.delete_event("evt-404").is_err());
    }
}
