// crates/core/src/google.rs

//! Google Calendar REST backend.
//!
//! Uses the Calendar v3 API with an API key (read) and/or an OAuth2 bearer
//! token (write). Network failures and API errors surface as store errors;
//! the executor folds them into tool results.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};

use crate::calendar::{CalendarEvent, CalendarStore, CreatedEvent, EventDraft, EventPatch};
use crate::config::AgentConfig;

const API_ROOT: &str = "https://www.googleapis.com/calendar/v3/calendars";

pub struct GoogleCalendar {
    client: Client,
    calendar_id: String,
    api_key: Option<String>,
    access_token: Option<String>,
    timezone: String,
}

impl GoogleCalendar {
    pub fn new(
        calendar_id: &str,
        api_key: Option<String>,
        access_token: Option<String>,
        config: &AgentConfig,
    ) -> Result<Self> {
        if api_key.is_none() && access_token.is_none() {
            anyhow::bail!("Google Calendar needs an API key or an access token");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            calendar_id: calendar_id.to_string(),
            api_key,
            access_token,
            timezone: config.timezone.name().to_string(),
        })
    }

    /// Environment variables:
    /// - GOOGLE_CALENDAR_ID (default "primary")
    /// - GOOGLE_API_KEY (read access)
    /// - GOOGLE_ACCESS_TOKEN (write access)
    pub fn from_env(config: &AgentConfig) -> Result<Self> {
        let calendar_id =
            std::env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| "primary".to_string());
        let api_key = std::env::var("GOOGLE_API_KEY").ok();
        let access_token = std::env::var("GOOGLE_ACCESS_TOKEN").ok();

        Self::new(&calendar_id, api_key, access_token, config)
    }

    fn events_url(&self) -> String {
        format!("{}/{}/events", API_ROOT, urlencoding::encode(&self.calendar_id))
    }

    fn event_url(&self, id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(id))
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        let req = match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        match &self.api_key {
            Some(key) => req.query(&[("key", key.as_str())]),
            None => req,
        }
    }

    fn write_token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .context("GOOGLE_ACCESS_TOKEN required for calendar writes")
    }
}

impl CalendarStore for GoogleCalendar {
    fn get_events(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<CalendarEvent>> {
        let request = self
            .client
            .get(self.events_url())
            .query(&[
                ("timeMin", start.to_rfc3339().as_str()),
                ("timeMax", end.to_rfc3339().as_str()),
                ("timeZone", self.timezone.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", "250"),
            ]);

        let response = self
            .authed(request)
            .send()
            .context("calendar list request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("calendar API error {}: {}", status, body);
        }

        let body: Value = response
            .json()
            .context("failed to parse calendar list response")?;

        let events = body["items"]
            .as_array()
            .map(|items| items.iter().filter_map(parse_event).collect())
            .unwrap_or_default();

        Ok(events)
    }

    fn create_event(&self, draft: &EventDraft) -> Result<CreatedEvent> {
        let token = self.write_token()?;

        let body = json!({
            "summary": draft.title,
            "description": draft.description,
            "location": draft.location,
            "start": { "dateTime": draft.start.to_rfc3339(), "timeZone": self.timezone },
            "end": { "dateTime": draft.end.to_rfc3339(), "timeZone": self.timezone },
        });

        let response = self
            .client
            .post(self.events_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .context("create event request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("create event error {}: {}", status, body);
        }

        let result: Value = response
            .json()
            .context("failed to parse create response")?;

        Ok(CreatedEvent {
            id: result["id"].as_str().unwrap_or("unknown").to_string(),
            link: result["htmlLink"].as_str().map(String::from),
        })
    }

    fn update_event(&self, id: &str, patch: &EventPatch) -> Result<()> {
        let token = self.write_token()?;

        let mut body = serde_json::Map::new();
        if let Some(title) = &patch.title {
            body.insert("summary".to_string(), json!(title));
        }
        if let Some(start) = patch.start {
            body.insert(
                "start".to_string(),
                json!({ "dateTime": start.to_rfc3339(), "timeZone": self.timezone }),
            );
        }
        if let Some(end) = patch.end {
            body.insert(
                "end".to_string(),
                json!({ "dateTime": end.to_rfc3339(), "timeZone": self.timezone }),
            );
        }
        if let Some(location) = &patch.location {
            body.insert("location".to_string(), json!(location));
        }
        if let Some(description) = &patch.description {
            body.insert("description".to_string(), json!(description));
        }

        let response = self
            .client
            .patch(self.event_url(id))
            .bearer_auth(token)
            .json(&Value::Object(body))
            .send()
            .context("update event request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("update event error {}: {}", status, body);
        }

        Ok(())
    }

    fn delete_event(&self, id: &str) -> Result<()> {
        let token = self.write_token()?;

        let response = self
            .client
            .delete(self.event_url(id))
            .bearer_auth(token)
            .send()
            .context("delete event request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("delete event error {}: {}", status, body);
        }

        Ok(())
    }
}

/// Extract one event from a list-response item. All-day events carry a bare
/// date; they are normalized to midnight UTC.
fn parse_event(item: &Value) -> Option<CalendarEvent> {
    let id = item["id"].as_str()?.to_string();
    let title = item["summary"].as_str().unwrap_or("(untitled)").to_string();
    let start = parse_when(&item["start"])?;
    let end = parse_when(&item["end"])?;

    Some(CalendarEvent {
        id,
        title,
        start,
        end,
        location: item["location"].as_str().map(String::from),
        description: item["description"].as_str().map(String::from),
    })
}

fn parse_when(node: &Value) -> Option<DateTime<FixedOffset>> {
    if let Some(dt) = node["dateTime"].as_str() {
        return DateTime::parse_from_rfc3339(dt).ok();
    }
    let date = NaiveDate::parse_from_str(node["date"].as_str()?, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(midnight.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timed_events() {
        let item = json!({
            "id": "abc",
            "summary": "Standup",
            "start": { "dateTime": "2026-08-24T09:00:00+02:00" },
            "end": { "dateTime": "2026-08-24T09:15:00+02:00" },
            "location": "Room 1"
        });
        let event = parse_event(&item).unwrap();
        assert_eq!(event.id, "abc");
        assert_eq!(event.title, "Standup");
        assert_eq!(event.location.as_deref(), Some("Room 1"));
        assert_eq!(event.start.to_rfc3339(), "2026-08-24T09:00:00+02:00");
    }

    #[test]
    fn parses_all_day_events() {
        let item = json!({
            "id": "xyz",
            "summary": "Holiday",
            "start": { "date": "2026-08-24" },
            "end": { "date": "2026-08-25" }
        });
        let event = parse_event(&item).unwrap();
        assert_eq!(event.start.to_rfc3339(), "2026-08-24T00:00:00+00:00");
    }

    #[test]
    fn items_without_id_are_skipped() {
        let item = json!({ "summary": "ghost" });
        assert!(parse_event(&item).is_none());
    }
}
