//! Calendar service: create and list events.
//!
//! [`GoogleCalendarClient`] calls the Calendar v3 REST API with an OAuth
//! access token read from the environment on first use. All times are sent
//! as UTC RFC 3339 with the requested zone alongside.

use super::{LazyHandle, ServiceError, check_status, env_secret};
use crate::config::FileCalendarConfig;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
    pub attendees: Vec<String>,
    pub add_conference: bool,
    pub recurrence: Vec<String>,
    /// `all`, `externalOnly` or `none`
    pub send_updates: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
    pub conference_link: Option<String>,
}

/// Event as reported back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub link: Option<String>,
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CreatedEvent, ServiceError>;

    /// Single (expanded) events between the bounds, ordered by start time.
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        max_results: u32,
    ) -> Result<Vec<CalendarEvent>, ServiceError>;
}

/// Parse `input` as an instant.
///
/// RFC 3339 strings keep their offset; naive `YYYY-MM-DDTHH:MM[:SS]` is read
/// as wall-clock time in `tz`.
pub fn parse_local_time(input: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| format!("'{}' is not an ISO date-time", input))?;

    // a DST gap has no valid wall-clock time; a fold takes the earlier one
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("'{}' does not exist in {}", input, tz))
}

pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub struct GoogleCalendarClient {
    http: reqwest::Client,
    base_url: String,
    calendar_id: String,
    token: LazyHandle<String>,
}

impl GoogleCalendarClient {
    pub fn new(config: &FileCalendarConfig) -> Self {
        let token_env = config.access_token_env.clone();
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            calendar_id: config.calendar_id.clone(),
            token: LazyHandle::new(move || env_secret(&token_env)),
        }
    }

    pub fn with_token(base_url: &str, calendar_id: &str, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            calendar_id: calendar_id.to_string(),
            token: LazyHandle::ready(token.into()),
        }
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.base_url, self.calendar_id)
    }
}

#[derive(Debug, Deserialize)]
struct EventResource {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start: Option<EventTime>,
    #[serde(default)]
    end: Option<EventTime>,
    #[serde(rename = "htmlLink", default)]
    html_link: Option<String>,
    #[serde(rename = "conferenceData", default)]
    conference_data: Option<Value>,
}

/// `dateTime` for timed events, `date` for all-day ones.
#[derive(Debug, Deserialize)]
struct EventTime {
    #[serde(rename = "dateTime", default)]
    date_time: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

impl EventTime {
    fn into_string(self) -> String {
        self.date_time.or(self.date).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<EventResource>,
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CreatedEvent, ServiceError> {
        let token = self.token.get().await?;
        let start = format_utc(&event.start);

        let mut body = json!({
            "summary": event.summary,
            "description": event.description,
            "start": { "dateTime": start, "timeZone": event.timezone },
            "end": { "dateTime": format_utc(&event.end), "timeZone": event.timezone },
        });
        if !event.attendees.is_empty() {
            body["attendees"] = event
                .attendees
                .iter()
                .map(|email| json!({ "email": email }))
                .collect();
        }
        if event.add_conference {
            body["conferenceData"] = json!({
                "createRequest": {
                    "requestId": format!("{}-{}", event.summary, start),
                    "conferenceSolutionKey": { "type": "hangoutsMeet" },
                }
            });
        }
        if !event.recurrence.is_empty() {
            body["recurrence"] = json!(event.recurrence);
        }

        info!(summary = %event.summary, start = %start, "Creating calendar event");
        let conference_version = if event.add_conference { "1" } else { "0" };
        let response = self
            .http
            .post(self.events_url())
            .bearer_auth(token.as_str())
            .query(&[
                ("conferenceDataVersion", conference_version),
                ("sendUpdates", event.send_updates.as_str()),
            ])
            .json(&body)
            .send()
            .await?;
        let created: EventResource = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        let conference_link = created.conference_data.as_ref().and_then(|data| {
            data.get("entryPoints")?
                .get(0)?
                .get("uri")?
                .as_str()
                .map(str::to_string)
        });
        Ok(CreatedEvent {
            id: created.id,
            html_link: created.html_link,
            conference_link,
        })
    }

    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        max_results: u32,
    ) -> Result<Vec<CalendarEvent>, ServiceError> {
        let token = self.token.get().await?;
        let response = self
            .http
            .get(self.events_url())
            .bearer_auth(token.as_str())
            .query(&[
                ("timeMin", format_utc(&time_min)),
                ("timeMax", format_utc(&time_max)),
                ("maxResults", max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await?;
        let list: EventList = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        Ok(list
            .items
            .into_iter()
            .map(|item| CalendarEvent {
                id: item.id,
                summary: item.summary.unwrap_or_else(|| "No title".to_string()),
                description: item.description.unwrap_or_default(),
                start: item.start.map(EventTime::into_string).unwrap_or_default(),
                end: item.end.map(EventTime::into_string).unwrap_or_default(),
                link: item.html_link,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_stub;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_naive_time_uses_zone() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let dt = parse_local_time("2026-01-15T09:30:00", tz).unwrap();
        assert_eq!(format_utc(&dt), "2026-01-15T14:30:00Z");
    }

    #[test]
    fn test_offset_time_ignores_zone() {
        let tz: Tz = "Asia/Tokyo".parse().unwrap();
        let dt = parse_local_time("2026-01-15T09:30:00Z", tz).unwrap();
        assert_eq!(format_utc(&dt), "2026-01-15T09:30:00Z");
    }

    #[test]
    fn test_dst_gap_is_rejected() {
        let tz: Tz = "Europe/Paris".parse().unwrap();
        assert!(parse_local_time("2026-03-29T02:30:00", tz).is_err());
        assert!(parse_local_time("tomorrow", tz).is_err());
    }

    #[tokio::test]
    async fn test_create_event_with_conference() {
        let created = r#"{"id":"ev1","htmlLink":"https://cal/ev1","conferenceData":{"entryPoints":[{"uri":"https://meet/abc"}]}}"#;
        let server = http_stub::serve(vec![("200 OK", "application/json", created.to_string())]).await;
        let client = GoogleCalendarClient::with_token(&server.base_url, "primary", "tok");

        let event = NewCalendarEvent {
            summary: "Standup".to_string(),
            description: String::new(),
            start: utc("2026-01-15T09:00:00Z"),
            end: utc("2026-01-15T09:15:00Z"),
            timezone: "UTC".to_string(),
            attendees: vec!["bob@example.com".to_string()],
            add_conference: true,
            recurrence: Vec::new(),
            send_updates: "none".to_string(),
        };
        let result = client.create_event(&event).await.unwrap();
        assert_eq!(result.html_link.as_deref(), Some("https://cal/ev1"));
        assert_eq!(result.conference_link.as_deref(), Some("https://meet/abc"));

        let request = &server.requests()[0];
        assert!(request.starts_with("POST /calendars/primary/events?conferenceDataVersion=1&sendUpdates=none"));
        assert!(request.contains("\"requestId\":\"Standup-2026-01-15T09:00:00Z\""));
        assert!(request.contains("\"attendees\":[{\"email\":\"bob@example.com\"}]"));
    }

    #[tokio::test]
    async fn test_list_events_defaults_missing_fields() {
        let list = r#"{"items":[{"id":"a","start":{"date":"2026-01-16"},"end":{"date":"2026-01-17"}},{"id":"b","summary":"Lunch","description":"Tacos","start":{"dateTime":"2026-01-16T12:00:00Z"},"end":{"dateTime":"2026-01-16T13:00:00Z"},"htmlLink":"https://cal/b"}]}"#;
        let server = http_stub::serve(vec![("200 OK", "application/json", list.to_string())]).await;
        let client = GoogleCalendarClient::with_token(&server.base_url, "primary", "tok");

        let events = client
            .list_events(utc("2026-01-15T00:00:00Z"), utc("2026-01-22T00:00:00Z"), 10)
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].summary, "No title");
        assert_eq!(events[0].start, "2026-01-16");
        assert_eq!(events[1].link.as_deref(), Some("https://cal/b"));

        let request = &server.requests()[0];
        assert!(request.contains("singleEvents=true"));
        assert!(request.contains("orderBy=startTime"));
        assert!(request.contains("maxResults=10"));
    }
}
