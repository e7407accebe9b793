//! `create_calendar_event`: add an event to the user's calendar.

use crate::services::{CalendarService, NewCalendarEvent, parse_local_time};
use async_trait::async_trait;
use callgate_domain::{ExecutionResult, FunctionArguments, FunctionSchema, FunctionUnit, OperationType};
use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use serde_json::{Value, json};
use std::sync::Arc;

const WALL_CLOCK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct CreateCalendarEventFunction {
    calendar: Arc<dyn CalendarService>,
    default_timezone: Tz,
    clock: fn() -> DateTime<Utc>,
}

impl CreateCalendarEventFunction {
    pub fn new(calendar: Arc<dyn CalendarService>, default_timezone: Tz) -> Self {
        Self {
            calendar,
            default_timezone,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn request(&self, args: &FunctionArguments) -> Result<NewCalendarEvent, String> {
        let timezone = match args.get("timezone").and_then(Value::as_str) {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| format!("Unknown timezone: {}", name))?,
            None => self.default_timezone,
        };

        let time_arg = |key: &str| -> Result<DateTime<Utc>, String> {
            let raw = args
                .get(key)
                .and_then(Value::as_str)
                .ok_or_else(|| format!("{} is required", key))?;
            parse_local_time(raw, timezone).map_err(|e| format!("{}: {}", key, e))
        };
        let start = time_arg("start_time")?;
        let end = time_arg("end_time")?;
        if end <= start {
            return Err("end_time must be after start_time".to_string());
        }

        Ok(NewCalendarEvent {
            summary: string_arg(args, "summary"),
            description: string_arg(args, "description"),
            start,
            end,
            timezone: timezone.name().to_string(),
            attendees: string_list(args, "attendees"),
            add_conference: args
                .get("add_conference")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            recurrence: string_list(args, "recurrence"),
            send_updates: args
                .get("send_updates")
                .and_then(Value::as_str)
                .unwrap_or("none")
                .to_string(),
        })
    }
}

fn string_arg(args: &FunctionArguments, key: &str) -> String {
    args.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(args: &FunctionArguments, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl FunctionUnit for CreateCalendarEventFunction {
    /// The description embeds the current wall-clock time so the model can
    /// resolve "tomorrow at 3pm" without asking.
    fn schema(&self) -> FunctionSchema {
        let tz = self.default_timezone;
        let now = (self.clock)().with_timezone(&tz);
        let current = now.format(WALL_CLOCK_FORMAT).to_string();
        let later = (now.with_minute(0).and_then(|t| t.with_second(0)).unwrap_or(now) + Duration::hours(2))
            .format(WALL_CLOCK_FORMAT)
            .to_string();

        FunctionSchema::new(
            "create_calendar_event",
            format!(
                "Creates an event in the calendar of the user. Current time reference: {} ({})",
                current, tz
            ),
            OperationType::Write,
        )
        .with_required_parameter(
            "summary",
            json!({"type": "string", "description": "Title of the event"}),
        )
        .with_parameter(
            "description",
            json!({"type": "string", "description": "Description of the event"}),
        )
        .with_required_parameter(
            "start_time",
            json!({
                "type": "string",
                "description": format!("Start time in ISO format (YYYY-MM-DDTHH:MM:SS). Example for now: {}", current)
            }),
        )
        .with_required_parameter(
            "end_time",
            json!({
                "type": "string",
                "description": format!("End time in ISO format (YYYY-MM-DDTHH:MM:SS). Example for 2 hours from now: {}", later)
            }),
        )
        .with_parameter(
            "timezone",
            json!({
                "type": "string",
                "description": format!(
                    "Timezone for the event (default: {}). Use IANA timezone names (e.g., America/New_York, Europe/London)",
                    tz
                ),
                "default": tz.name()
            }),
        )
        .with_parameter(
            "attendees",
            json!({
                "type": "array",
                "description": "List of attendee email addresses",
                "items": {"type": "string", "format": "email"}
            }),
        )
        .with_parameter(
            "add_conference",
            json!({
                "type": "boolean",
                "description": "Whether to add a Google Meet conference to the event. If not mentioned, it must be set to false",
                "default": false
            }),
        )
        .with_parameter(
            "recurrence",
            json!({
                "type": "array",
                "description": "RRULE strings for recurring events (e.g., ['RRULE:FREQ=DAILY;COUNT=2'])",
                "items": {"type": "string"}
            }),
        )
        .with_parameter(
            "send_updates",
            json!({
                "type": "string",
                "description": "Whether to send notifications about the creation of the event. If not mentioned, it will be set to 'none'",
                "enum": ["all", "externalOnly", "none"],
                "default": "none"
            }),
        )
    }

    fn operation_type(&self) -> OperationType {
        OperationType::Write
    }

    async fn execute(&self, args: &FunctionArguments) -> ExecutionResult {
        let request = match self.request(args) {
            Ok(request) => request,
            Err(e) => return ExecutionResult::failure(e),
        };

        match self.calendar.create_event(&request).await {
            Ok(created) => ExecutionResult::success()
                .with_field(
                    "message",
                    format!(
                        "Event created successfully in {}. Event ID: {}",
                        request.timezone, created.id
                    ),
                )
                .with_field("event_link", created.html_link)
                .with_field(
                    "conference_link",
                    created.conference_link.filter(|_| request.add_conference),
                ),
            Err(e) => ExecutionResult::failure(format!("Failed to create event: {}", e)),
        }
    }
}
