//! `list_calendar_events`: upcoming events in a time window.

use crate::services::{CalendarService, parse_local_time};
use async_trait::async_trait;
use callgate_domain::{ExecutionResult, FunctionArguments, FunctionSchema, FunctionUnit, OperationType};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde_json::{Value, json};
use std::sync::Arc;

const DEFAULT_MAX_RESULTS: u64 = 10;
const DEFAULT_WINDOW_DAYS: i64 = 7;

pub struct ListCalendarEventsFunction {
    calendar: Arc<dyn CalendarService>,
    default_timezone: Tz,
    clock: fn() -> DateTime<Utc>,
}

impl ListCalendarEventsFunction {
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

    /// Resolve the search window; absent bounds default to now and a week out.
    fn window(&self, args: &FunctionArguments) -> Result<(DateTime<Utc>, DateTime<Utc>), String> {
        let timezone = match args.get("timezone").and_then(Value::as_str) {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| format!("Unknown timezone: {}", name))?,
            None => self.default_timezone,
        };
        let now = (self.clock)();

        let bound = |key: &str, fallback: DateTime<Utc>| match args.get(key).and_then(Value::as_str) {
            Some(raw) => parse_local_time(raw, timezone).map_err(|e| format!("{}: {}", key, e)),
            None => Ok(fallback),
        };
        let time_min = bound("time_min", now)?;
        let time_max = bound("time_max", now + Duration::days(DEFAULT_WINDOW_DAYS))?;
        if time_max <= time_min {
            return Err("time_max must be after time_min".to_string());
        }
        Ok((time_min, time_max))
    }
}

#[async_trait]
impl FunctionUnit for ListCalendarEventsFunction {
    fn schema(&self) -> FunctionSchema {
        let tz = self.default_timezone;
        let now = (self.clock)().with_timezone(&tz);

        FunctionSchema::new(
            "list_calendar_events",
            format!(
                "Lists your upcoming calendar events. Current time reference: {} ({})",
                now.to_rfc3339(),
                tz
            ),
            OperationType::Read,
        )
        .with_parameter(
            "max_results",
            json!({
                "type": "integer",
                "description": "Maximum number of events to return (default: 10)",
                "minimum": 1,
                "maximum": 100,
                "default": DEFAULT_MAX_RESULTS
            }),
        )
        .with_parameter(
            "time_min",
            json!({
                "type": "string",
                "description": "Start of the search range in ISO format (YYYY-MM-DDTHH:MM:SS). Default: current time"
            }),
        )
        .with_parameter(
            "time_max",
            json!({
                "type": "string",
                "description": "End of the search range in ISO format (YYYY-MM-DDTHH:MM:SS). Default: 7 days from now"
            }),
        )
        .with_parameter(
            "timezone",
            json!({
                "type": "string",
                "description": format!(
                    "Timezone for the search (default: {}). Use IANA timezone names (e.g., America/New_York, Europe/London)",
                    tz
                ),
                "default": tz.name()
            }),
        )
    }

    fn operation_type(&self) -> OperationType {
        OperationType::Read
    }

    async fn execute(&self, args: &FunctionArguments) -> ExecutionResult {
        let (time_min, time_max) = match self.window(args) {
            Ok(window) => window,
            Err(e) => return ExecutionResult::failure(e),
        };
        let max_results = args
            .get("max_results")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .clamp(1, 100) as u32;

        match self.calendar.list_events(time_min, time_max, max_results).await {
            Ok(events) => {
                let message = if events.is_empty() {
                    "No upcoming events found.".to_string()
                } else {
                    format!("Found {} events", events.len())
                };
                ExecutionResult::success()
                    .with_field("message", message)
                    .with_field("events", serde_json::to_value(&events).unwrap_or_default())
            }
            Err(e) => ExecutionResult::failure(format!("Failed to list events: {}", e)),
        }
    }
}
