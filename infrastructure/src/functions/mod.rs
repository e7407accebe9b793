//! Function units and their registry
//!
//! Each unit wraps one service client behind its trait. [`default_registry`]
//! wires the full catalogue from configuration; nothing touches the network
//! or reads credentials until a unit actually runs.

mod create_calendar_event;
mod create_order;
mod get_balance;
mod list_calendar_events;
mod registry;
mod send_email;

pub use create_calendar_event::CreateCalendarEventFunction;
pub use create_order::CreateOrderFunction;
pub use get_balance::GetBalanceFunction;
pub use list_calendar_events::ListCalendarEventsFunction;
pub use registry::FunctionRegistry;
pub use send_email::{SendEmailFunction, is_valid_email};

use crate::config::FileConfig;
use crate::services::{CoinbaseClient, GoogleCalendarClient, SmtpMailer};
use callgate_domain::DomainError;
use chrono_tz::Tz;
use std::sync::Arc;

/// Registry with every built-in function, in listing order.
pub fn default_registry(config: &FileConfig) -> Result<FunctionRegistry, DomainError> {
    let timezone: Tz = config
        .calendar
        .default_timezone
        .parse()
        .map_err(|_| DomainError::InvalidSchema {
            function: "create_calendar_event".to_string(),
            reason: format!("unknown time zone '{}'", config.calendar.default_timezone),
        })?;

    let exchange = Arc::new(CoinbaseClient::new(&config.exchange));
    let mailer = Arc::new(SmtpMailer::new(&config.email));
    let calendar = Arc::new(GoogleCalendarClient::new(&config.calendar));

    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(CreateOrderFunction::new(
        exchange.clone(),
        config.exchange.quote_currency.clone(),
    )))?;
    registry.register(Arc::new(GetBalanceFunction::new(exchange)))?;
    registry.register(Arc::new(SendEmailFunction::new(mailer)))?;
    registry.register(Arc::new(CreateCalendarEventFunction::new(calendar.clone(), timezone)))?;
    registry.register(Arc::new(ListCalendarEventsFunction::new(calendar, timezone)))?;
    Ok(registry)
}
