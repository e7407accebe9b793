//! External service clients used by the function units.
//!
//! Each service is a trait (the seam the units are tested against) plus one
//! concrete client. Credentials are resolved on first use through
//! [`LazyHandle`], so a missing secret fails only the function that needs
//! it.

pub mod calendar;
pub mod exchange;
pub mod lazy;
pub mod mail;

pub use calendar::{
    CalendarEvent, CalendarService, CreatedEvent, GoogleCalendarClient, NewCalendarEvent, format_utc,
    parse_local_time,
};
pub use exchange::{CoinbaseClient, ExchangeService, OrderReceipt, OrderSide, OrderSize, ProductDetails};
pub use lazy::LazyHandle;
pub use mail::{MailService, OutgoingEmail, SmtpMailer};

use thiserror::Error;

/// Failures talking to an external collaborator.
///
/// Units convert these into `ExecutionResult::failure`; they never end a turn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0} is not set")]
    MissingCredential(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Request failed: {0}")]
    Http(String),

    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Rejected(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Http(e.to_string())
    }
}

/// Read a non-empty secret from the environment.
pub(crate) fn env_secret(name: &str) -> Result<String, ServiceError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ServiceError::MissingCredential(name.to_string()))
}

/// Turn a non-2xx response into [`ServiceError::Status`].
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}
