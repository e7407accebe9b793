//! External service settings (`[exchange]`, `[email]`, `[calendar]`)
//!
//! Only names of environment variables live here; secrets are read when a
//! function first needs them.

use serde::{Deserialize, Serialize};

/// Brokerage REST API used by `create_order` and `get_balance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExchangeConfig {
    pub base_url: String,
    /// Environment variable holding the bearer token.
    pub api_token_env: String,
    /// Quote currency of traded products (`{ASSET}-{QUOTE}`).
    pub quote_currency: String,
}

impl Default for FileExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coinbase.com/api/v3/brokerage".to_string(),
            api_token_env: "COINBASE_API_TOKEN".to_string(),
            quote_currency: "USDC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username_env: String,
    pub password_env: String,
}

impl Default for FileEmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username_env: "EMAIL_USERNAME".to_string(),
            password_env: "EMAIL_PASSWORD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCalendarConfig {
    pub base_url: String,
    /// Environment variable holding an OAuth access token.
    pub access_token_env: String,
    pub calendar_id: String,
    /// IANA zone used when a request names none.
    pub default_timezone: String,
}

impl Default for FileCalendarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            access_token_env: "GOOGLE_CALENDAR_TOKEN".to_string(),
            calendar_id: "primary".to_string(),
            default_timezone: "UTC".to_string(),
        }
    }
}
