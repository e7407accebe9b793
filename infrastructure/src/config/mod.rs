//! Configuration file loading for callgate
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CALLGATE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./callgate.toml` or `./.callgate.toml`
//! 4. Global: `$XDG_CONFIG_HOME/callgate/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAssistantConfig, FileCalendarConfig, FileConfig,
    FileConfirmationConfig, FileEmailConfig, FileExchangeConfig, FileLoggingConfig,
    FileProviderConfig, FileReplConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
