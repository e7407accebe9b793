//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: registration and state machine errors

pub mod error;
