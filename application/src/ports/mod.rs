//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod confirmation;
pub mod conversation_logger;
pub mod display;
pub mod function_executor;
pub mod llm_gateway;
