//! Function domain: callable capabilities and their contracts.
//!
//! - [`entities::FunctionSchema`]: name, description, read/write kind, parameter schema
//! - [`unit::FunctionUnit`]: the capability trait every function implements
//! - [`value_objects::ExecutionResult`]: uniform success/failure result
//! - [`validation`]: argument checking and default filling against a schema

pub mod entities;
pub mod unit;
pub mod validation;
pub mod value_objects;
