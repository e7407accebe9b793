//! Function executor port
//!
//! Defines how the turn loop lists, inspects and dispatches functions.
//! The registry adapter lives in the infrastructure layer.

use async_trait::async_trait;
use callgate_domain::{ExecutionResult, FunctionArguments, FunctionSchema, OperationType};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
}

#[async_trait]
pub trait FunctionExecutorPort: Send + Sync {
    /// Schemas of every registered function, in registration order.
    fn list_schemas(&self) -> Vec<FunctionSchema>;

    fn has_function(&self, name: &str) -> bool;

    /// Whether running `name` needs operator confirmation.
    fn requires_confirmation(&self, name: &str) -> Result<bool, RegistryError>;

    fn operation_type(&self, name: &str) -> Result<OperationType, RegistryError>;

    /// Validate `args` against the function's schema and run it.
    ///
    /// Invalid arguments and unit failures come back as an
    /// [`ExecutionResult`] with `success = false`; only an unknown name is
    /// an error.
    async fn execute(
        &self,
        name: &str,
        args: &FunctionArguments,
    ) -> Result<ExecutionResult, RegistryError>;

    /// Names of all registered functions.
    fn function_names(&self) -> Vec<String> {
        self.list_schemas().into_iter().map(|s| s.name).collect()
    }
}
