//! Function unit abstraction
//!
//! A [`FunctionUnit`] is one named capability the assistant may invoke:
//! placing an order, looking up a balance, sending an email, creating or
//! listing calendar events.
//!
//! ```text
//! ┌────────────────┐  schema()   ┌──────────────────┐
//! │ FunctionUnit   │────────────▶│ FunctionSchema   │──▶ decision protocol
//! │ (per capability│  execute()  ├──────────────────┤
//! │  trait object) │────────────▶│ ExecutionResult  │──▶ tool message
//! └────────────────┘             └──────────────────┘
//! ```
//!
//! Units are created once per registry entry. Side effects (network calls to
//! the collaborating service) happen only inside [`execute`](FunctionUnit::execute),
//! never inside [`schema`](FunctionUnit::schema). Service handles owned by a
//! unit are initialized lazily on first execution.

use async_trait::async_trait;

use super::entities::{FunctionArguments, FunctionSchema, OperationType};
use super::value_objects::ExecutionResult;

#[async_trait]
pub trait FunctionUnit: Send + Sync {
    /// Build the schema for this function.
    ///
    /// May embed caller-relative context such as the current time; it is
    /// evaluated at schema-build time, once per decision round.
    fn schema(&self) -> FunctionSchema;

    /// Run the function.
    ///
    /// Arguments have already been validated against the schema and had
    /// defaults applied. Failures are reported as `success = false`, never
    /// as a panic.
    async fn execute(&self, args: &FunctionArguments) -> ExecutionResult;

    /// Read or write. Units with a costly schema should override this.
    fn operation_type(&self) -> OperationType {
        self.schema().operation_type
    }

    /// Whether the operator must confirm before [`execute`](Self::execute) runs.
    ///
    /// Defaults to the operation type (write = confirm).
    fn requires_confirmation(&self) -> bool {
        self.operation_type().requires_confirmation()
    }
}
