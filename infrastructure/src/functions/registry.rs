//! Function Registry
//!
//! The [`FunctionRegistry`] maps function names to [`FunctionUnit`]s and
//! implements [`FunctionExecutorPort`].
//!
//! # Usage
//!
//! ```ignore
//! let mut registry = FunctionRegistry::new();
//! registry.register(Arc::new(GetBalanceFunction::new(exchange.clone())))?;
//! registry.register(Arc::new(CreateOrderFunction::new(exchange)))?;
//!
//! let result = registry.execute("get_balance", &args).await?;
//! ```
//!
//! # Registration
//!
//! Schemas are checked for well-formedness and names must be unique; a
//! duplicate is rejected with [`DomainError::DuplicateFunction`]. Listing
//! order is registration order.
//!
//! # Execution
//!
//! Arguments are validated against the unit's current schema before the
//! unit runs. A validation failure is returned as an `ExecutionResult` with
//! `success = false`, so the model can correct itself on the next turn.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use callgate_application::{FunctionExecutorPort, RegistryError};
use callgate_domain::{
    ArgumentValidator, DefaultArgumentValidator, DomainError, ExecutionResult, FunctionArguments,
    FunctionSchema, FunctionUnit, OperationType,
};

/// Name-keyed table of function units
pub struct FunctionRegistry {
    /// Units in registration order
    units: Vec<Arc<dyn FunctionUnit>>,
    /// Function name -> position in `units`
    index: HashMap<String, usize>,
    validator: Box<dyn ArgumentValidator + Send + Sync>,
}

impl FunctionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            index: HashMap::new(),
            validator: Box::new(DefaultArgumentValidator),
        }
    }

    pub fn with_validator(mut self, validator: impl ArgumentValidator + Send + Sync + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Register a unit under its schema name.
    pub fn register(&mut self, unit: Arc<dyn FunctionUnit>) -> Result<(), DomainError> {
        let schema = unit.schema();
        schema.validate()?;

        if self.index.contains_key(&schema.name) {
            return Err(DomainError::DuplicateFunction(schema.name));
        }

        tracing::debug!(
            function = %schema.name,
            operation = %schema.operation_type,
            "Registered function"
        );
        self.index.insert(schema.name, self.units.len());
        self.units.push(unit);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FunctionUnit>> {
        self.index.get(name).map(|i| &self.units[*i])
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn unit(&self, name: &str) -> Result<&Arc<dyn FunctionUnit>, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::UnknownFunction(name.to_string()))
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FunctionExecutorPort for FunctionRegistry {
    fn list_schemas(&self) -> Vec<FunctionSchema> {
        self.units.iter().map(|unit| unit.schema()).collect()
    }

    fn has_function(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn requires_confirmation(&self, name: &str) -> Result<bool, RegistryError> {
        Ok(self.unit(name)?.requires_confirmation())
    }

    fn operation_type(&self, name: &str) -> Result<OperationType, RegistryError> {
        Ok(self.unit(name)?.operation_type())
    }

    async fn execute(
        &self,
        name: &str,
        args: &FunctionArguments,
    ) -> Result<ExecutionResult, RegistryError> {
        let unit = self.unit(name)?;
        let schema = unit.schema();

        let args = match self.validator.validate(&schema, args) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(function = %name, error = %e, "Rejected function arguments");
                return Ok(ExecutionResult::failure(format!("Invalid arguments: {}", e)));
            }
        };

        Ok(unit.execute(&args).await)
    }

    fn function_names(&self) -> Vec<String> {
        self.units.iter().map(|unit| unit.schema().name).collect()
    }
}
