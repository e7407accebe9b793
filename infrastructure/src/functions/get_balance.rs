//! `get_balance`: available balance of one asset.

use crate::services::ExchangeService;
use async_trait::async_trait;
use callgate_domain::{ExecutionResult, FunctionArguments, FunctionSchema, FunctionUnit, OperationType};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::warn;

pub struct GetBalanceFunction {
    exchange: Arc<dyn ExchangeService>,
}

impl GetBalanceFunction {
    pub fn new(exchange: Arc<dyn ExchangeService>) -> Self {
        Self { exchange }
    }
}

#[async_trait]
impl FunctionUnit for GetBalanceFunction {
    fn schema(&self) -> FunctionSchema {
        FunctionSchema::new(
            "get_balance",
            "Get the balance of a specific crypto asset in your account",
            OperationType::Read,
        )
        .with_required_parameter(
            "asset",
            json!({
                "type": "string",
                "description": "The asset symbol in upper case, or 'USDC' for USDC balance"
            }),
        )
    }

    async fn execute(&self, args: &FunctionArguments) -> ExecutionResult {
        let Some(asset) = args.get("asset").and_then(Value::as_str).map(str::to_uppercase) else {
            return ExecutionResult::failure("asset is required");
        };

        match self.exchange.balance(&asset).await {
            Ok(balance) => ExecutionResult::success()
                .with_field("asset", asset)
                .with_field("balance", balance.to_f64().map_or(Value::Null, Value::from)),
            Err(e) => {
                warn!(asset = %asset, error = %e, "Balance lookup failed");
                ExecutionResult::failure(format!("Failed to fetch {} balance: {}", asset, e))
            }
        }
    }
}
