//! `create_order`: market buy or sell of a crypto asset.

use crate::services::{ExchangeService, OrderSide, OrderSize, ServiceError};
use async_trait::async_trait;
use callgate_domain::{ExecutionResult, FunctionArguments, FunctionSchema, FunctionUnit, OperationType};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;

/// Dollar amount requested by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Amount {
    Dollars(Decimal),
    /// Entire quote balance (buy) or entire asset holding (sell).
    All,
}

fn parse_amount(value: &Value) -> Result<Amount, String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.trim().eq_ignore_ascii_case("all") => return Ok(Amount::All),
        Value::String(s) => s.trim().trim_start_matches('$').to_string(),
        other => return Err(format!("amountInDollars must be a number or \"all\", got {}", other)),
    };
    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| format!("amountInDollars must be a number or \"all\", got {}", value))?;
    if amount <= Decimal::ZERO {
        return Err("amountInDollars must be positive".to_string());
    }
    Ok(Amount::Dollars(amount))
}

pub struct CreateOrderFunction {
    exchange: Arc<dyn ExchangeService>,
    quote_currency: String,
}

impl CreateOrderFunction {
    pub fn new(exchange: Arc<dyn ExchangeService>, quote_currency: impl Into<String>) -> Self {
        Self {
            exchange,
            quote_currency: quote_currency.into(),
        }
    }

    async fn place(&self, side: OrderSide, amount: Amount, asset: &str) -> Result<ExecutionResult, ServiceError> {
        let product_id = format!("{}-{}", asset, self.quote_currency);
        let product = self.exchange.product(&product_id).await?;
        if product.price <= Decimal::ZERO {
            return Err(ServiceError::InvalidResponse(format!("{} has no price", product_id)));
        }

        let size = match (side, amount) {
            (OrderSide::Buy, Amount::Dollars(dollars)) => {
                OrderSize::Quote(dollars.round_dp(product.quote_decimals))
            }
            (OrderSide::Buy, Amount::All) => {
                let balance = self.exchange.balance(&self.quote_currency).await?;
                OrderSize::Quote(
                    balance.round_dp_with_strategy(product.quote_decimals, RoundingStrategy::ToZero),
                )
            }
            (OrderSide::Sell, Amount::Dollars(dollars)) => {
                OrderSize::Base((dollars / product.price).round_dp(product.base_decimals))
            }
            (OrderSide::Sell, Amount::All) => {
                let holding = self.exchange.balance(asset).await?;
                OrderSize::Base(
                    holding.round_dp_with_strategy(product.base_decimals, RoundingStrategy::ToZero),
                )
            }
        };

        let rounded = match size {
            OrderSize::Quote(v) | OrderSize::Base(v) => v,
        };
        if rounded <= Decimal::ZERO {
            return Ok(ExecutionResult::failure(format!(
                "Order size rounds to zero for {}",
                product_id
            )));
        }

        let receipt = self.exchange.market_order(&product_id, side, size).await?;
        Ok(ExecutionResult::success()
            .with_field("order_id", receipt.order_id)
            .with_field("product_id", receipt.product_id)
            .with_field("side", receipt.side)
            .with_field("price", product.price.to_f64().map_or(Value::Null, Value::from))
            .with_field("rounded_amount", rounded.to_string()))
    }
}

#[async_trait]
impl FunctionUnit for CreateOrderFunction {
    fn schema(&self) -> FunctionSchema {
        FunctionSchema::new(
            "create_order",
            "Create a market order to buy or sell a crypto asset on an exchange.",
            OperationType::Write,
        )
        .with_required_parameter("action", json!({"type": "string", "enum": ["buy", "sell"]}))
        .with_required_parameter(
            "amountInDollars",
            json!({
                "type": ["number", "string"],
                "description": "The amount in dollars for the trade, or 'all' to use entire balance"
            }),
        )
        .with_required_parameter(
            "asset",
            json!({
                "type": "string",
                "description": "The asset to take the action in, must be the symbol of the asset in upper case"
            }),
        )
    }

    async fn execute(&self, args: &FunctionArguments) -> ExecutionResult {
        let side = match args.get("action").and_then(Value::as_str) {
            Some(a) if a.eq_ignore_ascii_case("buy") => OrderSide::Buy,
            Some(a) if a.eq_ignore_ascii_case("sell") => OrderSide::Sell,
            _ => return ExecutionResult::failure("action must be 'buy' or 'sell'"),
        };
        let amount = match args.get("amountInDollars").map(parse_amount) {
            Some(Ok(amount)) => amount,
            Some(Err(e)) => return ExecutionResult::failure(e),
            None => return ExecutionResult::failure("amountInDollars is required"),
        };
        let asset = match args.get("asset").and_then(Value::as_str) {
            Some(asset) if !asset.trim().is_empty() => asset.trim().to_uppercase(),
            _ => return ExecutionResult::failure("asset is required"),
        };

        self.place(side, amount, &asset)
            .await
            .unwrap_or_else(|e| ExecutionResult::failure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{OrderReceipt, ProductDetails};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    struct FakeExchange {
        price: Decimal,
        balances: HashMap<String, Decimal>,
        orders: Mutex<Vec<(String, OrderSide, OrderSize)>>,
    }

    impl FakeExchange {
        fn new(price: &str) -> Self {
            let mut balances = HashMap::new();
            balances.insert("USDC".to_string(), d("1234.5678"));
            balances.insert("ETH".to_string(), d("1.234567899"));
            Self {
                price: d(price),
                balances,
                orders: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ExchangeService for FakeExchange {
        async fn balance(&self, asset: &str) -> Result<Decimal, ServiceError> {
            Ok(self.balances.get(asset).copied().unwrap_or(Decimal::ZERO))
        }

        async fn product(&self, product_id: &str) -> Result<ProductDetails, ServiceError> {
            Ok(ProductDetails {
                product_id: product_id.to_string(),
                price: self.price,
                base_decimals: 8,
                quote_decimals: 2,
            })
        }

        async fn market_order(
            &self,
            product_id: &str,
            side: OrderSide,
            size: OrderSize,
        ) -> Result<OrderReceipt, ServiceError> {
            self.orders
                .lock()
                .unwrap()
                .push((product_id.to_string(), side, size));
            Ok(OrderReceipt {
                order_id: "ord-1".to_string(),
                product_id: product_id.to_string(),
                side: side.as_str().to_string(),
            })
        }
    }

    fn args(value: Value) -> FunctionArguments {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_buy_rounds_quote_size() {
        let exchange = Arc::new(FakeExchange::new("50000"));
        let unit = CreateOrderFunction::new(exchange.clone(), "USDC");

        let result = unit
            .execute(&args(json!({"action": "buy", "amountInDollars": 50.456, "asset": "btc"})))
            .await;

        assert!(result.is_success(), "{:?}", result);
        assert_eq!(result.get("rounded_amount"), Some(&json!("50.46")));
        assert_eq!(result.get("price"), Some(&json!(50000.0)));
        let orders = exchange.orders.lock().unwrap();
        assert_eq!(orders[0].0, "BTC-USDC");
        assert_eq!(orders[0].2, OrderSize::Quote(d("50.46")));
    }

    #[tokio::test]
    async fn test_sell_converts_dollars_to_base() {
        let exchange = Arc::new(FakeExchange::new("3000"));
        let unit = CreateOrderFunction::new(exchange.clone(), "USDC");

        let result = unit
            .execute(&args(json!({"action": "sell", "amountInDollars": "100", "asset": "ETH"})))
            .await;

        assert!(result.is_success());
        assert_eq!(
            exchange.orders.lock().unwrap()[0].2,
            OrderSize::Base(d("0.03333333"))
        );
    }

    #[tokio::test]
    async fn test_sell_all_never_exceeds_holding() {
        let exchange = Arc::new(FakeExchange::new("3000"));
        let unit = CreateOrderFunction::new(exchange.clone(), "USDC");

        let result = unit
            .execute(&args(json!({"action": "sell", "amountInDollars": "all", "asset": "ETH"})))
            .await;

        assert!(result.is_success());
        assert_eq!(result.get("rounded_amount"), Some(&json!("1.23456789")));
        assert_eq!(
            exchange.orders.lock().unwrap()[0].2,
            OrderSize::Base(d("1.23456789"))
        );
    }

    #[tokio::test]
    async fn test_buy_all_uses_quote_balance() {
        let exchange = Arc::new(FakeExchange::new("3000"));
        let unit = CreateOrderFunction::new(exchange.clone(), "USDC");

        unit.execute(&args(json!({"action": "buy", "amountInDollars": "ALL", "asset": "ETH"})))
            .await;
        assert_eq!(
            exchange.orders.lock().unwrap()[0].2,
            OrderSize::Quote(d("1234.56"))
        );
    }

    #[tokio::test]
    async fn test_bad_amount_is_a_failure_result() {
        let exchange = Arc::new(FakeExchange::new("3000"));
        let unit = CreateOrderFunction::new(exchange.clone(), "USDC");

        let result = unit
            .execute(&args(json!({"action": "buy", "amountInDollars": "lots", "asset": "ETH"})))
            .await;
        assert!(!result.is_success());

        let result = unit
            .execute(&args(json!({"action": "buy", "amountInDollars": -5, "asset": "ETH"})))
            .await;
        assert_eq!(result.error(), Some("amountInDollars must be positive"));
        assert!(exchange.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sell_all_of_nothing_is_rejected() {
        let exchange = Arc::new(FakeExchange::new("3000"));
        let unit = CreateOrderFunction::new(exchange.clone(), "USDC");

        let result = unit
            .execute(&args(json!({"action": "sell", "amountInDollars": "all", "asset": "SOL"})))
            .await;
        assert!(!result.is_success());
        assert!(exchange.orders.lock().unwrap().is_empty());
    }

    #[test]
    fn test_requires_confirmation() {
        let unit = CreateOrderFunction::new(Arc::new(FakeExchange::new("1")), "USDC");
        assert!(unit.requires_confirmation());
        assert!(unit.schema().validate().is_ok());
    }
}
