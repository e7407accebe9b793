//! Brokerage service: balances, product details and market orders.
//!
//! [`CoinbaseClient`] speaks the Advanced Trade REST API
//! (`/accounts`, `/products/{id}`, `/orders`) with a bearer token read from
//! the environment on first use.

use super::{LazyHandle, ServiceError, check_status, env_secret};
use crate::config::FileExchangeConfig;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

/// Market order size: quote currency for buys, base asset for sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSize {
    Quote(Decimal),
    Base(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetails {
    pub product_id: String,
    pub price: Decimal,
    /// Decimal places allowed for base sizes.
    pub base_decimals: u32,
    /// Decimal places allowed for quote sizes.
    pub quote_decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: String,
    pub product_id: String,
    pub side: String,
}

#[async_trait]
pub trait ExchangeService: Send + Sync {
    /// Available balance of `asset`; zero when there is no such account.
    async fn balance(&self, asset: &str) -> Result<Decimal, ServiceError>;

    async fn product(&self, product_id: &str) -> Result<ProductDetails, ServiceError>;

    async fn market_order(
        &self,
        product_id: &str,
        side: OrderSide,
        size: OrderSize,
    ) -> Result<OrderReceipt, ServiceError>;
}

/// Decimal places implied by an increment string such as `"0.00000001"`.
pub fn increment_decimals(increment: &str) -> u32 {
    increment
        .split_once('.')
        .map(|(_, fraction)| fraction.trim_end_matches('0').len() as u32)
        .unwrap_or(0)
}

pub struct CoinbaseClient {
    http: reqwest::Client,
    base_url: String,
    token: LazyHandle<String>,
}

impl CoinbaseClient {
    pub fn new(config: &FileExchangeConfig) -> Self {
        let token_env = config.api_token_env.clone();
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: LazyHandle::new(move || env_secret(&token_env)),
        }
    }

    /// Client with an explicit token (tests, embedding).
    pub fn with_token(base_url: &str, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: LazyHandle::ready(token.into()),
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ServiceError> {
        let token = self.token.get().await?;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
struct Account {
    currency: String,
    available_balance: Amount,
}

#[derive(Debug, Deserialize)]
struct Amount {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    product_id: String,
    price: String,
    base_increment: String,
    quote_increment: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    success: bool,
    #[serde(default)]
    success_response: Option<OrderSuccess>,
    #[serde(default)]
    error_response: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OrderSuccess {
    order_id: String,
    product_id: String,
    side: String,
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, ServiceError> {
    Decimal::from_str(value)
        .map_err(|e| ServiceError::InvalidResponse(format!("{} '{}': {}", field, value, e)))
}

#[async_trait]
impl ExchangeService for CoinbaseClient {
    async fn balance(&self, asset: &str) -> Result<Decimal, ServiceError> {
        let response: AccountsResponse = self.get("/accounts?limit=250").await?;
        match response.accounts.iter().find(|a| a.currency == asset) {
            Some(account) => parse_decimal("balance", &account.available_balance.value),
            None => {
                debug!(asset = %asset, "No account for asset; balance is zero");
                Ok(Decimal::ZERO)
            }
        }
    }

    async fn product(&self, product_id: &str) -> Result<ProductDetails, ServiceError> {
        let product: ProductResponse = self.get(&format!("/products/{}", product_id)).await?;
        Ok(ProductDetails {
            price: parse_decimal("price", &product.price)?,
            base_decimals: increment_decimals(&product.base_increment),
            quote_decimals: increment_decimals(&product.quote_increment),
            product_id: product.product_id,
        })
    }

    async fn market_order(
        &self,
        product_id: &str,
        side: OrderSide,
        size: OrderSize,
    ) -> Result<OrderReceipt, ServiceError> {
        let token = self.token.get().await?;
        let configuration = match size {
            OrderSize::Quote(amount) => json!({ "quote_size": amount.to_string() }),
            OrderSize::Base(amount) => json!({ "base_size": amount.to_string() }),
        };
        let client_order_id = uuid::Uuid::new_v4().to_string();
        let body = json!({
            "client_order_id": client_order_id,
            "product_id": product_id,
            "side": side.as_str(),
            "order_configuration": { "market_market_ioc": configuration },
        });

        info!(product = %product_id, side = side.as_str(), client_order_id = %client_order_id, "Placing market order");
        let response = self
            .http
            .post(format!("{}/orders", self.base_url))
            .bearer_auth(token.as_str())
            .json(&body)
            .send()
            .await?;
        let response: OrderResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        match (response.success, response.success_response) {
            (true, Some(ok)) => Ok(OrderReceipt {
                order_id: ok.order_id,
                product_id: ok.product_id,
                side: ok.side,
            }),
            _ => {
                let reason = response
                    .error_response
                    .map(|e| {
                        e.get("message")
                            .or_else(|| e.get("error"))
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| e.to_string())
                    })
                    .unwrap_or_else(|| "order rejected".to_string());
                Err(ServiceError::Rejected(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_stub;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_increment_decimals() {
        assert_eq!(increment_decimals("0.00000001"), 8);
        assert_eq!(increment_decimals("0.01"), 2);
        assert_eq!(increment_decimals("0.010"), 2);
        assert_eq!(increment_decimals("1"), 0);
    }

    #[tokio::test]
    async fn test_balance_and_missing_account() {
        let accounts = r#"{"accounts":[{"currency":"BTC","available_balance":{"value":"0.25","currency":"BTC"}}],"has_next":false}"#;
        let server = http_stub::serve(vec![
            ("200 OK", "application/json", accounts.to_string()),
            ("200 OK", "application/json", accounts.to_string()),
        ])
        .await;
        let client = CoinbaseClient::with_token(&server.base_url, "tok");

        assert_eq!(client.balance("BTC").await.unwrap(), d("0.25"));
        assert_eq!(client.balance("DOGE").await.unwrap(), Decimal::ZERO);
        assert!(server.requests()[0].to_lowercase().contains("authorization: bearer tok"));
    }

    #[tokio::test]
    async fn test_product_details() {
        let product = r#"{"product_id":"ETH-USDC","price":"3120.55","base_increment":"0.00000001","quote_increment":"0.01"}"#;
        let server = http_stub::serve(vec![("200 OK", "application/json", product.to_string())]).await;
        let client = CoinbaseClient::with_token(&server.base_url, "tok");

        let details = client.product("ETH-USDC").await.unwrap();
        assert_eq!(details.price, d("3120.55"));
        assert_eq!(details.base_decimals, 8);
        assert_eq!(details.quote_decimals, 2);
        assert!(server.requests()[0].starts_with("GET /products/ETH-USDC"));
    }

    #[tokio::test]
    async fn test_market_order_body_and_receipt() {
        let ok = r#"{"success":true,"success_response":{"order_id":"o-1","product_id":"BTC-USDC","side":"BUY","client_order_id":"x"}}"#;
        let server = http_stub::serve(vec![("200 OK", "application/json", ok.to_string())]).await;
        let client = CoinbaseClient::with_token(&server.base_url, "tok");

        let receipt = client
            .market_order("BTC-USDC", OrderSide::Buy, OrderSize::Quote(d("50.00")))
            .await
            .unwrap();
        assert_eq!(receipt.order_id, "o-1");

        let request = &server.requests()[0];
        assert!(request.starts_with("POST /orders"));
        assert!(request.contains("\"quote_size\":\"50.00\""));
        assert!(request.contains("\"side\":\"BUY\""));
        assert!(request.contains("client_order_id"));
    }

    #[tokio::test]
    async fn test_rejected_order() {
        let rejected = r#"{"success":false,"error_response":{"error":"INSUFFICIENT_FUND","message":"Insufficient balance in source account"}}"#;
        let server = http_stub::serve(vec![("200 OK", "application/json", rejected.to_string())]).await;
        let client = CoinbaseClient::with_token(&server.base_url, "tok");

        let err = client
            .market_order("BTC-USDC", OrderSide::Sell, OrderSize::Base(d("1")))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Rejected("Insufficient balance in source account".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_token_fails_lazily() {
        let config = FileExchangeConfig {
            api_token_env: "CALLGATE_TEST_EXCHANGE_TOKEN_UNSET".to_string(),
            ..FileExchangeConfig::default()
        };
        let client = CoinbaseClient::new(&config);
        assert_eq!(
            client.balance("BTC").await.unwrap_err(),
            ServiceError::MissingCredential("CALLGATE_TEST_EXCHANGE_TOKEN_UNSET".to_string())
        );
    }
}
