use crate::auth::{authorization_headers, signing_key_from_base64};
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::Utc;
use configuration::ExchangeConfig;
use core_types::{OrderRequest, OrderSide, OrderType};
use ed25519_dalek::SigningKey;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};

pub mod auth;
pub mod error;
pub mod responses;
// --- Public API ---
pub use responses::{
    AccountResponse, BestBidAsk, EstimatedPrice, Holding, OrderResponse, Paginated, TradingPair,
};

/// Every endpoint lives under this prefix; it is part of the signed path.
pub const API_PREFIX: &str = "/api/v1/crypto";

/// Which side of the book an estimated price is quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSide {
    Bid,
    Ask,
    Both,
}

impl QuoteSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteSide::Bid => "bid",
            QuoteSide::Ask => "ask",
            QuoteSide::Both => "both",
        }
    }
}

/// The interface the engine, executor and CLI use to talk to the exchange.
/// Tests substitute a scripted implementation.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Fetches the account summary, including buying power. (Authenticated)
    async fn get_account(&self) -> Result<AccountResponse, ApiError>;

    /// Lists trading pairs, optionally filtered by symbol.
    async fn get_trading_pairs(&self, symbols: &[&str]) -> Result<Vec<TradingPair>, ApiError>;

    /// Lists holdings, optionally filtered by asset code.
    async fn get_holdings(&self, asset_codes: &[&str]) -> Result<Vec<Holding>, ApiError>;

    /// Fetches the best bid/ask quote for each symbol.
    async fn get_best_bid_ask(&self, symbols: &[&str]) -> Result<Vec<BestBidAsk>, ApiError>;

    /// Estimates the execution price of one or more hypothetical order sizes.
    async fn get_estimated_price(
        &self,
        symbol: &str,
        side: QuoteSide,
        quantities: &[Decimal],
    ) -> Result<Vec<EstimatedPrice>, ApiError>;

    /// Places a new order on the exchange.
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderResponse, ApiError>;

    /// Requests cancellation of an open order. The exchange answers with free text.
    async fn cancel_order(&self, order_id: &str) -> Result<String, ApiError>;

    async fn get_order(&self, order_id: &str) -> Result<OrderResponse, ApiError>;

    async fn get_orders(&self) -> Result<Vec<OrderResponse>, ApiError>;
}

/// Builds `?key=a&key=b`, or an empty string when there are no values.
pub fn query_params(key: &str, values: &[&str]) -> String {
    if values.is_empty() {
        return String::new();
    }
    let pairs = values
        .iter()
        .map(|v| format!("{}={}", key, v))
        .collect::<Vec<_>>()
        .join("&");
    format!("?{}", pairs)
}

// --- Order body ---

#[derive(Serialize)]
struct OrderBody<'a> {
    client_order_id: String,
    side: OrderSide,
    #[serde(rename = "type")]
    order_type: OrderType,
    symbol: &'a str,
    #[serde(flatten)]
    config: OrderConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum OrderConfig {
    MarketOrderConfig {
        asset_quantity: String,
    },
    LimitOrderConfig {
        asset_quantity: String,
        limit_price: String,
        time_in_force: &'static str,
    },
}

fn order_body(order: &OrderRequest) -> Result<String, ApiError> {
    let config = match order.order_type {
        OrderType::Market => OrderConfig::MarketOrderConfig {
            asset_quantity: order.quantity.normalize().to_string(),
        },
        OrderType::Limit => {
            let price = order.limit_price.ok_or_else(|| {
                ApiError::InvalidData("limit order without a limit price".to_string())
            })?;
            OrderConfig::LimitOrderConfig {
                asset_quantity: order.quantity.normalize().to_string(),
                limit_price: price.normalize().to_string(),
                time_in_force: "gtc",
            }
        }
    };
    let body = OrderBody {
        client_order_id: order.client_order_id.to_string(),
        side: order.side,
        order_type: order.order_type,
        symbol: &order.symbol,
        config,
    };
    serde_json::to_string(&body).map_err(|e| ApiError::InvalidData(e.to_string()))
}

/// Signed REST client for the crypto trading API.
#[derive(Clone)]
pub struct CryptoTradingClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    signing_key: SigningKey,
}

impl CryptoTradingClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, ApiError> {
        let signing_key = signing_key_from_base64(&config.private_key)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            signing_key,
        })
    }

    /// Sends a signed request and returns the raw response text.
    ///
    /// `path` includes the query string, since the exchange verifies the
    /// signature over the full request target.
    async fn send_signed_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<String, ApiError> {
        let timestamp = Utc::now().timestamp();
        let body = body.unwrap_or_default();
        let headers = authorization_headers(
            &self.signing_key,
            &self.api_key,
            timestamp,
            path,
            method.as_str(),
            &body,
        )?;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, path, "Sending signed request");

        let mut request = self.client.request(method, &url).headers(headers);
        if !body.is_empty() {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            tracing::warn!(status = status.as_u16(), path, body = %text, "Exchange rejected request");
            Err(ApiError::Exchange {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T, ApiError> {
        let text = self.send_signed_raw(method, path, body).await?;
        serde_json::from_str::<T>(&text).map_err(|e| {
            ApiError::Deserialization(format!("{}. Original text: {}", e, text))
        })
    }
}

#[async_trait]
impl ApiClient for CryptoTradingClient {
    async fn get_account(&self) -> Result<AccountResponse, ApiError> {
        let path = format!("{}/trading/accounts/", API_PREFIX);
        self.send_signed(Method::GET, &path, None).await
    }

    async fn get_trading_pairs(&self, symbols: &[&str]) -> Result<Vec<TradingPair>, ApiError> {
        let path = format!(
            "{}/trading/trading_pairs/{}",
            API_PREFIX,
            query_params("symbol", symbols)
        );
        let page: Paginated<TradingPair> = self.send_signed(Method::GET, &path, None).await?;
        Ok(page.results)
    }

    async fn get_holdings(&self, asset_codes: &[&str]) -> Result<Vec<Holding>, ApiError> {
        let path = format!(
            "{}/trading/holdings/{}",
            API_PREFIX,
            query_params("asset_code", asset_codes)
        );
        let page: Paginated<Holding> = self.send_signed(Method::GET, &path, None).await?;
        Ok(page.results)
    }

    async fn get_best_bid_ask(&self, symbols: &[&str]) -> Result<Vec<BestBidAsk>, ApiError> {
        let path = format!(
            "{}/marketdata/best_bid_ask/{}",
            API_PREFIX,
            query_params("symbol", symbols)
        );
        let page: Paginated<BestBidAsk> = self.send_signed(Method::GET, &path, None).await?;
        Ok(page.results)
    }

    async fn get_estimated_price(
        &self,
        symbol: &str,
        side: QuoteSide,
        quantities: &[Decimal],
    ) -> Result<Vec<EstimatedPrice>, ApiError> {
        if quantities.is_empty() {
            return Err(ApiError::InvalidData(
                "at least one quantity is required".to_string(),
            ));
        }
        let quantity = quantities
            .iter()
            .map(|q| q.normalize().to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "{}/marketdata/estimated_price/?symbol={}&side={}&quantity={}",
            API_PREFIX,
            symbol,
            side.as_str(),
            quantity
        );
        let page: Paginated<EstimatedPrice> = self.send_signed(Method::GET, &path, None).await?;
        Ok(page.results)
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderResponse, ApiError> {
        let path = format!("{}/trading/orders/", API_PREFIX);
        let body = order_body(order)?;
        tracing::info!(
            client_order_id = %order.client_order_id,
            side = %order.side,
            quantity = %order.quantity,
            symbol = %order.symbol,
            "Placing order"
        );
        self.send_signed(Method::POST, &path, Some(body)).await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<String, ApiError> {
        let path = format!("{}/trading/orders/{}/cancel/", API_PREFIX, order_id);
        self.send_signed_raw(Method::POST, &path, None).await
    }

    async fn get_order(&self, order_id: &str) -> Result<OrderResponse, ApiError> {
        let path = format!("{}/trading/orders/{}/", API_PREFIX, order_id);
        self.send_signed(Method::GET, &path, None).await
    }

    async fn get_orders(&self) -> Result<Vec<OrderResponse>, ApiError> {
        let path = format!("{}/trading/orders/", API_PREFIX);
        let page: Paginated<OrderResponse> = self.send_signed(Method::GET, &path, None).await?;
        Ok(page.results)
    }
}
