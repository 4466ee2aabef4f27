use crate::error::ExecutorError;
use api_client::{ApiClient, OrderResponse};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{Execution, OrderRequest};
use std::sync::Arc;

/// A generic trait for an execution engine.
///
/// `quoted_price` is the ask (for a buy) or bid (for a sell) the decision was
/// based on. Implementations fall back to it when the exchange does not report
/// an average fill price.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(
        &self,
        order: &OrderRequest,
        quoted_price: f64,
    ) -> Result<Execution, ExecutorError>;

    /// Looks up an order whose submission ended with an unknown outcome.
    ///
    /// `Ok(Some(_))` means the exchange holds the order and it counts as executed.
    /// `Ok(None)` means the exchange never saw it. Executors that cannot lose an
    /// order keep the default.
    async fn reconcile(
        &self,
        _order: &OrderRequest,
        _quoted_price: f64,
    ) -> Result<Option<Execution>, ExecutorError> {
        Ok(None)
    }
}

/// The "live" executor that sends real orders to the exchange via the ApiClient.
pub struct LiveExecutor {
    api_client: Arc<dyn ApiClient>,
}

impl LiveExecutor {
    pub fn new(api_client: Arc<dyn ApiClient>) -> Self {
        Self { api_client }
    }
}

#[async_trait]
impl Executor for LiveExecutor {
    /// Places the order and turns the exchange's answer into an `Execution`.
    ///
    /// Orders come back `filled`, `open` or `partially_filled` in the normal
    /// case; `failed` and `canceled` mean nothing was bought or sold.
    async fn execute(
        &self,
        order: &OrderRequest,
        quoted_price: f64,
    ) -> Result<Execution, ExecutorError> {
        order.validate()?;

        let response = self.api_client.place_order(order).await?;
        tracing::debug!(?response, "LiveExecutor: Received order response");

        confirmed_execution(order, response, quoted_price)
    }

    /// Searches the order list for the request's `client_order_id`.
    async fn reconcile(
        &self,
        order: &OrderRequest,
        quoted_price: f64,
    ) -> Result<Option<Execution>, ExecutorError> {
        let client_order_id = order.client_order_id.to_string();
        let found = self
            .api_client
            .get_orders()
            .await?
            .into_iter()
            .find(|o| o.client_order_id.as_deref() == Some(client_order_id.as_str()));

        match found {
            Some(response) => {
                tracing::info!(order_id = %response.id, state = %response.state, %client_order_id, "Found pending order at the exchange");
                confirmed_execution(order, response, quoted_price).map(Some)
            }
            None => Ok(None),
        }
    }
}

fn confirmed_execution(
    order: &OrderRequest,
    response: OrderResponse,
    quoted_price: f64,
) -> Result<Execution, ExecutorError> {
    if response.is_rejected() {
        return Err(ExecutorError::Rejected {
            order_id: response.id,
            state: response.state,
        });
    }

    let price = match response.average_price {
        Some(p) if p.is_finite() && p > 0.0 => p,
        _ => quoted_price,
    };

    Ok(Execution {
        client_order_id: order.client_order_id,
        order_id: Some(response.id),
        symbol: order.symbol.clone(),
        side: order.side,
        price,
        quantity: order.quantity,
        timestamp: Utc::now(),
        simulated: false,
    })
}

/// Fills every valid order immediately at the quoted price without touching the exchange.
#[derive(Debug, Default, Clone)]
pub struct PaperExecutor;

impl PaperExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for PaperExecutor {
    async fn execute(
        &self,
        order: &OrderRequest,
        quoted_price: f64,
    ) -> Result<Execution, ExecutorError> {
        order.validate()?;
        tracing::info!(
            side = %order.side,
            quantity = %order.quantity,
            price = quoted_price,
            "Dry run: simulating fill at quoted price"
        );

        Ok(Execution {
            client_order_id: order.client_order_id,
            order_id: None,
            symbol: order.symbol.clone(),
            side: order.side,
            price: quoted_price,
            quantity: order.quantity,
            timestamp: Utc::now(),
            simulated: true,
        })
    }
}
