use api_client::error::ApiError;
use api_client::{
    AccountResponse, ApiClient, BestBidAsk, EstimatedPrice, Holding, OrderResponse, QuoteSide,
    TradingPair,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use configuration::TradingParams;
use core_types::{OrderRequest, OrderSide, PositionState};
use database::{connect, run_migrations, DbRepository};
use engine::error::EngineError;
use engine::market_data::{MISSING_BUYING_POWER_MESSAGE, MISSING_PRICE_MESSAGE};
use engine::{LiveEngine, TickOutcome};
use events::{StatusPublisher, StatusReader};
use executor::{Executor, LiveExecutor, PaperExecutor};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

enum Quote {
    Prices { mid: f64, ask: f64, bid: f64 },
    /// A 200 response whose `results` list is empty.
    Empty,
    /// A 5xx from the exchange.
    Down,
}

fn prices(mid: f64, ask: f64, bid: f64) -> Quote {
    Quote::Prices { mid, ask, bid }
}

/// How `place_order` misbehaves, when it does.
#[derive(Clone, Copy)]
enum PlaceFailure {
    /// The exchange accepts the order but the reply cannot be decoded.
    LostReply,
    /// A 503 before the exchange recorded anything.
    Unavailable,
}

/// An exchange that replays a fixed script of quotes and records placed orders.
struct ScriptedClient {
    quotes: Mutex<VecDeque<Quote>>,
    buying_power: Mutex<Option<f64>>,
    order_state: &'static str,
    orders: Mutex<Vec<OrderRequest>>,
    place_failure: Mutex<Option<PlaceFailure>>,
}

impl ScriptedClient {
    fn new(quotes: Vec<Quote>, order_state: &'static str) -> Arc<Self> {
        Arc::new(Self {
            quotes: Mutex::new(quotes.into()),
            buying_power: Mutex::new(Some(1000.0)),
            order_state,
            orders: Mutex::new(Vec::new()),
            place_failure: Mutex::new(None),
        })
    }

    fn failing(quotes: Vec<Quote>, failure: PlaceFailure) -> Arc<Self> {
        let client = Self::new(quotes, "filled");
        *client.place_failure.lock().unwrap() = Some(failure);
        client
    }

    fn response_for(&self, index: usize, order: &OrderRequest) -> OrderResponse {
        OrderResponse {
            id: format!("ord-{}", index + 1),
            account_number: None,
            client_order_id: Some(order.client_order_id.to_string()),
            side: order.side,
            symbol: Some(order.symbol.clone()),
            order_type: Some("market".to_string()),
            state: self.order_state.to_string(),
            average_price: None,
            filled_asset_quantity: None,
            executions: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn placed(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for ScriptedClient {
    async fn get_account(&self) -> Result<AccountResponse, ApiError> {
        Ok(AccountResponse {
            account_number: Some("ACC-1".to_string()),
            status: Some("active".to_string()),
            buying_power: *self.buying_power.lock().unwrap(),
            buying_power_currency: Some("USD".to_string()),
        })
    }

    async fn get_trading_pairs(&self, _: &[&str]) -> Result<Vec<TradingPair>, ApiError> {
        unimplemented!()
    }

    async fn get_holdings(&self, _: &[&str]) -> Result<Vec<Holding>, ApiError> {
        unimplemented!()
    }

    async fn get_best_bid_ask(&self, symbols: &[&str]) -> Result<Vec<BestBidAsk>, ApiError> {
        let quote = self
            .quotes
            .lock()
            .unwrap()
            .pop_front()
            .expect("quote script exhausted");
        match quote {
            Quote::Prices { mid, ask, bid } => Ok(vec![BestBidAsk {
                symbol: symbols[0].to_string(),
                price: mid,
                bid_inclusive_of_sell_spread: bid,
                ask_inclusive_of_buy_spread: ask,
                sell_spread: None,
                buy_spread: None,
                timestamp: None,
            }]),
            Quote::Empty => Ok(Vec::new()),
            Quote::Down => Err(ApiError::Exchange {
                status: 503,
                body: "service unavailable".to_string(),
            }),
        }
    }

    async fn get_estimated_price(
        &self,
        _: &str,
        _: QuoteSide,
        _: &[Decimal],
    ) -> Result<Vec<EstimatedPrice>, ApiError> {
        unimplemented!()
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderResponse, ApiError> {
        let failure = *self.place_failure.lock().unwrap();
        if let Some(PlaceFailure::Unavailable) = failure {
            return Err(ApiError::Exchange {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        let mut orders = self.orders.lock().unwrap();
        orders.push(order.clone());
        match failure {
            Some(PlaceFailure::LostReply) => Err(ApiError::Deserialization(
                "EOF while parsing an object".to_string(),
            )),
            _ => Ok(self.response_for(orders.len() - 1, order)),
        }
    }

    async fn cancel_order(&self, _: &str) -> Result<String, ApiError> {
        unimplemented!()
    }

    async fn get_order(&self, _: &str) -> Result<OrderResponse, ApiError> {
        unimplemented!()
    }

    async fn get_orders(&self) -> Result<Vec<OrderResponse>, ApiError> {
        let orders = self.orders.lock().unwrap();
        Ok(orders
            .iter()
            .enumerate()
            .map(|(i, order)| self.response_for(i, order))
            .collect())
    }
}

struct Harness {
    engine: LiveEngine,
    client: Arc<ScriptedClient>,
    repo: DbRepository,
    status: StatusReader,
}

async fn harness(client: Arc<ScriptedClient>, dry_run: bool) -> Harness {
    let pool = connect("sqlite::memory:", 1).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let repo = DbRepository::new(pool);

    let executor: Arc<dyn Executor> = if dry_run {
        Arc::new(PaperExecutor::new())
    } else {
        Arc::new(LiveExecutor::new(client.clone()))
    };
    let publisher = StatusPublisher::new();
    let status = publisher.subscribe();
    let engine = LiveEngine::new(
        TradingParams::default(),
        client.clone(),
        executor,
        repo.clone(),
        publisher,
    );

    Harness {
        engine,
        client,
        repo,
        status,
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn full_cycle_buys_the_dip_and_sells_the_rise() {
    let client = ScriptedClient::new(
        vec![
            prices(100.0, 100.5, 99.5),
            prices(94.5, 94.0, 93.5),
            prices(99.0, 99.5, 99.0),
            prices(100.0, 100.5, 100.0),
            prices(101.75, 102.0, 101.5),
        ],
        "filled",
    );
    let mut h = harness(client, false).await;

    assert!(h.engine.init_at(t0()).await.unwrap());
    assert_eq!(h.status.snapshot().baseline_price, 100.0);

    let buy = h.engine.tick_at(t0() + Duration::seconds(4)).await.unwrap();
    let TickOutcome::Traded(execution) = buy else {
        panic!("expected a buy, got {:?}", buy);
    };
    assert_eq!(execution.side, OrderSide::Buy);
    assert_eq!(execution.price, 94.0);
    let state = h.engine.state().unwrap();
    assert_eq!(state.position, PositionState::Long);
    assert_eq!(state.baseline_price, 94.0);

    for i in 2..=3 {
        let outcome = h.engine.tick_at(t0() + Duration::seconds(4 * i)).await.unwrap();
        assert_eq!(outcome, TickOutcome::Held);
        assert!(h.status.snapshot().last_action.contains("< baseline_price (94)"));
    }

    let sell = h.engine.tick_at(t0() + Duration::seconds(16)).await.unwrap();
    assert!(matches!(sell, TickOutcome::Traded(ref e) if e.side == OrderSide::Sell && e.price == 101.5));

    let state = h.engine.state().unwrap();
    assert_eq!(state.position, PositionState::Flat);
    assert_eq!(state.baseline_price, 101.5);

    let placed = h.client.placed();
    assert_eq!(placed.len(), 2);
    assert_eq!(placed[0].side, OrderSide::Buy);
    assert_eq!(placed[1].side, OrderSide::Sell);

    let trades = h.repo.recent_trades(10).await.unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].trade_type, "sell");

    let status = h.status.snapshot();
    assert_eq!(status.position, PositionState::Flat);
    assert!(status.message.starts_with("Sell order placed: ord-2"));
}

#[tokio::test]
async fn malformed_price_response_does_not_buy() {
    let client = ScriptedClient::new(vec![prices(100.0, 100.5, 99.5), Quote::Empty], "filled");
    let mut h = harness(client, false).await;
    h.engine.init_at(t0()).await.unwrap();
    let before = h.engine.state().unwrap().clone();

    let outcome = h.engine.tick_at(t0() + Duration::seconds(4)).await.unwrap();

    assert_eq!(outcome, TickOutcome::Skipped);
    assert!(h.client.placed().is_empty());
    assert_eq!(h.engine.state().unwrap(), &before);

    let errors = h.repo.recent_errors(10).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_message, MISSING_PRICE_MESSAGE);

    let status = h.status.snapshot();
    assert_eq!(status.message, MISSING_PRICE_MESSAGE);
    assert_eq!(status.current_price, 0.0);
}

#[tokio::test]
async fn failed_order_leaves_state_untouched() {
    let client = ScriptedClient::new(
        vec![prices(100.0, 100.5, 99.5), prices(94.5, 94.0, 93.5)],
        "failed",
    );
    let mut h = harness(client, false).await;
    h.engine.init_at(t0()).await.unwrap();
    let before = h.engine.state().unwrap().clone();

    let outcome = h.engine.tick_at(t0() + Duration::seconds(4)).await.unwrap();

    assert_eq!(outcome, TickOutcome::OrderFailed);
    assert_eq!(h.client.placed().len(), 1);
    assert_eq!(h.engine.state().unwrap(), &before);
    assert!(h.repo.recent_trades(10).await.unwrap().is_empty());

    let errors = h.repo.recent_errors(10).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].error_message.starts_with("Buy order failed"));
    assert_eq!(h.status.snapshot().baseline_price, 100.0);
}

#[tokio::test]
async fn init_waits_for_a_usable_snapshot() {
    let client = ScriptedClient::new(vec![Quote::Down, prices(100.0, 100.5, 99.5)], "filled");
    let mut h = harness(client, false).await;

    assert!(!h.engine.init_at(t0()).await.unwrap());
    assert!(h.engine.state().is_none());
    assert_eq!(h.repo.recent_errors(10).await.unwrap().len(), 1);

    assert!(h.engine.init_at(t0()).await.unwrap());
    let status = h.status.snapshot();
    assert_eq!(status.baseline_price, 100.0);
    assert_eq!(status.buying_power, 1000.0);
    assert_eq!(status.message, "Initial buying power: $1000");
}

#[tokio::test]
async fn missing_buying_power_keeps_last_known_value() {
    let client = ScriptedClient::new(
        vec![prices(100.0, 100.5, 99.5), prices(100.0, 100.5, 99.5)],
        "filled",
    );
    let mut h = harness(client, false).await;
    h.engine.init_at(t0()).await.unwrap();

    *h.client.buying_power.lock().unwrap() = None;
    let outcome = h.engine.tick_at(t0() + Duration::seconds(4)).await.unwrap();

    assert_eq!(outcome, TickOutcome::Held);
    let status = h.status.snapshot();
    assert_eq!(status.buying_power, 1000.0);
    assert_eq!(status.message, MISSING_BUYING_POWER_MESSAGE);
    let errors = h.repo.recent_errors(10).await.unwrap();
    assert_eq!(errors[0].error_message, MISSING_BUYING_POWER_MESSAGE);
}

#[tokio::test]
async fn dry_run_simulates_without_placing_orders() {
    let client = ScriptedClient::new(
        vec![prices(100.0, 100.5, 99.5), prices(94.5, 94.0, 93.5)],
        "filled",
    );
    let mut h = harness(client, true).await;
    h.engine.init_at(t0()).await.unwrap();

    let outcome = h.engine.tick_at(t0() + Duration::seconds(4)).await.unwrap();

    assert!(matches!(outcome, TickOutcome::Traded(ref e) if e.simulated && e.price == 94.0));
    assert!(h.client.placed().is_empty());
    assert_eq!(h.engine.state().unwrap().position, PositionState::Long);
    assert_eq!(h.repo.recent_trades(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn idle_baseline_reset_is_published() {
    let client = ScriptedClient::new(
        vec![prices(100.0, 100.5, 99.5), prices(110.0, 110.5, 109.5)],
        "filled",
    );
    let mut h = harness(client, false).await;
    h.engine.init_at(t0()).await.unwrap();

    let outcome = h.engine.tick_at(t0() + Duration::seconds(1800)).await.unwrap();

    assert_eq!(outcome, TickOutcome::Held);
    assert_eq!(h.engine.state().unwrap().baseline_price, 110.0);
    let status = h.status.snapshot();
    assert_eq!(status.baseline_price, 110.0);
    assert_eq!(status.message, "Baseline price reset to current price: 110");
    assert_eq!(h.repo.recent_prices(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn ticking_before_init_is_an_error() {
    let client = ScriptedClient::new(Vec::new(), "filled");
    let mut h = harness(client, false).await;

    assert!(matches!(
        h.engine.tick_at(t0()).await,
        Err(EngineError::NotInitialized)
    ));
}

#[tokio::test]
async fn order_with_lost_reply_is_confirmed_not_resent() {
    let mut quotes = vec![prices(100.0, 100.5, 99.5)];
    quotes.extend((0..5).map(|_| prices(94.5, 94.0, 93.5)));
    let client = ScriptedClient::failing(quotes, PlaceFailure::LostReply);
    let mut h = harness(client, false).await;
    h.engine.init_at(t0()).await.unwrap();

    let first = h.engine.tick_at(t0() + Duration::seconds(4)).await.unwrap();
    assert_eq!(first, TickOutcome::AwaitingConfirmation);
    assert_eq!(h.engine.state().unwrap().position, PositionState::Flat);
    let pending = h.engine.pending_order().unwrap().client_order_id;

    let second = h.engine.tick_at(t0() + Duration::seconds(8)).await.unwrap();
    let TickOutcome::Traded(execution) = second else {
        panic!("expected the pending buy to be confirmed, got {:?}", second);
    };
    assert_eq!(execution.client_order_id, pending);
    assert_eq!(execution.order_id.as_deref(), Some("ord-1"));
    assert_eq!(execution.price, 94.0);
    assert!(h.engine.pending_order().is_none());
    assert_eq!(h.engine.state().unwrap().position, PositionState::Long);

    for i in 3..=5 {
        let outcome = h.engine.tick_at(t0() + Duration::seconds(4 * i)).await.unwrap();
        assert_eq!(outcome, TickOutcome::Held);
    }

    assert_eq!(h.client.placed().len(), 1);
    assert_eq!(h.repo.recent_trades(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn pending_order_unknown_to_the_exchange_is_dropped() {
    let client = ScriptedClient::failing(
        vec![
            prices(100.0, 100.5, 99.5),
            prices(94.5, 94.0, 93.5),
            prices(94.5, 94.0, 93.5),
            prices(94.5, 94.0, 93.5),
        ],
        PlaceFailure::Unavailable,
    );
    let mut h = harness(client, false).await;
    h.engine.init_at(t0()).await.unwrap();

    let first = h.engine.tick_at(t0() + Duration::seconds(4)).await.unwrap();
    assert_eq!(first, TickOutcome::AwaitingConfirmation);
    assert!(h.engine.pending_order().is_some());

    *h.client.place_failure.lock().unwrap() = None;
    let second = h.engine.tick_at(t0() + Duration::seconds(8)).await.unwrap();
    assert_eq!(second, TickOutcome::OrderFailed);
    assert!(h.engine.pending_order().is_none());
    assert_eq!(h.engine.state().unwrap().position, PositionState::Flat);
    assert!(h.client.placed().is_empty());
    assert!(h.status.snapshot().message.contains("was not found at the exchange"));

    let third = h.engine.tick_at(t0() + Duration::seconds(12)).await.unwrap();
    assert!(matches!(third, TickOutcome::Traded(ref e) if e.side == OrderSide::Buy));
    assert_eq!(h.client.placed().len(), 1);
}
