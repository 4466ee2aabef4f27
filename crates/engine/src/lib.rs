use crate::audit::AuditTrail;
use crate::error::{EngineError, FailureKind};
use crate::market_data::SnapshotFetcher;
use api_client::ApiClient;
use chrono::{DateTime, Utc};
use configuration::TradingParams;
use core_types::{Execution, OrderRequest, OrderSide};
use database::DbRepository;
use events::StatusPublisher;
use executor::Executor;
use std::sync::Arc;
use strategies::{BaselineState, Decision, SwingStrategy};
use tokio::time::{interval, sleep, MissedTickBehavior};

pub mod audit;
pub mod error;
pub mod market_data;

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The snapshot was unusable; nothing was evaluated.
    Skipped,
    /// Prices were evaluated and no order was due.
    Held,
    /// An order was confirmed and the state machine moved on.
    Traded(Execution),
    /// An order was due but not confirmed; the state is unchanged.
    OrderFailed,
    /// An earlier order's outcome is still unknown; no new order was considered.
    AwaitingConfirmation,
}

/// An order the exchange may have accepted without the engine seeing the answer.
#[derive(Debug, Clone)]
struct PendingOrder {
    order: OrderRequest,
    quoted_price: f64,
}

/// The central orchestrator for the live trading loop.
///
/// It owns the single `SwingStrategy`, drives it once per poll interval and is
/// the only writer of the dashboard status.
pub struct LiveEngine {
    params: TradingParams,
    fetcher: SnapshotFetcher,
    executor: Arc<dyn Executor>,
    audit: AuditTrail,
    strategy: Option<SwingStrategy>,
    pending: Option<PendingOrder>,
}

impl LiveEngine {
    pub fn new(
        params: TradingParams,
        api_client: Arc<dyn ApiClient>,
        executor: Arc<dyn Executor>,
        db_repo: DbRepository,
        status: StatusPublisher,
    ) -> Self {
        let audit = AuditTrail::new(db_repo, status);
        let fetcher = SnapshotFetcher::new(api_client, &params.symbol, audit.clone());
        Self {
            params,
            fetcher,
            executor,
            audit,
            strategy: None,
            pending: None,
        }
    }

    pub fn state(&self) -> Option<&BaselineState> {
        self.strategy.as_ref().map(|s| s.state())
    }

    /// The order whose outcome is unknown, if any. No other order is sent while it is set.
    pub fn pending_order(&self) -> Option<&OrderRequest> {
        self.pending.as_ref().map(|p| &p.order)
    }

    fn status(&self) -> &StatusPublisher {
        self.audit.status()
    }

    /// Makes one attempt to anchor the baseline. Returns `Ok(false)` when the
    /// snapshot was unusable and the caller should retry later.
    pub async fn init_at(&mut self, now: DateTime<Utc>) -> Result<bool, EngineError> {
        let buying_power = self.fetcher.fetch_buying_power().await;
        self.status()
            .set_message(format!("Initial buying power: ${}", buying_power));

        let snapshot = self.fetcher.fetch_price().await;
        self.status().update(|s| s.apply_prices(&snapshot));
        if !snapshot.is_usable() {
            tracing::warn!(symbol = %snapshot.symbol, "No usable price yet; baseline not set");
            return Ok(false);
        }

        let strategy = SwingStrategy::new(&self.params, &snapshot, now)?;
        let state = strategy.state().clone();
        self.status().update(|s| {
            s.baseline_price = state.baseline_price;
            s.position = state.position;
        });
        tracing::info!(
            symbol = %self.params.symbol,
            baseline = state.baseline_price,
            buying_power,
            "Engine initialized"
        );
        self.strategy = Some(strategy);
        Ok(true)
    }

    /// Retries `init_at` every poll interval until a usable snapshot arrives.
    pub async fn init(&mut self) -> Result<(), EngineError> {
        while !self.init_at(Utc::now()).await? {
            sleep(self.params.poll_interval()).await;
        }
        Ok(())
    }

    /// Runs one evaluation of the state machine. At most one order is submitted,
    /// and none while an earlier order is still unconfirmed.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> Result<TickOutcome, EngineError> {
        if self.strategy.is_none() {
            return Err(EngineError::NotInitialized);
        }

        self.fetcher.fetch_buying_power().await;
        let snapshot = self.fetcher.fetch_price().await;
        self.status().update(|s| s.apply_prices(&snapshot));
        if snapshot.is_usable() {
            self.audit.record_price(&snapshot).await;
        }

        if let Some(pending) = self.pending.take() {
            return self.settle_pending(pending, now).await;
        }
        if !snapshot.is_usable() {
            return Ok(TickOutcome::Skipped);
        }

        let evaluation = {
            let strategy = self.strategy.as_mut().ok_or(EngineError::NotInitialized)?;
            strategy.evaluate(&snapshot, now)
        };

        if let Some(baseline) = evaluation.baseline_reset {
            self.status().update(|s| {
                s.baseline_price = baseline;
                s.message = format!("Baseline price reset to current price: {}", baseline);
            });
        }

        let (order, quoted_price, last_action) = match evaluation.decision {
            Decision::Skip => return Ok(TickOutcome::Skipped),
            Decision::Hold { last_action } => {
                if let Some(action) = last_action {
                    self.status().update(|s| s.last_action = action);
                }
                return Ok(TickOutcome::Held);
            }
            Decision::Buy {
                order,
                quoted_price,
                last_action,
            }
            | Decision::Sell {
                order,
                quoted_price,
                last_action,
            } => (order, quoted_price, last_action),
        };

        self.status().update(|s| s.last_action = last_action);
        let label = side_label(order.side);

        let result = self.executor.execute(&order, quoted_price).await;
        match result {
            Ok(execution) => self.commit(execution, now).await,
            Err(e) if e.is_outcome_unknown() => {
                let message = format!(
                    "{} order {} outcome unknown, awaiting confirmation: {}",
                    label, order.client_order_id, e
                );
                self.audit
                    .record_error(FailureKind::OrderSubmissionFailure, &message)
                    .await;
                self.pending = Some(PendingOrder {
                    order,
                    quoted_price,
                });
                Ok(TickOutcome::AwaitingConfirmation)
            }
            Err(e) => {
                let message = format!("{} order failed: {}", label, e);
                self.audit
                    .record_error(FailureKind::OrderSubmissionFailure, &message)
                    .await;
                Ok(TickOutcome::OrderFailed)
            }
        }
    }

    /// Asks the exchange about an unconfirmed order. It is committed if found,
    /// dropped if the exchange never saw it or failed it, and kept otherwise.
    async fn settle_pending(
        &mut self,
        pending: PendingOrder,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, EngineError> {
        let label = side_label(pending.order.side);
        let client_order_id = pending.order.client_order_id;

        let result = self
            .executor
            .reconcile(&pending.order, pending.quoted_price)
            .await;
        match result {
            Ok(Some(execution)) => {
                tracing::info!(%client_order_id, "Pending order confirmed");
                self.commit(execution, now).await
            }
            Ok(None) => {
                let message = format!(
                    "{} order {} was not found at the exchange",
                    label, client_order_id
                );
                self.audit
                    .record_error(FailureKind::OrderSubmissionFailure, &message)
                    .await;
                Ok(TickOutcome::OrderFailed)
            }
            Err(e) if e.is_outcome_unknown() => {
                tracing::warn!(%client_order_id, error = %e, "Pending order still unconfirmed");
                self.pending = Some(pending);
                Ok(TickOutcome::AwaitingConfirmation)
            }
            Err(e) => {
                let message = format!("{} order failed: {}", label, e);
                self.audit
                    .record_error(FailureKind::OrderSubmissionFailure, &message)
                    .await;
                Ok(TickOutcome::OrderFailed)
            }
        }
    }

    /// Moves the state machine on a confirmed execution and records it.
    async fn commit(
        &mut self,
        execution: Execution,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, EngineError> {
        let strategy = self.strategy.as_mut().ok_or(EngineError::NotInitialized)?;
        strategy.on_execution(&execution, now)?;
        let state = strategy.state().clone();
        self.audit.record_trade(&execution).await;

        let label = side_label(execution.side);
        let reference = execution
            .order_id
            .clone()
            .unwrap_or_else(|| execution.client_order_id.to_string());
        self.status().update(|s| {
            s.baseline_price = state.baseline_price;
            s.position = state.position;
            s.message = format!(
                "{} order placed: {} ({} @ {})",
                label, reference, execution.quantity, execution.price
            );
        });
        Ok(TickOutcome::Traded(execution))
    }

    /// Initializes, then ticks forever at the poll interval. A failed tick is
    /// logged and the loop carries on.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        self.init().await?;

        let mut timer = interval(self.params.poll_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            symbol = %self.params.symbol,
            poll_interval = ?self.params.poll_interval(),
            "Trading loop started"
        );

        loop {
            timer.tick().await;
            match self.tick_at(Utc::now()).await {
                Ok(TickOutcome::Traded(execution)) => {
                    tracing::info!(side = %execution.side, price = execution.price, "Trade completed");
                }
                Ok(outcome) => tracing::debug!(?outcome, "Tick complete"),
                Err(e) => tracing::error!(error = %e, "Tick failed"),
            }
        }
    }
}

fn side_label(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "Buy",
        OrderSide::Sell => "Sell",
    }
}
