use crate::{error::AppError, template, AppState};
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use database::{ErrorRecord, PriceRecord, TradeRecord};
use events::StatusRecord;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<i64>,
}

impl HistoryQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// # GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let status = state.status.snapshot();
    Html(template::render_dashboard(&state.symbol, &status))
}

/// # GET /status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusRecord> {
    Json(state.status.snapshot())
}

/// # GET /api/trades
pub async fn get_trades(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<TradeRecord>>, AppError> {
    let trades = state.db_repo.recent_trades(query.limit()).await?;
    Ok(Json(trades))
}

/// # GET /api/prices
pub async fn get_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<PriceRecord>>, AppError> {
    let prices = state.db_repo.recent_prices(query.limit()).await?;
    Ok(Json(prices))
}

/// # GET /api/errors
pub async fn get_errors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ErrorRecord>>, AppError> {
    let errors = state.db_repo.recent_errors(query.limit()).await?;
    Ok(Json(errors))
}
