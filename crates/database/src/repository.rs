use crate::DbError;
use chrono::{DateTime, Utc};
use core_types::{Execution, PriceSnapshot};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;

/// The `DbRepository` owns every SQL statement against the audit tables.
/// There are inserts and reads only; rows are never updated or deleted.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
}

/// A row from the `trades` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TradeRecord {
    pub id: i64,
    pub trade_date: DateTime<Utc>,
    /// `buy` or `sell`.
    pub trade_type: String,
    pub symbol: String,
    pub amount: f64,
    pub price: f64,
    pub client_order_id: Option<String>,
}

/// A row from the `prices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PriceRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub current_price: f64,
    pub ask_price: f64,
    pub bid_price: f64,
}

/// A row from the `errors` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ErrorRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub error_message: String,
}

impl DbRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records a confirmed execution and returns the new row id.
    pub async fn log_trade(&self, execution: &Execution) -> Result<i64, DbError> {
        let amount = execution.quantity.to_f64().unwrap_or_default();
        let result = sqlx::query(
            r#"
            INSERT INTO trades (trade_date, trade_type, symbol, amount, price, client_order_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(execution.timestamp)
        .bind(execution.side.as_str())
        .bind(&execution.symbol)
        .bind(amount)
        .bind(execution.price)
        .bind(execution.client_order_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Records one observed price snapshot.
    pub async fn log_price(&self, snapshot: &PriceSnapshot) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO prices (timestamp, symbol, current_price, ask_price, bid_price)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(snapshot.timestamp)
        .bind(&snapshot.symbol)
        .bind(snapshot.mid_price)
        .bind(snapshot.ask_price)
        .bind(snapshot.bid_price)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn log_error(&self, timestamp: DateTime<Utc>, message: &str) -> Result<i64, DbError> {
        let result = sqlx::query("INSERT INTO errors (timestamp, error_message) VALUES (?, ?)")
            .bind(timestamp)
            .bind(message)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Newest trades first.
    pub async fn recent_trades(&self, limit: i64) -> Result<Vec<TradeRecord>, DbError> {
        let rows = sqlx::query_as::<_, TradeRecord>(
            r#"
            SELECT id, trade_date, trade_type, symbol, amount, price, client_order_id
            FROM trades
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn recent_prices(&self, limit: i64) -> Result<Vec<PriceRecord>, DbError> {
        let rows = sqlx::query_as::<_, PriceRecord>(
            r#"
            SELECT id, timestamp, symbol, current_price, ask_price, bid_price
            FROM prices
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn recent_errors(&self, limit: i64) -> Result<Vec<ErrorRecord>, DbError> {
        let rows = sqlx::query_as::<_, ErrorRecord>(
            "SELECT id, timestamp, error_message FROM errors ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
