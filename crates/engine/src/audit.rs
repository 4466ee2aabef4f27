use crate::error::FailureKind;
use chrono::Utc;
use core_types::{Execution, PriceSnapshot};
use database::DbRepository;
use events::StatusPublisher;

/// Writes what the engine observes to the audit database and the dashboard status.
///
/// Audit writes are best effort: a failed insert is logged and then ignored so
/// that persistence problems never stop trading.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    repo: DbRepository,
    status: StatusPublisher,
}

impl AuditTrail {
    pub fn new(repo: DbRepository, status: StatusPublisher) -> Self {
        Self { repo, status }
    }

    pub fn status(&self) -> &StatusPublisher {
        &self.status
    }

    /// Shows the message on the dashboard, appends an error row and logs it.
    pub async fn record_error(&self, kind: FailureKind, message: &str) {
        tracing::error!(kind = %kind, "{}", message);
        self.status.set_message(message);
        if let Err(e) = self.repo.log_error(Utc::now(), message).await {
            tracing::warn!(error = %e, "Failed to write error row");
        }
    }

    pub async fn record_price(&self, snapshot: &PriceSnapshot) {
        if let Err(e) = self.repo.log_price(snapshot).await {
            tracing::warn!(error = %e, "Failed to write price sample");
        }
    }

    pub async fn record_trade(&self, execution: &Execution) {
        if let Err(e) = self.repo.log_trade(execution).await {
            tracing::warn!(error = %e, client_order_id = %execution.client_order_id, "Failed to write trade row");
        }
    }
}
