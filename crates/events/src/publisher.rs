use crate::status::StatusRecord;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;

/// The write side of the status channel. Cloning shares the same slot.
#[derive(Debug, Clone)]
pub struct StatusPublisher {
    tx: Arc<watch::Sender<StatusRecord>>,
}

/// A read handle that always sees the most recently published record.
#[derive(Debug, Clone)]
pub struct StatusReader {
    rx: watch::Receiver<StatusRecord>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusRecord::default());
        Self { tx: Arc::new(tx) }
    }

    /// Mutates the current record in place and stamps `updated_at`.
    /// Succeeds even when no reader is subscribed.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut StatusRecord),
    {
        self.tx.send_modify(|record| {
            mutate(record);
            record.updated_at = Some(Utc::now());
        });
    }

    /// Sets the free-form message.
    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|record| record.message = message);
    }

    pub fn snapshot(&self) -> StatusRecord {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> StatusReader {
        StatusReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReader {
    /// A clone of the latest record. Never blocks on the writer.
    pub fn snapshot(&self) -> StatusRecord {
        self.rx.borrow().clone()
    }

    /// Waits until the publisher writes again. Returns `false` once the
    /// publisher is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PositionState;
    use std::time::Duration;

    #[test]
    fn last_writer_wins() {
        let publisher = StatusPublisher::new();
        let reader = publisher.subscribe();

        publisher.update(|r| r.baseline_price = 100.0);
        publisher.update(|r| r.baseline_price = 94.0);
        publisher.set_message("Buy order placed");

        let status = reader.snapshot();
        assert_eq!(status.baseline_price, 94.0);
        assert_eq!(status.message, "Buy order placed");
        assert!(status.updated_at.is_some());
    }

    #[test]
    fn update_without_readers_is_kept() {
        let publisher = StatusPublisher::new();
        publisher.update(|r| r.position = PositionState::Long);

        assert_eq!(publisher.snapshot().position, PositionState::Long);
        assert_eq!(publisher.subscribe().snapshot().position, PositionState::Long);
    }

    #[tokio::test]
    async fn readers_are_woken_by_updates() {
        let publisher = StatusPublisher::new();
        let mut reader = publisher.subscribe();

        let writer = publisher.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.update(|r| r.buying_power = 1250.0);
        });

        assert!(reader.changed().await);
        assert_eq!(reader.snapshot().buying_power, 1250.0);
    }

    #[tokio::test]
    async fn dropping_the_publisher_ends_the_stream() {
        let publisher = StatusPublisher::new();
        let mut reader = publisher.subscribe();
        drop(publisher);

        assert!(!reader.changed().await);
    }
}
