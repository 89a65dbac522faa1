//! src/eventbus/mod.rs
//!
//! Provides an in-process event bus that supports guaranteed delivery
//! to multiple subscribers via bounded MPSC queues. Downstream consumers
//! (wallet/ledger service, webhook dispatcher) subscribe here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc, watch};
use uuid::Uuid;

use bonushub_common::models::bonus::{BonusType, UserBonus};

/// Routing/payload data shared by every bonus lifecycle event. Carries
/// enough for the wallet service to credit or release balances without
/// a read-back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusEventPayload {
    pub bonus_id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub bonus_type: BonusType,
    pub value: f64,
    pub currency: String,
    pub wallet_id: Option<Uuid>,
    pub turnover_required: Option<f64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

impl BonusEventPayload {
    pub fn from_bonus(bonus: &UserBonus) -> Self {
        Self {
            bonus_id: bonus.user_bonus_id,
            user_id: bonus.user_id,
            tenant_id: bonus.tenant_id,
            bonus_type: bonus.bonus_type,
            value: bonus.current_value,
            currency: bonus.currency.clone(),
            wallet_id: bonus.wallet_id,
            turnover_required: Some(bonus.turnover_required),
            expires_at: Some(bonus.expires_at),
            timestamp: Utc::now(),
        }
    }
}

/// Lifecycle events emitted by the engine.
#[derive(Debug, Clone)]
pub enum BonusEvent {
    Awarded(BonusEventPayload),
    RequirementsMet(BonusEventPayload),
    Converted(BonusEventPayload),
    Expired(BonusEventPayload),
    Forfeited(BonusEventPayload),
    Cancelled(BonusEventPayload),
}

impl BonusEvent {
    /// Get the event type as a wire string.
    pub fn event_type(&self) -> &'static str {
        match self {
            BonusEvent::Awarded(_) => "bonus.awarded",
            BonusEvent::RequirementsMet(_) => "bonus.requirements_met",
            BonusEvent::Converted(_) => "bonus.converted",
            BonusEvent::Expired(_) => "bonus.expired",
            BonusEvent::Forfeited(_) => "bonus.forfeited",
            BonusEvent::Cancelled(_) => "bonus.cancelled",
        }
    }

    pub fn payload(&self) -> &BonusEventPayload {
        match self {
            BonusEvent::Awarded(p)
            | BonusEvent::RequirementsMet(p)
            | BonusEvent::Converted(p)
            | BonusEvent::Expired(p)
            | BonusEvent::Forfeited(p)
            | BonusEvent::Cancelled(p) => p,
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<BonusEvent>` for guaranteed
/// delivery.
///
/// - If the subscriber's channel buffer fills, `publish` will await
///   until there's space (backpressure).
/// - If the subscriber has dropped the `Receiver`, the channel is closed
///   and sending returns an error.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<BonusEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer. Adjust as needed.
const DEFAULT_BUFFER_SIZE: usize = 10000;

impl EventBus {
    /// Create a new, empty event bus.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<BonusEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all subscribers.
    pub async fn publish(&self, event: BonusEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, sleep, timeout};

    fn payload() -> BonusEventPayload {
        BonusEventPayload {
            bonus_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            bonus_type: BonusType::Welcome,
            value: 25.0,
            currency: "USD".into(),
            wallet_id: None,
            turnover_required: Some(75.0),
            expires_at: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();

        let mut rx1 = bus.subscribe(Some(5)).await;
        let mut rx2 = bus.subscribe(Some(5)).await;

        bus.publish(BonusEvent::Awarded(payload())).await;

        // Both subscribers should get it
        let evt1 = rx1.recv().await.expect("rx1 should get event");
        let evt2 = rx2.recv().await.expect("rx2 should get event");

        assert_eq!(evt1.event_type(), "bonus.awarded");
        assert_eq!(evt2.event_type(), "bonus.awarded");
    }

    #[tokio::test]
    async fn test_backpressure_blocking() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(1)).await; // queue size = 1

        // Publish first message to fill the queue.
        bus.publish(BonusEvent::Awarded(payload())).await;

        // Spawn a task that reads the two messages after a short delay.
        let handle = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            let first = rx.recv().await.expect("expected first message");
            let second = rx.recv().await.expect("expected second message");
            (first, second)
        });

        // Publish the second message (this call will wait until there's space).
        let second_publish = bus.publish(BonusEvent::Expired(payload()));
        let result = timeout(Duration::from_millis(500), second_publish).await;
        assert!(result.is_ok(), "publish should eventually unblock");

        let (evt1, evt2) = handle.await.unwrap();
        assert_eq!(evt1.event_type(), "bonus.awarded");
        assert_eq!(evt2.event_type(), "bonus.expired");
    }
}
