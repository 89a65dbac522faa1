// bonushub-core/src/tasks/bonus_expiry.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::error;

use crate::eventbus::EventBus;
use crate::services::bonus_service::BonusEngine;

/// Spawns a background task that periodically expires old bonuses.
/// This is the only engine operation that runs on a fixed interval
/// rather than in response to an event; the loop stops when the bus
/// signals shutdown.
pub fn spawn_bonus_expiry_task(
    engine: Arc<BonusEngine>,
    event_bus: EventBus,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;
            if event_bus.is_shutdown() {
                break;
            }
            if let Err(e) = engine.expire_old_bonuses().await {
                error!("bonus expiry sweep failed: {:?}", e);
            }
        }
    })
}
