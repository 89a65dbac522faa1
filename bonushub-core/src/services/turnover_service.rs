// File: bonushub-core/src/services/turnover_service.rs
//
// Folds wagering-activity events into turnover progress on active
// bonuses and drives the active -> converted transition. Progress is
// monotonic: updates add to the freshly loaded row and clamp at the
// requirement, and the repository refuses writes to non-active rows.

use std::sync::Arc;

use tracing::{debug, info, warn};

use bonushub_common::Error;
use bonushub_common::models::bonus::BonusStatus;
use bonushub_common::models::context::ActivityEvent;
use bonushub_common::traits::repository_traits::{BonusTemplateRepository, UserBonusRepository};

use crate::eventbus::{BonusEvent, BonusEventPayload, EventBus};

pub struct TurnoverService {
    templates: Arc<dyn BonusTemplateRepository>,
    bonuses: Arc<dyn UserBonusRepository>,
    event_bus: EventBus,
}

impl TurnoverService {
    pub fn new(
        templates: Arc<dyn BonusTemplateRepository>,
        bonuses: Arc<dyn UserBonusRepository>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            templates,
            bonuses,
            event_bus,
        }
    }

    /// Apply one activity event to every matching active bonus of the
    /// user.
    pub async fn handle_activity(&self, event: &ActivityEvent) -> Result<(), Error> {
        if event.amount <= 0.0 {
            return Ok(());
        }

        let active = self
            .bonuses
            .list_active_for_user(event.tenant_id, event.user_id, &event.currency)
            .await?;

        for mut bonus in active {
            if !self
                .category_counts(&bonus.template_id, event.category.as_deref())
                .await?
            {
                debug!(
                    bonus_id = %bonus.user_bonus_id,
                    category = ?event.category,
                    "activity category does not count toward this bonus"
                );
                continue;
            }

            // Clamp: progress never runs past what completion detection
            // needs, and never decreases.
            let new_progress = (bonus.turnover_progress + event.amount)
                .min(bonus.turnover_required)
                .max(bonus.turnover_progress);
            if new_progress == bonus.turnover_progress && bonus.turnover_required > 0.0 {
                continue;
            }
            bonus.turnover_progress = new_progress;
            bonus.append_history("turnover_updated", None, Some(event.amount), "system");

            let completed = bonus.turnover_progress >= bonus.turnover_required;
            if completed {
                bonus.append_history("requirements_met", None, None, "system");
                bonus.status = BonusStatus::Converted;
                bonus.append_history(
                    "converted",
                    Some(BonusStatus::Converted),
                    Some(bonus.current_value),
                    "system",
                );
            }

            // Guarded write; a bonus that expired or was forfeited in the
            // meantime is left untouched.
            if !self.bonuses.update_active_bonus(&bonus).await? {
                warn!(
                    bonus_id = %bonus.user_bonus_id,
                    "turnover update skipped; bonus no longer active"
                );
                continue;
            }

            if completed {
                info!(
                    bonus_id = %bonus.user_bonus_id,
                    user_id = %bonus.user_id,
                    value = bonus.current_value,
                    "turnover requirements met; bonus converted"
                );
                let payload = BonusEventPayload::from_bonus(&bonus);
                self.event_bus
                    .publish(BonusEvent::RequirementsMet(payload.clone()))
                    .await;
                self.event_bus.publish(BonusEvent::Converted(payload)).await;
            }
        }

        Ok(())
    }

    /// Whether this activity category counts toward the bonus's turnover.
    /// Templates with an empty category list accept everything; a missing
    /// template cannot restrict anything.
    async fn category_counts(
        &self,
        template_id: &uuid::Uuid,
        category: Option<&str>,
    ) -> Result<bool, Error> {
        let Some(template) = self.templates.get_template(*template_id).await? else {
            return Ok(true);
        };
        if template.eligible_categories.is_empty() {
            return Ok(true);
        }
        let Some(category) = category else {
            // Uncategorized activity does not count against a restricted
            // template.
            return Ok(false);
        };
        Ok(template
            .eligible_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category)))
    }
}
