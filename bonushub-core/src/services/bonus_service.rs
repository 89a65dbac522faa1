// File: bonushub-core/src/services/bonus_service.rs
//
// The single public entry point of the engine. Owns the handler registry,
// the approval gateway and the turnover service; inbound domain events
// come in here, lifecycle events go out on the bus.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bonushub_common::Error;
use bonushub_common::models::approval::PendingBonusApproval;
use bonushub_common::models::bonus::{BonusStatus, BonusType, UserBonus};
use bonushub_common::models::context::{
    ActionEvent, ActivityEvent, AwardOutcome, BonusContext, DepositEvent, PurchaseEvent,
};
use bonushub_common::traits::repository_traits::{
    BonusTemplateRepository, UserBonusRepository, UserStatusProvider,
};

use crate::approval::ApprovalGateway;
use crate::config::EngineConfig;
use crate::eventbus::{BonusEvent, BonusEventPayload, EventBus};
use crate::handlers::{self, HandlerDeps, HandlerRegistry};
use crate::services::turnover_service::TurnoverService;

pub struct BonusEngine {
    templates: Arc<dyn BonusTemplateRepository>,
    bonuses: Arc<dyn UserBonusRepository>,
    approval: Arc<ApprovalGateway>,
    registry: HandlerRegistry,
    turnover: TurnoverService,
    event_bus: EventBus,
}

impl BonusEngine {
    pub fn new(
        templates: Arc<dyn BonusTemplateRepository>,
        bonuses: Arc<dyn UserBonusRepository>,
        user_status: Arc<dyn UserStatusProvider>,
        event_bus: EventBus,
        config: EngineConfig,
    ) -> Self {
        let approval = Arc::new(ApprovalGateway::new(&config));
        let deps = HandlerDeps {
            templates: templates.clone(),
            bonuses: bonuses.clone(),
            user_status,
            approval: approval.clone(),
            event_bus: event_bus.clone(),
            config,
        };
        let registry = HandlerRegistry::new(deps);
        let turnover = TurnoverService::new(templates.clone(), bonuses.clone(), event_bus.clone());
        Self {
            templates,
            bonuses,
            approval,
            registry,
            turnover,
            event_bus,
        }
    }

    /// Direct award entry point for simple event-to-bonus mappings
    /// (birthday, daily_login, tier_upgrade, referral/referee,
    /// achievement, cashback).
    pub async fn award(
        &self,
        bonus_type: BonusType,
        ctx: &BonusContext,
    ) -> Result<AwardOutcome, Error> {
        let handler = self.registry.get(bonus_type)?;
        handlers::process(handler.as_ref(), ctx).await
    }

    /// Evaluate every deposit-triggered bonus type against one deposit.
    /// Ineligible handlers are skipped silently; the successfully awarded
    /// subset comes back.
    pub async fn handle_deposit(&self, event: &DepositEvent) -> Result<Vec<UserBonus>, Error> {
        let ctx = event.context();
        let mut awarded = Vec::new();
        for bonus_type in BonusType::deposit_triggered() {
            match self.award(*bonus_type, &ctx).await? {
                AwardOutcome::Awarded(bonus) => awarded.push(bonus),
                AwardOutcome::AlreadyAwarded(bonus) => {
                    debug!(
                        bonus_id = %bonus.user_bonus_id,
                        bonus_type = %bonus_type,
                        "deposit re-delivery; bonus already awarded"
                    );
                }
                AwardOutcome::PendingApproval { token } => {
                    info!(
                        bonus_type = %bonus_type,
                        token = %token,
                        "deposit bonus held for approval"
                    );
                }
                AwardOutcome::Ineligible { .. } => {}
            }
        }
        Ok(awarded)
    }

    pub async fn handle_purchase(&self, event: &PurchaseEvent) -> Result<Vec<UserBonus>, Error> {
        let ctx = event.context();
        let outcome = self.award(BonusType::FirstPurchase, &ctx).await?;
        Ok(match outcome {
            AwardOutcome::Awarded(bonus) => vec![bonus],
            _ => vec![],
        })
    }

    pub async fn handle_action(&self, event: &ActionEvent) -> Result<Vec<UserBonus>, Error> {
        let ctx = event.context();
        let outcome = self.award(BonusType::FirstAction, &ctx).await?;
        Ok(match outcome {
            AwardOutcome::Awarded(bonus) => vec![bonus],
            _ => vec![],
        })
    }

    /// Route wagering activity into turnover tracking.
    pub async fn handle_activity(&self, event: &ActivityEvent) -> Result<(), Error> {
        self.turnover.handle_activity(event).await
    }

    /// Periodic sweep: expire every active bonus whose window has passed.
    /// Returns the number of bonuses expired.
    pub async fn expire_old_bonuses(&self) -> Result<u64, Error> {
        let now = Utc::now();
        let expired = self.bonuses.list_active_expired(now).await?;
        let mut count = 0u64;

        for mut bonus in expired {
            bonus.status = BonusStatus::Expired;
            bonus.append_history("expired", Some(BonusStatus::Expired), None, "system");
            if !self.bonuses.update_active_bonus(&bonus).await? {
                // Converted or forfeited between the read and the write.
                continue;
            }
            count += 1;
            self.event_bus
                .publish(BonusEvent::Expired(BonusEventPayload::from_bonus(&bonus)))
                .await;
        }

        let purged = self.approval.purge_expired();
        if count > 0 || purged > 0 {
            info!(count, purged, "expired old bonuses and stale approvals");
        }
        Ok(count)
    }

    /// Redeem a pending-approval token and grant the held award. A token
    /// that is missing, already processed or expired is an ordinary
    /// ineligible outcome, never a duplicate award.
    pub async fn approve(
        &self,
        token: &str,
        approved_by: &str,
        approved_by_user_id: Option<Uuid>,
    ) -> Result<AwardOutcome, Error> {
        let Some(pending) = self.approval.take(token) else {
            return Ok(AwardOutcome::Ineligible {
                reason: "Pending approval not found or already processed".to_string(),
            });
        };

        let Some(template) = self.templates.get_template(pending.template_id).await? else {
            warn!(
                token = %token,
                template_id = %pending.template_id,
                "approved bonus references a deleted template"
            );
            return Ok(AwardOutcome::Ineligible {
                reason: "Bonus template no longer exists".to_string(),
            });
        };

        let mut ctx = pending.context.clone();
        ctx.requested_by = Some(approved_by.to_string());

        info!(
            token = %token,
            approved_by = %approved_by,
            approved_by_user_id = ?approved_by_user_id,
            user_id = %pending.user_id,
            value = pending.calculated_value,
            "pending bonus approved"
        );

        let handler = self.registry.get(pending.bonus_type)?;
        handlers::award(handler.as_ref(), &template, &ctx, true).await
    }

    /// Reject a pending approval. Returns `false` when the token was
    /// already processed or expired.
    pub async fn reject(
        &self,
        token: &str,
        rejected_by: &str,
        rejected_by_user_id: Option<Uuid>,
        reason: &str,
    ) -> Result<bool, Error> {
        let Some(pending) = self.approval.take(token) else {
            return Ok(false);
        };
        info!(
            token = %token,
            rejected_by = %rejected_by,
            rejected_by_user_id = ?rejected_by_user_id,
            reason = %reason,
            user_id = %pending.user_id,
            tenant_id = %pending.tenant_id,
            value = pending.calculated_value,
            "pending bonus rejected"
        );
        Ok(true)
    }

    pub fn list_pending(&self, tenant_id: Option<Uuid>) -> Vec<PendingBonusApproval> {
        self.approval.list(tenant_id)
    }

    pub fn get_pending(&self, token: &str) -> Option<PendingBonusApproval> {
        self.approval.get(token)
    }

    /// Explicit forfeiture; only active bonuses can be forfeited.
    /// Returns `false` when the bonus is missing or no longer active.
    pub async fn forfeit(
        &self,
        user_bonus_id: Uuid,
        triggered_by: &str,
        reason: &str,
    ) -> Result<bool, Error> {
        self.close_bonus(
            user_bonus_id,
            BonusStatus::Forfeited,
            "forfeited",
            triggered_by,
            reason,
        )
        .await
    }

    /// Explicit cancellation; same contract as forfeiture.
    pub async fn cancel(
        &self,
        user_bonus_id: Uuid,
        triggered_by: &str,
        reason: &str,
    ) -> Result<bool, Error> {
        self.close_bonus(
            user_bonus_id,
            BonusStatus::Cancelled,
            "cancelled",
            triggered_by,
            reason,
        )
        .await
    }

    async fn close_bonus(
        &self,
        user_bonus_id: Uuid,
        status: BonusStatus,
        action: &str,
        triggered_by: &str,
        reason: &str,
    ) -> Result<bool, Error> {
        let Some(mut bonus) = self.bonuses.get_user_bonus(user_bonus_id).await? else {
            return Ok(false);
        };
        if !bonus.is_active() {
            return Ok(false);
        }

        bonus.status = status;
        bonus.append_history(action, Some(status), None, triggered_by);
        if !self.bonuses.update_active_bonus(&bonus).await? {
            return Ok(false);
        }

        info!(
            bonus_id = %user_bonus_id,
            action,
            triggered_by,
            reason,
            "bonus closed"
        );
        let payload = BonusEventPayload::from_bonus(&bonus);
        let event = match status {
            BonusStatus::Forfeited => BonusEvent::Forfeited(payload),
            _ => BonusEvent::Cancelled(payload),
        };
        self.event_bus.publish(event).await;
        Ok(true)
    }
}
