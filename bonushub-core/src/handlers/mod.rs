// src/handlers/mod.rs
//
// One handler per bonus type. The shared pipeline (eligibility ->
// calculation -> approval gate -> persistence -> event emission ->
// post-award hook) lives in the free `process`/`award` functions so its
// order cannot be overridden; concrete handlers only implement the hooks.

pub mod cashback;
pub mod deposit;
pub mod engagement;
pub mod purchase;
pub mod referral;
pub mod registry;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use bonushub_common::Error;
use bonushub_common::models::bonus::{BonusStatus, BonusTemplate, BonusType, UserBonus};
use bonushub_common::models::context::{AwardOutcome, BonusCalculation, BonusContext};
use bonushub_common::traits::repository_traits::{
    BonusTemplateRepository, UserBonusRepository, UserStatusProvider,
};

use crate::approval::ApprovalGateway;
use crate::calculator;
use crate::config::EngineConfig;
use crate::eventbus::{BonusEvent, BonusEventPayload, EventBus};

pub use registry::HandlerRegistry;

/// Everything a handler needs, injected at construction time.
#[derive(Clone)]
pub struct HandlerDeps {
    pub templates: Arc<dyn BonusTemplateRepository>,
    pub bonuses: Arc<dyn UserBonusRepository>,
    pub user_status: Arc<dyn UserStatusProvider>,
    pub approval: Arc<ApprovalGateway>,
    pub event_bus: EventBus,
    pub config: EngineConfig,
}

/// The four overridable hook points of the award pipeline, plus per-type
/// expiry. Defaults match the common calculator; most handlers override
/// only `validate_specific`.
#[async_trait]
pub trait BonusHandler: Send + Sync {
    fn bonus_type(&self) -> BonusType;

    fn deps(&self) -> &HandlerDeps;

    /// Type-specific eligibility on top of the common validators.
    /// `Some(reason)` short-circuits the pipeline before calculation.
    async fn validate_specific(
        &self,
        _template: &BonusTemplate,
        _ctx: &BonusContext,
    ) -> Result<Option<String>, Error> {
        Ok(None)
    }

    fn calculate_value(&self, template: &BonusTemplate, ctx: &BonusContext) -> f64 {
        calculator::calculate_value(template, ctx)
    }

    fn calculate_turnover(&self, template: &BonusTemplate, bonus_value: f64) -> f64 {
        calculator::calculate_turnover(template, bonus_value)
    }

    fn expires_at(&self, template: &BonusTemplate, now: DateTime<Utc>) -> DateTime<Utc> {
        calculator::calculate_expiry(template, &self.deps().config, now)
    }

    /// Post-award side effects. Failures here are logged, not propagated:
    /// the bonus is already persisted and stays awarded.
    async fn on_awarded(&self, _bonus: &UserBonus, _ctx: &BonusContext) -> Result<(), Error> {
        Ok(())
    }
}

/// Eligibility result: the selected template, or the reason there is none.
pub enum Eligibility {
    Eligible(BonusTemplate),
    Ineligible(String),
}

/// Template selection + common validators + type-specific hook, in order.
pub async fn check_eligibility(
    handler: &dyn BonusHandler,
    ctx: &BonusContext,
) -> Result<Eligibility, Error> {
    let deps = handler.deps();
    let now = Utc::now();

    let Some(template) = deps
        .templates
        .find_active_by_type(ctx.tenant_id, handler.bonus_type(), now)
        .await?
    else {
        return Ok(Eligibility::Ineligible(
            "No active bonus template found".to_string(),
        ));
    };

    if let Some(reason) =
        crate::validators::run_common_validators(&template, ctx, deps.bonuses.as_ref()).await?
    {
        return Ok(Eligibility::Ineligible(reason));
    }

    if let Some(reason) = handler.validate_specific(&template, ctx).await? {
        return Ok(Eligibility::Ineligible(reason));
    }

    Ok(Eligibility::Eligible(template))
}

/// Full value/turnover/expiry calculation for one (template, context) pair.
pub fn calculate(
    handler: &dyn BonusHandler,
    template: &BonusTemplate,
    ctx: &BonusContext,
) -> BonusCalculation {
    let bonus_value = handler.calculate_value(template, ctx);
    BonusCalculation {
        bonus_value,
        turnover_required: handler.calculate_turnover(template, bonus_value),
        expires_at: handler.expires_at(template, Utc::now()),
    }
}

/// The fixed-order award pipeline. Not overridable by handlers.
pub async fn process(handler: &dyn BonusHandler, ctx: &BonusContext) -> Result<AwardOutcome, Error> {
    let template = match check_eligibility(handler, ctx).await? {
        Eligibility::Eligible(t) => t,
        Eligibility::Ineligible(reason) => {
            debug!(
                bonus_type = %handler.bonus_type(),
                user_id = %ctx.user_id,
                reason = %reason,
                "bonus not eligible"
            );
            return Ok(AwardOutcome::Ineligible { reason });
        }
    };

    let calculation = calculate(handler, &template, ctx);
    if calculation.bonus_value <= 0.0 {
        return Ok(AwardOutcome::Ineligible {
            reason: "Calculated bonus value is zero or negative".to_string(),
        });
    }

    award(handler, &template, ctx, false).await
}

/// Award step. `skip_approval_check` is only set by the approval workflow,
/// which has already consumed the pending token.
pub async fn award(
    handler: &dyn BonusHandler,
    template: &BonusTemplate,
    ctx: &BonusContext,
    skip_approval_check: bool,
) -> Result<AwardOutcome, Error> {
    let deps = handler.deps();

    // Always recalculated from the template; the approval workflow may
    // arrive hours after the original context was captured.
    let calculation = calculate(handler, template, ctx);

    // A bonus carrying a turnover requirement is tracked per currency;
    // without one it could never accrue progress, only expire.
    let currency = match &ctx.currency {
        Some(c) => c.clone(),
        None if calculation.turnover_required > 0.0 => {
            return Ok(AwardOutcome::Ineligible {
                reason: "Currency required for a bonus with turnover requirements".to_string(),
            });
        }
        None => String::new(),
    };

    if !skip_approval_check && deps.approval.requires_approval(template, calculation.bonus_value) {
        let token = deps.approval.create_pending(template, ctx, calculation);
        return Ok(AwardOutcome::PendingApproval { token });
    }

    let trigger = ctx.trigger_transaction_id();

    // Re-delivered event? Collapse onto the earlier award before touching
    // the usage counter.
    if let Some(key) = &trigger {
        if let Some(existing) = deps
            .bonuses
            .find_by_trigger(ctx.tenant_id, ctx.user_id, template.template_id, key)
            .await?
        {
            debug!(
                bonus_id = %existing.user_bonus_id,
                trigger = %key,
                "duplicate trigger transaction; returning existing bonus"
            );
            return Ok(AwardOutcome::AlreadyAwarded(existing));
        }
    }

    // Consume a global-cap slot. The ceiling check happens server-side;
    // losing the race for the last slot is an ordinary ineligible outcome.
    if !deps.templates.try_increment_uses(template.template_id).await? {
        return Ok(AwardOutcome::Ineligible {
            reason: "Bonus no longer available".to_string(),
        });
    }

    let now = Utc::now();
    let triggered_by = ctx.requested_by.as_deref().unwrap_or("system");
    let mut bonus = UserBonus {
        user_bonus_id: Uuid::new_v4(),
        user_id: ctx.user_id,
        tenant_id: ctx.tenant_id,
        template_id: template.template_id,
        template_code: template.code.clone(),
        bonus_type: template.bonus_type,
        domain: template.domain,
        status: BonusStatus::Active,
        currency,
        original_value: calculation.bonus_value,
        current_value: calculation.bonus_value,
        turnover_required: calculation.turnover_required,
        turnover_progress: 0.0,
        wallet_id: ctx.wallet_id,
        trigger_transaction_id: trigger,
        referrer_id: ctx.referrer_id,
        qualified_at: now,
        claimed_at: None,
        activated_at: now,
        expires_at: calculation.expires_at,
        history: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    bonus.append_history(
        "awarded",
        Some(BonusStatus::Active),
        Some(calculation.bonus_value),
        triggered_by,
    );

    // Persistence failures propagate: nothing was awarded.
    if !deps.bonuses.insert_user_bonus(&bonus).await? {
        // Lost an insert race against a concurrent delivery of the same
        // event. The winner's row is the award; give back the cap slot
        // consumed above so the counter stays exact.
        deps.templates.release_use(template.template_id).await?;
        if let Some(key) = &bonus.trigger_transaction_id {
            if let Some(existing) = deps
                .bonuses
                .find_by_trigger(ctx.tenant_id, ctx.user_id, template.template_id, key)
                .await?
            {
                return Ok(AwardOutcome::AlreadyAwarded(existing));
            }
        }
        return Ok(AwardOutcome::Ineligible {
            reason: "Bonus already awarded".to_string(),
        });
    }

    info!(
        bonus_id = %bonus.user_bonus_id,
        user_id = %bonus.user_id,
        tenant_id = %bonus.tenant_id,
        bonus_type = %bonus.bonus_type,
        value = bonus.original_value,
        "bonus awarded"
    );

    // Event delivery beyond this point is the bus's responsibility;
    // the bonus stays awarded regardless.
    deps.event_bus
        .publish(BonusEvent::Awarded(BonusEventPayload::from_bonus(&bonus)))
        .await;

    if let Err(e) = handler.on_awarded(&bonus, ctx).await {
        error!(
            bonus_id = %bonus.user_bonus_id,
            error = %e,
            "post-award hook failed; bonus remains awarded"
        );
    }

    Ok(AwardOutcome::Awarded(bonus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::MemoryBonusTemplateRepository;
    use crate::test_utils::{sample_bonus, sample_context, sample_template};
    use chrono::DateTime;
    use mockall::mock;

    use super::engagement::BirthdayHandler;

    mock! {
        BonusStore {}

        #[async_trait]
        impl UserBonusRepository for BonusStore {
            async fn insert_user_bonus(&self, bonus: &UserBonus) -> Result<bool, Error>;
            async fn get_user_bonus(&self, user_bonus_id: Uuid) -> Result<Option<UserBonus>, Error>;
            async fn find_by_trigger(
                &self,
                tenant_id: Uuid,
                user_id: Uuid,
                template_id: Uuid,
                trigger_transaction_id: &str,
            ) -> Result<Option<UserBonus>, Error>;
            async fn count_for_template(
                &self,
                tenant_id: Uuid,
                user_id: Uuid,
                template_id: Uuid,
            ) -> Result<i64, Error>;
            async fn list_active_for_user(
                &self,
                tenant_id: Uuid,
                user_id: Uuid,
                currency: &str,
            ) -> Result<Vec<UserBonus>, Error>;
            async fn list_active_expired(&self, now: DateTime<Utc>) -> Result<Vec<UserBonus>, Error>;
            async fn update_active_bonus(&self, bonus: &UserBonus) -> Result<bool, Error>;
            async fn has_bonus_of_type(
                &self,
                tenant_id: Uuid,
                user_id: Uuid,
                bonus_type: BonusType,
            ) -> Result<bool, Error>;
        }
    }

    // Two deliveries of one event can both pass the duplicate pre-check
    // before either inserts. The loser's insert comes back false; the cap
    // slot it took must be handed back and the winner's row returned.
    #[tokio::test]
    async fn lost_insert_race_releases_the_cap_slot() {
        let templates = Arc::new(MemoryBonusTemplateRepository::new());
        let template = sample_template(Uuid::new_v4(), BonusType::Birthday);
        templates.create_template(&template).await.unwrap();

        let ctx = sample_context(template.tenant_id);
        let winner = sample_bonus(&template, &ctx);
        let winner_id = winner.user_bonus_id;

        let mut bonuses = MockBonusStore::new();
        // Pre-check: no row yet, the other delivery has not landed.
        bonuses
            .expect_find_by_trigger()
            .times(1)
            .returning(|_, _, _, _| Ok(None));
        // The other delivery inserted in the meantime.
        bonuses
            .expect_insert_user_bonus()
            .times(1)
            .returning(|_| Ok(false));
        bonuses
            .expect_find_by_trigger()
            .times(1)
            .returning(move |_, _, _, _| Ok(Some(winner.clone())));

        let deps = HandlerDeps {
            templates: templates.clone(),
            bonuses: Arc::new(bonuses),
            user_status: Arc::new(crate::repositories::memory::MemoryUserStatusProvider::new()),
            approval: Arc::new(ApprovalGateway::new(&EngineConfig::default())),
            event_bus: EventBus::new(),
            config: EngineConfig::default(),
        };
        let handler = BirthdayHandler::new(deps);

        let outcome = process(&handler, &ctx).await.unwrap();
        let AwardOutcome::AlreadyAwarded(existing) = outcome else {
            panic!("expected AlreadyAwarded, got {outcome:?}");
        };
        assert_eq!(existing.user_bonus_id, winner_id);

        // The slot consumed before the failed insert was given back.
        let after = templates
            .get_template(template.template_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.current_uses_total, 0);
    }
}
