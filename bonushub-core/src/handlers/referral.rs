// File: bonushub-core/src/handlers/referral.rs
//
// Referral bonuses: the referrer side pays out once the referee's
// qualifying deposit has cleared; the referee side rewards signing up
// through a referral link.

use async_trait::async_trait;
use tracing::info;

use bonushub_common::Error;
use bonushub_common::models::bonus::{BonusTemplate, BonusType, UserBonus};
use bonushub_common::models::context::BonusContext;

use super::{BonusHandler, HandlerDeps};

pub struct ReferralHandler {
    deps: HandlerDeps,
}

impl ReferralHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for ReferralHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::Referral
    }

    fn deps(&self) -> &HandlerDeps {
        &self.deps
    }

    async fn validate_specific(
        &self,
        _template: &BonusTemplate,
        ctx: &BonusContext,
    ) -> Result<Option<String>, Error> {
        let Some(referee_id) = ctx.referee_id else {
            return Ok(Some("No referee in context".to_string()));
        };
        if !self
            .deps
            .user_status
            .referee_deposit_cleared(ctx.tenant_id, referee_id)
            .await?
        {
            return Ok(Some("Referee deposit has not cleared".to_string()));
        }
        Ok(None)
    }

    async fn on_awarded(&self, bonus: &UserBonus, ctx: &BonusContext) -> Result<(), Error> {
        // Referral counters live with the referral collaborator; here we
        // record the linkage for its consumers.
        info!(
            bonus_id = %bonus.user_bonus_id,
            referrer_id = %bonus.user_id,
            referee_id = ?ctx.referee_id,
            "referral bonus awarded to referrer"
        );
        Ok(())
    }
}

pub struct RefereeHandler {
    deps: HandlerDeps,
}

impl RefereeHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for RefereeHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::Referee
    }

    fn deps(&self) -> &HandlerDeps {
        &self.deps
    }

    async fn validate_specific(
        &self,
        _template: &BonusTemplate,
        ctx: &BonusContext,
    ) -> Result<Option<String>, Error> {
        if ctx.referrer_id.is_none() {
            return Ok(Some("No referrer in context".to_string()));
        }
        if !self
            .deps
            .user_status
            .referee_deposit_cleared(ctx.tenant_id, ctx.user_id)
            .await?
        {
            return Ok(Some("Qualifying deposit has not cleared".to_string()));
        }
        Ok(None)
    }
}
