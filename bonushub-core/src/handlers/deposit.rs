// File: bonushub-core/src/handlers/deposit.rs
//
// Deposit-triggered bonus types: welcome, first_deposit (FTD), reload.

use async_trait::async_trait;

use bonushub_common::Error;
use bonushub_common::models::bonus::{BonusTemplate, BonusType};
use bonushub_common::models::context::BonusContext;

use super::{BonusHandler, HandlerDeps};

/// One-time welcome bonus, granted on the qualifying deposit.
pub struct WelcomeHandler {
    deps: HandlerDeps,
}

impl WelcomeHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for WelcomeHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::Welcome
    }

    fn deps(&self) -> &HandlerDeps {
        &self.deps
    }

    async fn validate_specific(
        &self,
        _template: &BonusTemplate,
        ctx: &BonusContext,
    ) -> Result<Option<String>, Error> {
        if self
            .deps
            .bonuses
            .has_bonus_of_type(ctx.tenant_id, ctx.user_id, BonusType::Welcome)
            .await?
        {
            return Ok(Some("Welcome bonus already granted".to_string()));
        }
        Ok(None)
    }
}

/// First-time deposit bonus; consults the user-status collaborator for
/// the FTD flag.
pub struct FirstDepositHandler {
    deps: HandlerDeps,
}

impl FirstDepositHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for FirstDepositHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::FirstDeposit
    }

    fn deps(&self) -> &HandlerDeps {
        &self.deps
    }

    async fn validate_specific(
        &self,
        _template: &BonusTemplate,
        ctx: &BonusContext,
    ) -> Result<Option<String>, Error> {
        if ctx.deposit_amount.is_none() {
            return Ok(Some("No deposit in context".to_string()));
        }
        if self
            .deps
            .user_status
            .has_prior_deposit(ctx.tenant_id, ctx.user_id)
            .await?
        {
            return Ok(Some("Not the user's first deposit".to_string()));
        }
        if self
            .deps
            .bonuses
            .has_bonus_of_type(ctx.tenant_id, ctx.user_id, BonusType::FirstDeposit)
            .await?
        {
            return Ok(Some("First-deposit bonus already granted".to_string()));
        }
        Ok(None)
    }
}

/// Reload bonus for repeat depositors.
pub struct ReloadHandler {
    deps: HandlerDeps,
}

impl ReloadHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for ReloadHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::Reload
    }

    fn deps(&self) -> &HandlerDeps {
        &self.deps
    }

    async fn validate_specific(
        &self,
        _template: &BonusTemplate,
        ctx: &BonusContext,
    ) -> Result<Option<String>, Error> {
        if ctx.deposit_amount.is_none() {
            return Ok(Some("No deposit in context".to_string()));
        }
        if !self
            .deps
            .user_status
            .has_prior_deposit(ctx.tenant_id, ctx.user_id)
            .await?
        {
            return Ok(Some("Reload bonus requires an earlier deposit".to_string()));
        }
        Ok(None)
    }
}
