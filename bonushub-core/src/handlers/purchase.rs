// File: bonushub-core/src/handlers/purchase.rs
//
// First-purchase and first-action bonuses. Both gate on read-only flags
// from the user-status collaborator.

use async_trait::async_trait;

use bonushub_common::Error;
use bonushub_common::models::bonus::{BonusTemplate, BonusType};
use bonushub_common::models::context::BonusContext;

use super::{BonusHandler, HandlerDeps};

pub struct FirstPurchaseHandler {
    deps: HandlerDeps,
}

impl FirstPurchaseHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for FirstPurchaseHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::FirstPurchase
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
            .user_status
            .has_prior_purchase(ctx.tenant_id, ctx.user_id)
            .await?
        {
            return Ok(Some("Not the user's first purchase".to_string()));
        }
        Ok(None)
    }
}

pub struct FirstActionHandler {
    deps: HandlerDeps,
}

impl FirstActionHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for FirstActionHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::FirstAction
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
            .user_status
            .has_prior_action(ctx.tenant_id, ctx.user_id)
            .await?
        {
            return Ok(Some("Not the user's first action".to_string()));
        }
        Ok(None)
    }
}
