// File: bonushub-core/src/handlers/cashback.rs

use async_trait::async_trait;

use bonushub_common::Error;
use bonushub_common::models::bonus::{BonusTemplate, BonusType};
use bonushub_common::models::context::BonusContext;

use super::{BonusHandler, HandlerDeps};

/// Weekly-loss cashback; the calculation base is the loss amount.
pub struct CashbackHandler {
    deps: HandlerDeps,
}

impl CashbackHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for CashbackHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::Cashback
    }

    fn deps(&self) -> &HandlerDeps {
        &self.deps
    }

    async fn validate_specific(
        &self,
        _template: &BonusTemplate,
        ctx: &BonusContext,
    ) -> Result<Option<String>, Error> {
        match ctx.loss_amount {
            Some(loss) if loss > 0.0 => Ok(None),
            _ => Ok(Some("No losses to cash back".to_string())),
        }
    }
}
