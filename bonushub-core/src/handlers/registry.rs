// File: bonushub-core/src/handlers/registry.rs

use std::collections::HashMap;
use std::sync::Arc;

use bonushub_common::Error;
use bonushub_common::models::bonus::BonusType;

use super::cashback::CashbackHandler;
use super::deposit::{FirstDepositHandler, ReloadHandler, WelcomeHandler};
use super::engagement::{
    AchievementHandler, BirthdayHandler, DailyLoginHandler, TierUpgradeHandler,
};
use super::purchase::{FirstActionHandler, FirstPurchaseHandler};
use super::referral::{RefereeHandler, ReferralHandler};
use super::{BonusHandler, HandlerDeps};

/// Resolves a bonus type to its handler. Built exactly once, with all
/// dependencies, before any event is processed; a registry without its
/// dependencies is unrepresentable. Unknown types fail loudly.
pub struct HandlerRegistry {
    handlers: HashMap<BonusType, Arc<dyn BonusHandler>>,
}

impl HandlerRegistry {
    pub fn new(deps: HandlerDeps) -> Self {
        let mut handlers: HashMap<BonusType, Arc<dyn BonusHandler>> = HashMap::new();

        handlers.insert(
            BonusType::Welcome,
            Arc::new(WelcomeHandler::new(deps.clone())),
        );
        handlers.insert(
            BonusType::FirstDeposit,
            Arc::new(FirstDepositHandler::new(deps.clone())),
        );
        handlers.insert(
            BonusType::Reload,
            Arc::new(ReloadHandler::new(deps.clone())),
        );
        handlers.insert(
            BonusType::FirstPurchase,
            Arc::new(FirstPurchaseHandler::new(deps.clone())),
        );
        handlers.insert(
            BonusType::FirstAction,
            Arc::new(FirstActionHandler::new(deps.clone())),
        );
        handlers.insert(
            BonusType::DailyLogin,
            Arc::new(DailyLoginHandler::new(deps.clone())),
        );
        handlers.insert(
            BonusType::Birthday,
            Arc::new(BirthdayHandler::new(deps.clone())),
        );
        handlers.insert(
            BonusType::TierUpgrade,
            Arc::new(TierUpgradeHandler::new(deps.clone())),
        );
        handlers.insert(
            BonusType::Achievement,
            Arc::new(AchievementHandler::new(deps.clone())),
        );
        handlers.insert(
            BonusType::Referral,
            Arc::new(ReferralHandler::new(deps.clone())),
        );
        handlers.insert(
            BonusType::Referee,
            Arc::new(RefereeHandler::new(deps.clone())),
        );
        handlers.insert(BonusType::Cashback, Arc::new(CashbackHandler::new(deps)));

        Self { handlers }
    }

    pub fn get(&self, bonus_type: BonusType) -> Result<Arc<dyn BonusHandler>, Error> {
        self.handlers
            .get(&bonus_type)
            .cloned()
            .ok_or_else(|| Error::HandlerNotFound(bonus_type.as_str().to_string()))
    }
}
