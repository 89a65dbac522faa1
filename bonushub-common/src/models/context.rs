// File: bonushub-common/src/models/context.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::bonus::UserBonus;

/// Transient input envelope carried through one award evaluation.
/// Built from an inbound domain event; never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BonusContext {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub currency: Option<String>,
    pub deposit_amount: Option<f64>,
    pub loss_amount: Option<f64>,
    pub wallet_id: Option<Uuid>,
    pub transaction_id: Option<String>,
    pub deposit_id: Option<String>,
    pub referrer_id: Option<Uuid>,
    pub referee_id: Option<Uuid>,
    pub category: Option<String>,
    pub consecutive_days: Option<i32>,
    pub achievement_code: Option<String>,
    pub new_tier: Option<String>,
    /// The user's current loyalty tier, when the caller knows it.
    pub tier: Option<String>,
    pub requested_by: Option<String>,
    pub reason: Option<String>,
}

impl BonusContext {
    pub fn new(user_id: Uuid, tenant_id: Uuid) -> Self {
        Self {
            user_id,
            tenant_id,
            ..Default::default()
        }
    }

    /// The idempotency key for an award produced from this context.
    pub fn trigger_transaction_id(&self) -> Option<String> {
        self.deposit_id
            .clone()
            .or_else(|| self.transaction_id.clone())
    }
}

/// Output of the calculation step, fed into the approval gate and award.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BonusCalculation {
    pub bonus_value: f64,
    pub turnover_required: f64,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of one award attempt. Ineligibility and the approval gate are
/// expected business results, not errors.
#[derive(Debug, Clone)]
pub enum AwardOutcome {
    Awarded(UserBonus),
    /// Duplicate trigger transaction: the earlier bonus is returned as-is.
    AlreadyAwarded(UserBonus),
    Ineligible { reason: String },
    PendingApproval { token: String },
}

impl AwardOutcome {
    pub fn is_awarded(&self) -> bool {
        matches!(self, AwardOutcome::Awarded(_))
    }

    pub fn bonus(&self) -> Option<&UserBonus> {
        match self {
            AwardOutcome::Awarded(b) | AwardOutcome::AlreadyAwarded(b) => Some(b),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------
// Inbound domain events (minimum field contract from the bus messages).
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositEvent {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub transaction_id: Option<String>,
    pub deposit_id: Option<String>,
    pub wallet_id: Option<Uuid>,
}

impl DepositEvent {
    pub fn context(&self) -> BonusContext {
        BonusContext {
            currency: Some(self.currency.clone()),
            deposit_amount: Some(self.amount),
            wallet_id: self.wallet_id,
            transaction_id: self.transaction_id.clone(),
            deposit_id: self.deposit_id.clone(),
            ..BonusContext::new(self.user_id, self.tenant_id)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseEvent {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub transaction_id: Option<String>,
    pub category: Option<String>,
    pub wallet_id: Option<Uuid>,
}

impl PurchaseEvent {
    pub fn context(&self) -> BonusContext {
        BonusContext {
            currency: Some(self.currency.clone()),
            deposit_amount: Some(self.amount),
            wallet_id: self.wallet_id,
            transaction_id: self.transaction_id.clone(),
            category: self.category.clone(),
            ..BonusContext::new(self.user_id, self.tenant_id)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub currency: Option<String>,
    pub amount: Option<f64>,
    pub transaction_id: Option<String>,
    pub category: Option<String>,
}

impl ActionEvent {
    pub fn context(&self) -> BonusContext {
        BonusContext {
            currency: self.currency.clone(),
            deposit_amount: self.amount,
            transaction_id: self.transaction_id.clone(),
            category: self.category.clone(),
            ..BonusContext::new(self.user_id, self.tenant_id)
        }
    }
}

/// Wagering/spend activity counting toward turnover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub category: Option<String>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEvent {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub consecutive_days: i32,
    pub currency: Option<String>,
}

impl LoginEvent {
    pub fn context(&self) -> BonusContext {
        BonusContext {
            currency: self.currency.clone(),
            consecutive_days: Some(self.consecutive_days),
            ..BonusContext::new(self.user_id, self.tenant_id)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralEvent {
    pub referrer_id: Uuid,
    pub referee_id: Uuid,
    pub tenant_id: Uuid,
    pub deposit_amount: Option<f64>,
    pub currency: Option<String>,
}

impl ReferralEvent {
    /// Context for the referrer-side award.
    pub fn referrer_context(&self) -> BonusContext {
        BonusContext {
            currency: self.currency.clone(),
            deposit_amount: self.deposit_amount,
            referee_id: Some(self.referee_id),
            ..BonusContext::new(self.referrer_id, self.tenant_id)
        }
    }

    /// Context for the referee-side award.
    pub fn referee_context(&self) -> BonusContext {
        BonusContext {
            currency: self.currency.clone(),
            deposit_amount: self.deposit_amount,
            referrer_id: Some(self.referrer_id),
            ..BonusContext::new(self.referee_id, self.tenant_id)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementEvent {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub achievement_code: String,
    pub currency: Option<String>,
}

impl AchievementEvent {
    pub fn context(&self) -> BonusContext {
        BonusContext {
            currency: self.currency.clone(),
            achievement_code: Some(self.achievement_code.clone()),
            ..BonusContext::new(self.user_id, self.tenant_id)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierUpgradeEvent {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub new_tier: String,
    pub currency: Option<String>,
}

impl TierUpgradeEvent {
    pub fn context(&self) -> BonusContext {
        BonusContext {
            currency: self.currency.clone(),
            new_tier: Some(self.new_tier.clone()),
            ..BonusContext::new(self.user_id, self.tenant_id)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyLossEvent {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub loss_amount: f64,
    pub currency: String,
}

impl WeeklyLossEvent {
    pub fn context(&self) -> BonusContext {
        BonusContext {
            currency: Some(self.currency.clone()),
            loss_amount: Some(self.loss_amount),
            ..BonusContext::new(self.user_id, self.tenant_id)
        }
    }
}
