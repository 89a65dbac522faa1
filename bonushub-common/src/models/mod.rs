// File: bonushub-common/src/models/mod.rs

pub mod approval;
pub mod bonus;
pub mod context;

pub use approval::PendingBonusApproval;
pub use bonus::{
    BonusDomain, BonusStatus, BonusTemplate, BonusType, BonusValueType, HistoryEntry, UserBonus,
};
pub use context::{
    AchievementEvent, ActionEvent, ActivityEvent, AwardOutcome, BonusCalculation, BonusContext,
    DepositEvent, LoginEvent, PurchaseEvent, ReferralEvent, TierUpgradeEvent, WeeklyLossEvent,
};
