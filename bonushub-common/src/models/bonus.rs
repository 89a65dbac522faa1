// File: bonushub-common/src/models/bonus.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bonus families with distinct award behavior. Stored as snake_case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusType {
    Welcome,
    FirstDeposit,
    Reload,
    FirstPurchase,
    FirstAction,
    DailyLogin,
    Birthday,
    TierUpgrade,
    Achievement,
    Referral,
    Referee,
    Cashback,
}

impl BonusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusType::Welcome => "welcome",
            BonusType::FirstDeposit => "first_deposit",
            BonusType::Reload => "reload",
            BonusType::FirstPurchase => "first_purchase",
            BonusType::FirstAction => "first_action",
            BonusType::DailyLogin => "daily_login",
            BonusType::Birthday => "birthday",
            BonusType::TierUpgrade => "tier_upgrade",
            BonusType::Achievement => "achievement",
            BonusType::Referral => "referral",
            BonusType::Referee => "referee",
            BonusType::Cashback => "cashback",
        }
    }

    pub fn from_string(s: &str) -> Option<BonusType> {
        match s {
            "welcome" => Some(BonusType::Welcome),
            "first_deposit" => Some(BonusType::FirstDeposit),
            "reload" => Some(BonusType::Reload),
            "first_purchase" => Some(BonusType::FirstPurchase),
            "first_action" => Some(BonusType::FirstAction),
            "daily_login" => Some(BonusType::DailyLogin),
            "birthday" => Some(BonusType::Birthday),
            "tier_upgrade" => Some(BonusType::TierUpgrade),
            "achievement" => Some(BonusType::Achievement),
            "referral" => Some(BonusType::Referral),
            "referee" => Some(BonusType::Referee),
            "cashback" => Some(BonusType::Cashback),
            _ => None,
        }
    }

    /// The deposit-triggered subset evaluated by `handle_deposit`.
    pub fn deposit_triggered() -> &'static [BonusType] {
        &[BonusType::Welcome, BonusType::FirstDeposit, BonusType::Reload]
    }
}

impl std::fmt::Display for BonusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusDomain {
    Betting,
    Crypto,
    Social,
    Gaming,
    Ecommerce,
    Fintech,
    Universal,
}

impl BonusDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusDomain::Betting => "betting",
            BonusDomain::Crypto => "crypto",
            BonusDomain::Social => "social",
            BonusDomain::Gaming => "gaming",
            BonusDomain::Ecommerce => "ecommerce",
            BonusDomain::Fintech => "fintech",
            BonusDomain::Universal => "universal",
        }
    }

    pub fn from_string(s: &str) -> Option<BonusDomain> {
        match s {
            "betting" => Some(BonusDomain::Betting),
            "crypto" => Some(BonusDomain::Crypto),
            "social" => Some(BonusDomain::Social),
            "gaming" => Some(BonusDomain::Gaming),
            "ecommerce" => Some(BonusDomain::Ecommerce),
            "fintech" => Some(BonusDomain::Fintech),
            "universal" => Some(BonusDomain::Universal),
            _ => None,
        }
    }
}

/// How the raw bonus value is derived from the template + context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusValueType {
    Percentage,
    Fixed,
    Multiplier,
    Credit,
    Points,
}

impl BonusValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusValueType::Percentage => "percentage",
            BonusValueType::Fixed => "fixed",
            BonusValueType::Multiplier => "multiplier",
            BonusValueType::Credit => "credit",
            BonusValueType::Points => "points",
        }
    }

    pub fn from_string(s: &str) -> Option<BonusValueType> {
        match s {
            "percentage" => Some(BonusValueType::Percentage),
            "fixed" => Some(BonusValueType::Fixed),
            "multiplier" => Some(BonusValueType::Multiplier),
            "credit" => Some(BonusValueType::Credit),
            "points" => Some(BonusValueType::Points),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusStatus {
    Active,
    Converted,
    Forfeited,
    Expired,
    Cancelled,
}

impl BonusStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusStatus::Active => "active",
            BonusStatus::Converted => "converted",
            BonusStatus::Forfeited => "forfeited",
            BonusStatus::Expired => "expired",
            BonusStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Option<BonusStatus> {
        match s {
            "active" => Some(BonusStatus::Active),
            "converted" => Some(BonusStatus::Converted),
            "forfeited" => Some(BonusStatus::Forfeited),
            "expired" => Some(BonusStatus::Expired),
            "cancelled" => Some(BonusStatus::Cancelled),
            _ => None,
        }
    }
}

/// Admin-managed, tenant-scoped award rules. This engine only reads
/// templates, except for the atomic usage-counter increment on award.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusTemplate {
    pub template_id: Uuid,
    pub tenant_id: Uuid,
    /// Unique per tenant.
    pub code: String,
    pub bonus_type: BonusType,
    pub domain: BonusDomain,
    pub value_type: BonusValueType,
    pub value: f64,
    pub max_value: Option<f64>,
    pub min_deposit: Option<f64>,
    pub turnover_multiplier: f64,
    /// Empty = any currency.
    pub supported_currencies: Vec<String>,
    /// Empty = any tier.
    pub eligible_tiers: Vec<String>,
    /// Activity categories counting toward turnover. Empty = all.
    pub eligible_categories: Vec<String>,
    pub max_uses_per_user: Option<i32>,
    pub max_uses_total: Option<i32>,
    /// Mutated only via the atomic capped increment on award.
    pub current_uses_total: i32,
    /// Bonus lifetime in days; engine default applies when unset.
    pub expiration_days: Option<i64>,
    /// Awards at or above this value need manual sign-off.
    pub approval_threshold: Option<f64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub priority: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BonusTemplate {
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }
}

/// Append-only audit trail entry on a user bonus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<BonusStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub triggered_by: String,
}

/// A bonus awarded to a user. Never physically deleted; lifecycle changes
/// append to `history` and flip `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBonus {
    pub user_bonus_id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub template_id: Uuid,
    pub template_code: String,
    pub bonus_type: BonusType,
    pub domain: BonusDomain,
    pub status: BonusStatus,
    pub currency: String,
    pub original_value: f64,
    pub current_value: f64,
    pub turnover_required: f64,
    pub turnover_progress: f64,
    pub wallet_id: Option<Uuid>,
    /// Idempotency key: deposit/transaction id that triggered the award.
    pub trigger_transaction_id: Option<String>,
    pub referrer_id: Option<Uuid>,
    pub qualified_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub activated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserBonus {
    pub fn is_active(&self) -> bool {
        self.status == BonusStatus::Active
    }

    pub fn append_history(
        &mut self,
        action: &str,
        new_status: Option<BonusStatus>,
        amount: Option<f64>,
        triggered_by: &str,
    ) {
        self.history.push(HistoryEntry {
            timestamp: Utc::now(),
            action: action.to_string(),
            new_status,
            amount,
            triggered_by: triggered_by.to_string(),
        });
        self.updated_at = Utc::now();
    }
}
