// File: bonushub-common/src/models/approval.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::bonus::BonusType;
use crate::models::context::{BonusCalculation, BonusContext};

/// A not-yet-granted award waiting for human sign-off. Ephemeral and
/// TTL-backed: redeemed exactly once or dropped when `expires_at` passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingBonusApproval {
    /// Opaque, unguessable, single-use handle.
    pub token: String,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub template_id: Uuid,
    pub template_code: String,
    pub bonus_type: BonusType,
    pub calculated_value: f64,
    pub currency: Option<String>,
    pub deposit_amount: Option<f64>,
    /// Full envelope needed to re-run the award on approval.
    pub context: BonusContext,
    pub calculation: BonusCalculation,
    pub requested_at: DateTime<Utc>,
    pub requested_by: Option<String>,
    pub reason: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl PendingBonusApproval {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
