// src/approval.rs
//
// Issues and redeems the short-lived, single-use tokens that gate
// high-value awards. The store is process-local and TTL-backed; pending
// approvals are ephemeral: a redeemed or expired token is gone, and a
// crash simply drops outstanding requests.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use rand::RngCore;
use tracing::info;
use uuid::Uuid;

use bonushub_common::models::approval::PendingBonusApproval;
use bonushub_common::models::bonus::BonusTemplate;
use bonushub_common::models::context::{BonusCalculation, BonusContext};

use crate::config::EngineConfig;

pub struct ApprovalGateway {
    window_hours: i64,
    default_threshold: Option<f64>,
    pending: DashMap<String, PendingBonusApproval>,
}

impl ApprovalGateway {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            window_hours: config.approval_window_hours,
            default_threshold: config.default_approval_threshold,
            pending: DashMap::new(),
        }
    }

    /// Whether an award of `value` needs manual sign-off: at or above the
    /// template threshold, falling back to the tenant-wide default.
    pub fn requires_approval(&self, template: &BonusTemplate, value: f64) -> bool {
        match template.approval_threshold.or(self.default_threshold) {
            Some(threshold) => value >= threshold,
            None => false,
        }
    }

    /// Store the full context/calculation under a fresh token and return it.
    pub fn create_pending(
        &self,
        template: &BonusTemplate,
        ctx: &BonusContext,
        calculation: BonusCalculation,
    ) -> String {
        let token = generate_token();
        let now = Utc::now();
        let pending = PendingBonusApproval {
            token: token.clone(),
            user_id: ctx.user_id,
            tenant_id: ctx.tenant_id,
            template_id: template.template_id,
            template_code: template.code.clone(),
            bonus_type: template.bonus_type,
            calculated_value: calculation.bonus_value,
            currency: ctx.currency.clone(),
            deposit_amount: ctx.deposit_amount,
            context: ctx.clone(),
            calculation,
            requested_at: now,
            requested_by: ctx.requested_by.clone(),
            reason: ctx.reason.clone(),
            expires_at: now + Duration::hours(self.window_hours),
        };
        info!(
            token = %token,
            template = %template.code,
            value = calculation.bonus_value,
            "bonus award pending approval"
        );
        self.pending.insert(token.clone(), pending);
        token
    }

    /// Atomic check-and-delete. Exactly one caller wins a race between
    /// approve and reject (or two approves); losers get `None`. Expired
    /// tokens are dropped rather than returned.
    pub fn take(&self, token: &str) -> Option<PendingBonusApproval> {
        let (_, pending) = self.pending.remove(token)?;
        if pending.is_expired(Utc::now()) {
            info!(token = %token, "pending approval expired before redemption");
            return None;
        }
        Some(pending)
    }

    /// Read-only peek for operators; expired entries read as absent.
    pub fn get(&self, token: &str) -> Option<PendingBonusApproval> {
        let entry = self.pending.get(token)?;
        if entry.is_expired(Utc::now()) {
            return None;
        }
        Some(entry.value().clone())
    }

    /// Operator listing, optionally filtered by tenant.
    pub fn list(&self, tenant_id: Option<Uuid>) -> Vec<PendingBonusApproval> {
        let now = Utc::now();
        self.pending
            .iter()
            .filter(|e| !e.is_expired(now))
            .filter(|e| tenant_id.is_none_or(|t| e.tenant_id == t))
            .map(|e| e.value().clone())
            .collect()
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.pending.len();
        self.pending.retain(|_, p| !p.is_expired(now));
        before - self.pending.len()
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
