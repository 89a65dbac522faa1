// File: bonushub-core/src/test_utils/mod.rs
//
// Builders for exercising the engine against the in-memory repositories.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use bonushub_common::models::bonus::{
    BonusDomain, BonusStatus, BonusTemplate, BonusType, BonusValueType, UserBonus,
};
use bonushub_common::models::context::BonusContext;

use crate::config::EngineConfig;
use crate::eventbus::EventBus;
use crate::repositories::memory::{
    MemoryBonusTemplateRepository, MemoryUserBonusRepository, MemoryUserStatusProvider,
};
use crate::services::bonus_service::BonusEngine;

/// A fixed-value template valid for the next 30 days, unrestricted.
pub fn sample_template(tenant_id: Uuid, bonus_type: BonusType) -> BonusTemplate {
    let now = Utc::now();
    BonusTemplate {
        template_id: Uuid::new_v4(),
        tenant_id,
        code: format!("{}_default", bonus_type.as_str()),
        bonus_type,
        domain: BonusDomain::Universal,
        value_type: BonusValueType::Fixed,
        value: 25.0,
        max_value: None,
        min_deposit: None,
        turnover_multiplier: 3.0,
        supported_currencies: vec![],
        eligible_tiers: vec![],
        eligible_categories: vec![],
        max_uses_per_user: None,
        max_uses_total: None,
        current_uses_total: 0,
        expiration_days: Some(30),
        approval_threshold: None,
        valid_from: now - Duration::days(1),
        valid_until: now + Duration::days(30),
        priority: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// A context carrying a 100 USD deposit with a fresh transaction id.
pub fn sample_context(tenant_id: Uuid) -> BonusContext {
    BonusContext {
        currency: Some("USD".to_string()),
        deposit_amount: Some(100.0),
        transaction_id: Some(Uuid::new_v4().to_string()),
        ..BonusContext::new(Uuid::new_v4(), tenant_id)
    }
}

/// An active bonus shaped the way the award pipeline persists it.
pub fn sample_bonus(template: &BonusTemplate, ctx: &BonusContext) -> UserBonus {
    let now = Utc::now();
    UserBonus {
        user_bonus_id: Uuid::new_v4(),
        user_id: ctx.user_id,
        tenant_id: ctx.tenant_id,
        template_id: template.template_id,
        template_code: template.code.clone(),
        bonus_type: template.bonus_type,
        domain: template.domain,
        status: BonusStatus::Active,
        currency: ctx.currency.clone().unwrap_or_else(|| "USD".to_string()),
        original_value: template.value,
        current_value: template.value,
        turnover_required: template.value * template.turnover_multiplier,
        turnover_progress: 0.0,
        wallet_id: ctx.wallet_id,
        trigger_transaction_id: ctx.trigger_transaction_id(),
        referrer_id: ctx.referrer_id,
        qualified_at: now,
        claimed_at: None,
        activated_at: now,
        expires_at: now + Duration::days(30),
        history: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

/// An engine wired to in-memory repositories, plus handles to seed and
/// inspect them.
pub struct TestEngine {
    pub engine: Arc<BonusEngine>,
    pub templates: Arc<MemoryBonusTemplateRepository>,
    pub bonuses: Arc<MemoryUserBonusRepository>,
    pub user_status: Arc<MemoryUserStatusProvider>,
    pub event_bus: EventBus,
}

pub fn build_test_engine(config: EngineConfig) -> TestEngine {
    let templates = Arc::new(MemoryBonusTemplateRepository::new());
    let bonuses = Arc::new(MemoryUserBonusRepository::new());
    let user_status = Arc::new(MemoryUserStatusProvider::new());
    let event_bus = EventBus::new();

    let engine = Arc::new(BonusEngine::new(
        templates.clone(),
        bonuses.clone(),
        user_status.clone(),
        event_bus.clone(),
        config,
    ));

    TestEngine {
        engine,
        templates,
        bonuses,
        user_status,
        event_bus,
    }
}
