// src/calculator.rs
//
// Pure calculation strategies keyed by the template's value type, plus the
// shared turnover and expiration defaults. Handlers may override turnover
// and expiry per type; the value strategies themselves are fixed.

use chrono::{DateTime, Duration, Utc};

use bonushub_common::models::bonus::{BonusTemplate, BonusValueType};
use bonushub_common::models::context::BonusContext;

use crate::config::EngineConfig;

/// Raw bonus value for (template, context). Percentage and multiplier
/// results are floored and capped by `max_value` when set.
pub fn calculate_value(template: &BonusTemplate, ctx: &BonusContext) -> f64 {
    let base = ctx.deposit_amount.or(ctx.loss_amount).unwrap_or(0.0);

    match template.value_type {
        BonusValueType::Percentage => cap(template, (base * template.value / 100.0).floor()),
        BonusValueType::Fixed => template.value,
        BonusValueType::Multiplier => cap(template, (base * template.value).floor()),
        BonusValueType::Credit | BonusValueType::Points => template.value,
    }
}

fn cap(template: &BonusTemplate, value: f64) -> f64 {
    match template.max_value {
        Some(max) => value.min(max),
        None => value,
    }
}

/// Default turnover requirement: value times the template multiplier.
pub fn calculate_turnover(template: &BonusTemplate, bonus_value: f64) -> f64 {
    bonus_value * template.turnover_multiplier
}

/// Default expiration: template-configured days, else the engine default.
pub fn calculate_expiry(
    template: &BonusTemplate,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let days = template
        .expiration_days
        .unwrap_or(config.default_expiration_days);
    now + Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_context, sample_template};
    use bonushub_common::models::bonus::BonusType;
    use uuid::Uuid;

    #[test]
    fn percentage_is_floored_and_capped() {
        let mut template = sample_template(Uuid::new_v4(), BonusType::Welcome);
        template.value_type = BonusValueType::Percentage;
        template.value = 50.0;
        template.max_value = Some(100.0);

        let mut ctx = sample_context(template.tenant_id);
        ctx.deposit_amount = Some(300.0);

        // floor(300 * 0.5) = 150, capped to 100
        assert_eq!(calculate_value(&template, &ctx), 100.0);

        ctx.deposit_amount = Some(101.0);
        // floor(50.5) = 50, under the cap
        assert_eq!(calculate_value(&template, &ctx), 50.0);
    }

    #[test]
    fn fixed_ignores_base() {
        let mut template = sample_template(Uuid::new_v4(), BonusType::Birthday);
        template.value_type = BonusValueType::Fixed;
        template.value = 25.0;

        let ctx = sample_context(template.tenant_id);
        assert_eq!(calculate_value(&template, &ctx), 25.0);
    }

    #[test]
    fn multiplier_uses_loss_amount_when_no_deposit() {
        let mut template = sample_template(Uuid::new_v4(), BonusType::Cashback);
        template.value_type = BonusValueType::Multiplier;
        template.value = 0.1;

        let mut ctx = sample_context(template.tenant_id);
        ctx.deposit_amount = None;
        ctx.loss_amount = Some(457.0);

        // floor(457 * 0.1) = floor(45.7) = 45
        assert_eq!(calculate_value(&template, &ctx), 45.0);
    }

    #[test]
    fn missing_base_yields_zero_for_percentage() {
        let mut template = sample_template(Uuid::new_v4(), BonusType::Reload);
        template.value_type = BonusValueType::Percentage;
        template.value = 50.0;

        let mut ctx = sample_context(template.tenant_id);
        ctx.deposit_amount = None;
        assert_eq!(calculate_value(&template, &ctx), 0.0);
    }

    #[test]
    fn turnover_scales_by_multiplier() {
        let mut template = sample_template(Uuid::new_v4(), BonusType::FirstDeposit);
        template.turnover_multiplier = 3.0;
        assert_eq!(calculate_turnover(&template, 25.0), 75.0);
    }

    #[test]
    fn expiry_falls_back_to_engine_default() {
        let mut template = sample_template(Uuid::new_v4(), BonusType::Welcome);
        template.expiration_days = None;
        let config = EngineConfig::default();
        let now = Utc::now();
        assert_eq!(
            calculate_expiry(&template, &config, now),
            now + Duration::days(30)
        );

        template.expiration_days = Some(7);
        assert_eq!(
            calculate_expiry(&template, &config, now),
            now + Duration::days(7)
        );
    }
}
