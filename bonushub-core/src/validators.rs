// src/validators.rs
//
// Ordered common eligibility checks applied to every bonus type before
// any type-specific validation. Short-circuits on the first failure.
// Read-only: no validator touches a counter or writes a row.

use tracing::debug;

use bonushub_common::Error;
use bonushub_common::models::bonus::BonusTemplate;
use bonushub_common::models::context::BonusContext;
use bonushub_common::traits::repository_traits::UserBonusRepository;

/// `None` = all common checks passed; `Some(reason)` = ineligible.
pub async fn run_common_validators(
    template: &BonusTemplate,
    ctx: &BonusContext,
    bonuses: &dyn UserBonusRepository,
) -> Result<Option<String>, Error> {
    // 1. Currency support
    if let Some(currency) = &ctx.currency {
        if !template.supported_currencies.is_empty()
            && !template
                .supported_currencies
                .iter()
                .any(|c| c.eq_ignore_ascii_case(currency))
        {
            debug!(
                template = %template.code,
                currency = %currency,
                "bonus rejected: unsupported currency"
            );
            return Ok(Some(format!("Currency {currency} not supported")));
        }
    }

    // 2. Minimum deposit
    if let (Some(min), Some(amount)) = (template.min_deposit, ctx.deposit_amount) {
        if amount < min {
            debug!(
                template = %template.code,
                amount,
                min,
                "bonus rejected: below minimum deposit"
            );
            return Ok(Some(format!("Minimum deposit of {min} required")));
        }
    }

    // 3. Tier restriction, when the caller knows the user's tier
    if let Some(tier) = &ctx.tier {
        if !template.eligible_tiers.is_empty()
            && !template
                .eligible_tiers
                .iter()
                .any(|t| t.eq_ignore_ascii_case(tier))
        {
            debug!(template = %template.code, tier = %tier, "bonus rejected: tier not eligible");
            return Ok(Some(format!("Tier {tier} not eligible")));
        }
    }

    // 4. Per-user usage cap
    if let Some(max_per_user) = template.max_uses_per_user {
        let used = bonuses
            .count_for_template(ctx.tenant_id, ctx.user_id, template.template_id)
            .await?;
        if used >= max_per_user as i64 {
            debug!(
                template = %template.code,
                used,
                max_per_user,
                "bonus rejected: per-user cap reached"
            );
            return Ok(Some("Maximum uses per user reached".to_string()));
        }
    }

    // 5. Global usage cap (advisory read; the award path re-checks this
    //    with the atomic capped increment)
    if let Some(max_total) = template.max_uses_total {
        if template.current_uses_total >= max_total {
            debug!(template = %template.code, "bonus rejected: global cap reached");
            return Ok(Some("Bonus no longer available".to_string()));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::MemoryUserBonusRepository;
    use crate::test_utils::{sample_bonus, sample_context, sample_template};
    use bonushub_common::models::bonus::BonusType;
    use uuid::Uuid;

    #[tokio::test]
    async fn rejects_unsupported_currency() {
        let bonuses = MemoryUserBonusRepository::new();
        let mut template = sample_template(Uuid::new_v4(), BonusType::Welcome);
        template.supported_currencies = vec!["USD".into(), "EUR".into()];

        let mut ctx = sample_context(template.tenant_id);
        ctx.currency = Some("GBP".into());

        let reason = run_common_validators(&template, &ctx, &bonuses)
            .await
            .unwrap();
        assert_eq!(reason, Some("Currency GBP not supported".to_string()));
    }

    #[tokio::test]
    async fn accepts_any_currency_when_unrestricted() {
        let bonuses = MemoryUserBonusRepository::new();
        let template = sample_template(Uuid::new_v4(), BonusType::Welcome);

        let mut ctx = sample_context(template.tenant_id);
        ctx.currency = Some("JPY".into());
        ctx.deposit_amount = Some(500.0);

        let reason = run_common_validators(&template, &ctx, &bonuses)
            .await
            .unwrap();
        assert_eq!(reason, None);
    }

    #[tokio::test]
    async fn rejects_below_minimum_deposit() {
        let bonuses = MemoryUserBonusRepository::new();
        let mut template = sample_template(Uuid::new_v4(), BonusType::FirstDeposit);
        template.min_deposit = Some(20.0);

        let mut ctx = sample_context(template.tenant_id);
        ctx.deposit_amount = Some(10.0);

        let reason = run_common_validators(&template, &ctx, &bonuses)
            .await
            .unwrap();
        assert_eq!(reason, Some("Minimum deposit of 20 required".to_string()));
    }

    #[tokio::test]
    async fn rejects_tier_outside_eligible_set() {
        let bonuses = MemoryUserBonusRepository::new();
        let mut template = sample_template(Uuid::new_v4(), BonusType::TierUpgrade);
        template.eligible_tiers = vec!["gold".into(), "platinum".into()];

        let mut ctx = sample_context(template.tenant_id);
        ctx.tier = Some("bronze".into());
        let reason = run_common_validators(&template, &ctx, &bonuses)
            .await
            .unwrap();
        assert_eq!(reason, Some("Tier bronze not eligible".to_string()));

        // Case-insensitive match, like the currency check.
        ctx.tier = Some("GOLD".into());
        let reason = run_common_validators(&template, &ctx, &bonuses)
            .await
            .unwrap();
        assert_eq!(reason, None);
    }

    #[tokio::test]
    async fn rejects_when_per_user_cap_reached() {
        let bonuses = MemoryUserBonusRepository::new();
        let mut template = sample_template(Uuid::new_v4(), BonusType::Reload);
        template.max_uses_per_user = Some(1);

        let ctx = sample_context(template.tenant_id);
        bonuses
            .insert_user_bonus(&sample_bonus(&template, &ctx))
            .await
            .unwrap();

        // A fresh transaction for the same user trips the cap.
        let mut next = ctx.clone();
        next.transaction_id = Some(Uuid::new_v4().to_string());
        let reason = run_common_validators(&template, &next, &bonuses)
            .await
            .unwrap();
        assert_eq!(reason, Some("Maximum uses per user reached".to_string()));

        // Another user is unaffected.
        let other = sample_context(template.tenant_id);
        let reason = run_common_validators(&template, &other, &bonuses)
            .await
            .unwrap();
        assert_eq!(reason, None);
    }

    #[tokio::test]
    async fn rejects_when_global_cap_exhausted() {
        let bonuses = MemoryUserBonusRepository::new();
        let mut template = sample_template(Uuid::new_v4(), BonusType::Reload);
        template.max_uses_total = Some(100);
        template.current_uses_total = 100;

        let ctx = sample_context(template.tenant_id);
        let reason = run_common_validators(&template, &ctx, &bonuses)
            .await
            .unwrap();
        assert_eq!(reason, Some("Bonus no longer available".to_string()));
    }
}
