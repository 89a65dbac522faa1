// File: bonushub-core/src/handlers/engagement.rs
//
// Engagement-driven bonuses: daily login streaks, birthdays, tier
// upgrades, achievements. These are awarded directly via the facade's
// `award` entry point rather than a handle_* fan-out.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use bonushub_common::Error;
use bonushub_common::models::bonus::{BonusTemplate, BonusType};
use bonushub_common::models::context::BonusContext;

use super::{BonusHandler, HandlerDeps};

/// Login-streak bonus: the template value scales with consecutive days,
/// and the award is short-lived (hours, not the usual 30-day window).
pub struct DailyLoginHandler {
    deps: HandlerDeps,
}

/// Streak multiplier is capped so a long streak cannot run away.
const MAX_STREAK_DAYS: i32 = 30;

/// Login bonuses expire fast; claim it or lose it.
const LOGIN_BONUS_TTL_HOURS: i64 = 48;

impl DailyLoginHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for DailyLoginHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::DailyLogin
    }

    fn deps(&self) -> &HandlerDeps {
        &self.deps
    }

    fn calculate_value(&self, template: &BonusTemplate, ctx: &BonusContext) -> f64 {
        let days = ctx.consecutive_days.unwrap_or(1).clamp(1, MAX_STREAK_DAYS);
        let value = (template.value * days as f64).floor();
        match template.max_value {
            Some(max) => value.min(max),
            None => value,
        }
    }

    fn expires_at(&self, _template: &BonusTemplate, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::hours(LOGIN_BONUS_TTL_HOURS)
    }
}

pub struct BirthdayHandler {
    deps: HandlerDeps,
}

impl BirthdayHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for BirthdayHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::Birthday
    }

    fn deps(&self) -> &HandlerDeps {
        &self.deps
    }
}

pub struct TierUpgradeHandler {
    deps: HandlerDeps,
}

impl TierUpgradeHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for TierUpgradeHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::TierUpgrade
    }

    fn deps(&self) -> &HandlerDeps {
        &self.deps
    }

    async fn validate_specific(
        &self,
        _template: &BonusTemplate,
        ctx: &BonusContext,
    ) -> Result<Option<String>, Error> {
        if ctx.new_tier.is_none() {
            return Ok(Some("No tier provided".to_string()));
        }
        Ok(None)
    }
}

pub struct AchievementHandler {
    deps: HandlerDeps,
}

impl AchievementHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl BonusHandler for AchievementHandler {
    fn bonus_type(&self) -> BonusType {
        BonusType::Achievement
    }

    fn deps(&self) -> &HandlerDeps {
        &self.deps
    }

    async fn validate_specific(
        &self,
        _template: &BonusTemplate,
        ctx: &BonusContext,
    ) -> Result<Option<String>, Error> {
        if ctx.achievement_code.is_none() {
            return Ok(Some("No achievement code provided".to_string()));
        }
        Ok(None)
    }
}
