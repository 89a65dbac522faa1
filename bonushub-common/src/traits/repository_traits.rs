// File: bonushub-common/src/traits/repository_traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::models::bonus::{BonusTemplate, BonusType, UserBonus};

#[async_trait]
pub trait BonusTemplateRepository: Send + Sync {
    async fn create_template(&self, template: &BonusTemplate) -> Result<(), Error>;

    async fn get_template(&self, template_id: Uuid) -> Result<Option<BonusTemplate>, Error>;

    async fn get_template_by_code(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<BonusTemplate>, Error>;

    /// The active template for (tenant, type) whose validity window contains
    /// `now`; highest `priority` wins when several match.
    async fn find_active_by_type(
        &self,
        tenant_id: Uuid,
        bonus_type: BonusType,
        now: DateTime<Utc>,
    ) -> Result<Option<BonusTemplate>, Error>;

    /// Atomic capped increment of `current_uses_total`. Returns `false`
    /// when the counter is already at `max_uses_total` (award must not
    /// proceed); read-then-write sequences are forbidden here.
    async fn try_increment_uses(&self, template_id: Uuid) -> Result<bool, Error>;

    /// Compensating decrement for a slot consumed by an award that later
    /// collapsed onto an existing row. Floors at zero.
    async fn release_use(&self, template_id: Uuid) -> Result<(), Error>;

    async fn update_template(&self, template: &BonusTemplate) -> Result<(), Error>;
}

#[async_trait]
pub trait UserBonusRepository: Send + Sync {
    /// Idempotent insert keyed on
    /// (tenant_id, user_id, template_id, trigger_transaction_id).
    /// Returns `false` when a bonus with the same key already exists;
    /// no second row is created.
    async fn insert_user_bonus(&self, bonus: &UserBonus) -> Result<bool, Error>;

    async fn get_user_bonus(&self, user_bonus_id: Uuid) -> Result<Option<UserBonus>, Error>;

    async fn find_by_trigger(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        template_id: Uuid,
        trigger_transaction_id: &str,
    ) -> Result<Option<UserBonus>, Error>;

    /// How many bonuses this user already holds from this template,
    /// regardless of status (per-user cap input).
    async fn count_for_template(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        template_id: Uuid,
    ) -> Result<i64, Error>;

    async fn list_active_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        currency: &str,
    ) -> Result<Vec<UserBonus>, Error>;

    /// Active bonuses whose `expires_at` is before `now` (sweep input).
    async fn list_active_expired(&self, now: DateTime<Utc>) -> Result<Vec<UserBonus>, Error>;

    /// Persist an update to a bonus only while it is still `active`.
    /// Returns `false` if the row had already left `active` (the write is
    /// then a no-op; lifecycle invariant).
    async fn update_active_bonus(&self, bonus: &UserBonus) -> Result<bool, Error>;

    async fn has_bonus_of_type(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        bonus_type: BonusType,
    ) -> Result<bool, Error>;
}

/// Read-only boundary to the user-status collaborator. The flags describe
/// the user's state *before* the event currently being processed.
#[async_trait]
pub trait UserStatusProvider: Send + Sync {
    async fn has_prior_deposit(&self, tenant_id: Uuid, user_id: Uuid) -> Result<bool, Error>;

    async fn has_prior_purchase(&self, tenant_id: Uuid, user_id: Uuid) -> Result<bool, Error>;

    async fn has_prior_action(&self, tenant_id: Uuid, user_id: Uuid) -> Result<bool, Error>;

    /// Whether the referee's qualifying deposit has cleared (referral gate).
    async fn referee_deposit_cleared(&self, tenant_id: Uuid, referee_id: Uuid)
        -> Result<bool, Error>;
}
