// File: bonushub-core/src/repositories/memory.rs
//
// In-memory repositories with the same atomicity contracts as the
// Postgres implementations. Backing store for unit tests and local runs;
// every capped increment, idempotent insert and guarded update happens
// under a single store lock.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use bonushub_common::error::Error;
use bonushub_common::models::bonus::{BonusStatus, BonusTemplate, BonusType, UserBonus};
use bonushub_common::traits::repository_traits::{
    BonusTemplateRepository, UserBonusRepository, UserStatusProvider,
};

#[derive(Default)]
pub struct MemoryBonusTemplateRepository {
    templates: Mutex<HashMap<Uuid, BonusTemplate>>,
}

impl MemoryBonusTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BonusTemplateRepository for MemoryBonusTemplateRepository {
    async fn create_template(&self, template: &BonusTemplate) -> Result<(), Error> {
        let mut map = self.templates.lock().await;
        map.insert(template.template_id, template.clone());
        Ok(())
    }

    async fn get_template(&self, template_id: Uuid) -> Result<Option<BonusTemplate>, Error> {
        let map = self.templates.lock().await;
        Ok(map.get(&template_id).cloned())
    }

    async fn get_template_by_code(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<BonusTemplate>, Error> {
        let map = self.templates.lock().await;
        Ok(map
            .values()
            .find(|t| t.tenant_id == tenant_id && t.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn find_active_by_type(
        &self,
        tenant_id: Uuid,
        bonus_type: BonusType,
        now: DateTime<Utc>,
    ) -> Result<Option<BonusTemplate>, Error> {
        let map = self.templates.lock().await;
        let mut candidates: Vec<&BonusTemplate> = map
            .values()
            .filter(|t| {
                t.tenant_id == tenant_id
                    && t.bonus_type == bonus_type
                    && t.is_active
                    && t.is_within_window(now)
            })
            .collect();
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(candidates.first().map(|t| (*t).clone()))
    }

    async fn try_increment_uses(&self, template_id: Uuid) -> Result<bool, Error> {
        let mut map = self.templates.lock().await;
        let Some(t) = map.get_mut(&template_id) else {
            return Ok(false);
        };
        if let Some(cap) = t.max_uses_total {
            if t.current_uses_total >= cap {
                return Ok(false);
            }
        }
        t.current_uses_total += 1;
        t.updated_at = Utc::now();
        Ok(true)
    }

    async fn release_use(&self, template_id: Uuid) -> Result<(), Error> {
        let mut map = self.templates.lock().await;
        if let Some(t) = map.get_mut(&template_id) {
            if t.current_uses_total > 0 {
                t.current_uses_total -= 1;
                t.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn update_template(&self, template: &BonusTemplate) -> Result<(), Error> {
        let mut map = self.templates.lock().await;
        if let Some(existing) = map.get_mut(&template.template_id) {
            // The usage counter only moves through try_increment_uses.
            let uses = existing.current_uses_total;
            *existing = template.clone();
            existing.current_uses_total = uses;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserBonusRepository {
    bonuses: Mutex<HashMap<Uuid, UserBonus>>,
}

impl MemoryUserBonusRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserBonusRepository for MemoryUserBonusRepository {
    async fn insert_user_bonus(&self, bonus: &UserBonus) -> Result<bool, Error> {
        let mut map = self.bonuses.lock().await;
        if let Some(key) = &bonus.trigger_transaction_id {
            let duplicate = map.values().any(|b| {
                b.tenant_id == bonus.tenant_id
                    && b.user_id == bonus.user_id
                    && b.template_id == bonus.template_id
                    && b.trigger_transaction_id.as_deref() == Some(key.as_str())
            });
            if duplicate {
                return Ok(false);
            }
        }
        map.insert(bonus.user_bonus_id, bonus.clone());
        Ok(true)
    }

    async fn get_user_bonus(&self, user_bonus_id: Uuid) -> Result<Option<UserBonus>, Error> {
        let map = self.bonuses.lock().await;
        Ok(map.get(&user_bonus_id).cloned())
    }

    async fn find_by_trigger(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        template_id: Uuid,
        trigger_transaction_id: &str,
    ) -> Result<Option<UserBonus>, Error> {
        let map = self.bonuses.lock().await;
        Ok(map
            .values()
            .find(|b| {
                b.tenant_id == tenant_id
                    && b.user_id == user_id
                    && b.template_id == template_id
                    && b.trigger_transaction_id.as_deref() == Some(trigger_transaction_id)
            })
            .cloned())
    }

    async fn count_for_template(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        template_id: Uuid,
    ) -> Result<i64, Error> {
        let map = self.bonuses.lock().await;
        Ok(map
            .values()
            .filter(|b| {
                b.tenant_id == tenant_id && b.user_id == user_id && b.template_id == template_id
            })
            .count() as i64)
    }

    async fn list_active_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        currency: &str,
    ) -> Result<Vec<UserBonus>, Error> {
        let map = self.bonuses.lock().await;
        let mut list: Vec<UserBonus> = map
            .values()
            .filter(|b| {
                b.tenant_id == tenant_id
                    && b.user_id == user_id
                    && b.status == BonusStatus::Active
                    && b.currency.eq_ignore_ascii_case(currency)
            })
            .cloned()
            .collect();
        list.sort_by_key(|b| b.activated_at);
        Ok(list)
    }

    async fn list_active_expired(&self, now: DateTime<Utc>) -> Result<Vec<UserBonus>, Error> {
        let map = self.bonuses.lock().await;
        Ok(map
            .values()
            .filter(|b| b.status == BonusStatus::Active && b.expires_at < now)
            .cloned()
            .collect())
    }

    async fn update_active_bonus(&self, bonus: &UserBonus) -> Result<bool, Error> {
        let mut map = self.bonuses.lock().await;
        match map.get_mut(&bonus.user_bonus_id) {
            Some(existing) if existing.status == BonusStatus::Active => {
                *existing = bonus.clone();
                existing.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn has_bonus_of_type(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        bonus_type: BonusType,
    ) -> Result<bool, Error> {
        let map = self.bonuses.lock().await;
        Ok(map
            .values()
            .any(|b| b.tenant_id == tenant_id && b.user_id == user_id && b.bonus_type == bonus_type))
    }
}

/// Flag-based stand-in for the user-status collaborator.
#[derive(Default)]
pub struct MemoryUserStatusProvider {
    deposited: Mutex<HashSet<(Uuid, Uuid)>>,
    purchased: Mutex<HashSet<(Uuid, Uuid)>>,
    acted: Mutex<HashSet<(Uuid, Uuid)>>,
    cleared_referees: Mutex<HashSet<(Uuid, Uuid)>>,
}

impl MemoryUserStatusProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mark_deposited(&self, tenant_id: Uuid, user_id: Uuid) {
        self.deposited.lock().await.insert((tenant_id, user_id));
    }

    pub async fn mark_purchased(&self, tenant_id: Uuid, user_id: Uuid) {
        self.purchased.lock().await.insert((tenant_id, user_id));
    }

    pub async fn mark_acted(&self, tenant_id: Uuid, user_id: Uuid) {
        self.acted.lock().await.insert((tenant_id, user_id));
    }

    pub async fn mark_referee_cleared(&self, tenant_id: Uuid, referee_id: Uuid) {
        self.cleared_referees
            .lock()
            .await
            .insert((tenant_id, referee_id));
    }
}

#[async_trait]
impl UserStatusProvider for MemoryUserStatusProvider {
    async fn has_prior_deposit(&self, tenant_id: Uuid, user_id: Uuid) -> Result<bool, Error> {
        Ok(self.deposited.lock().await.contains(&(tenant_id, user_id)))
    }

    async fn has_prior_purchase(&self, tenant_id: Uuid, user_id: Uuid) -> Result<bool, Error> {
        Ok(self.purchased.lock().await.contains(&(tenant_id, user_id)))
    }

    async fn has_prior_action(&self, tenant_id: Uuid, user_id: Uuid) -> Result<bool, Error> {
        Ok(self.acted.lock().await.contains(&(tenant_id, user_id)))
    }

    async fn referee_deposit_cleared(
        &self,
        tenant_id: Uuid,
        referee_id: Uuid,
    ) -> Result<bool, Error> {
        Ok(self
            .cleared_referees
            .lock()
            .await
            .contains(&(tenant_id, referee_id)))
    }
}
