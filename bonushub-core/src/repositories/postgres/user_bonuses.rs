// File: bonushub-core/src/repositories/postgres/user_bonuses.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use bonushub_common::error::Error;
use bonushub_common::models::bonus::{
    BonusDomain, BonusStatus, BonusType, HistoryEntry, UserBonus,
};
use bonushub_common::traits::repository_traits::UserBonusRepository;

pub struct PostgresUserBonusRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresUserBonusRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_bonus(r: &PgRow) -> Result<UserBonus, Error> {
    let type_str: String = r.try_get("bonus_type")?;
    let domain_str: String = r.try_get("domain")?;
    let status_str: String = r.try_get("status")?;
    let history_json: serde_json::Value = r.try_get("history")?;
    let history: Vec<HistoryEntry> = serde_json::from_value(history_json)?;

    Ok(UserBonus {
        user_bonus_id: r.try_get("user_bonus_id")?,
        user_id: r.try_get("user_id")?,
        tenant_id: r.try_get("tenant_id")?,
        template_id: r.try_get("template_id")?,
        template_code: r.try_get("template_code")?,
        bonus_type: BonusType::from_string(&type_str)
            .ok_or_else(|| Error::Parse(format!("unknown bonus_type '{type_str}'")))?,
        domain: BonusDomain::from_string(&domain_str)
            .ok_or_else(|| Error::Parse(format!("unknown domain '{domain_str}'")))?,
        status: BonusStatus::from_string(&status_str)
            .ok_or_else(|| Error::Parse(format!("unknown status '{status_str}'")))?,
        currency: r.try_get("currency")?,
        original_value: r.try_get("original_value")?,
        current_value: r.try_get("current_value")?,
        turnover_required: r.try_get("turnover_required")?,
        turnover_progress: r.try_get("turnover_progress")?,
        wallet_id: r.try_get("wallet_id")?,
        trigger_transaction_id: r.try_get("trigger_transaction_id")?,
        referrer_id: r.try_get("referrer_id")?,
        qualified_at: r.try_get("qualified_at")?,
        claimed_at: r.try_get("claimed_at")?,
        activated_at: r.try_get("activated_at")?,
        expires_at: r.try_get("expires_at")?,
        history,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

const BONUS_COLUMNS: &str = r#"
    user_bonus_id,
    user_id,
    tenant_id,
    template_id,
    template_code,
    bonus_type,
    domain,
    status,
    currency,
    original_value,
    current_value,
    turnover_required,
    turnover_progress,
    wallet_id,
    trigger_transaction_id,
    referrer_id,
    qualified_at,
    claimed_at,
    activated_at,
    expires_at,
    history,
    created_at,
    updated_at
"#;

#[async_trait]
impl UserBonusRepository for PostgresUserBonusRepository {
    async fn insert_user_bonus(&self, b: &UserBonus) -> Result<bool, Error> {
        // The partial unique index on (tenant_id, user_id, template_id,
        // trigger_transaction_id) makes re-delivered events collapse here.
        let sql = format!(
            r#"
            INSERT INTO user_bonuses ({BONUS_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22,$23)
            ON CONFLICT DO NOTHING
            "#
        );
        let res = sqlx::query(&sql)
            .bind(b.user_bonus_id)
            .bind(b.user_id)
            .bind(b.tenant_id)
            .bind(b.template_id)
            .bind(&b.template_code)
            .bind(b.bonus_type.as_str())
            .bind(b.domain.as_str())
            .bind(b.status.as_str())
            .bind(&b.currency)
            .bind(b.original_value)
            .bind(b.current_value)
            .bind(b.turnover_required)
            .bind(b.turnover_progress)
            .bind(b.wallet_id)
            .bind(&b.trigger_transaction_id)
            .bind(b.referrer_id)
            .bind(b.qualified_at)
            .bind(b.claimed_at)
            .bind(b.activated_at)
            .bind(b.expires_at)
            .bind(serde_json::to_value(&b.history)?)
            .bind(b.created_at)
            .bind(b.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn get_user_bonus(&self, user_bonus_id: Uuid) -> Result<Option<UserBonus>, Error> {
        let sql = format!(
            r#"
            SELECT {BONUS_COLUMNS}
            FROM user_bonuses
            WHERE user_bonus_id = $1
            "#
        );
        let row_opt = sqlx::query(&sql)
            .bind(user_bonus_id)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.map(|r| row_to_bonus(&r)).transpose()
    }

    async fn find_by_trigger(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        template_id: Uuid,
        trigger_transaction_id: &str,
    ) -> Result<Option<UserBonus>, Error> {
        let sql = format!(
            r#"
            SELECT {BONUS_COLUMNS}
            FROM user_bonuses
            WHERE tenant_id = $1
              AND user_id = $2
              AND template_id = $3
              AND trigger_transaction_id = $4
            "#
        );
        let row_opt = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(user_id)
            .bind(template_id)
            .bind(trigger_transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.map(|r| row_to_bonus(&r)).transpose()
    }

    async fn count_for_template(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        template_id: Uuid,
    ) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt
            FROM user_bonuses
            WHERE tenant_id = $1
              AND user_id = $2
              AND template_id = $3
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(template_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("cnt")?)
    }

    async fn list_active_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        currency: &str,
    ) -> Result<Vec<UserBonus>, Error> {
        let sql = format!(
            r#"
            SELECT {BONUS_COLUMNS}
            FROM user_bonuses
            WHERE tenant_id = $1
              AND user_id = $2
              AND status = 'active'
              AND UPPER(currency) = UPPER($3)
            ORDER BY activated_at ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(user_id)
            .bind(currency)
            .fetch_all(&self.pool)
            .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_bonus(&r)?);
        }
        Ok(list)
    }

    async fn list_active_expired(&self, now: DateTime<Utc>) -> Result<Vec<UserBonus>, Error> {
        let sql = format!(
            r#"
            SELECT {BONUS_COLUMNS}
            FROM user_bonuses
            WHERE status = 'active'
              AND expires_at < $1
            "#
        );
        let rows = sqlx::query(&sql).bind(now).fetch_all(&self.pool).await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_bonus(&r)?);
        }
        Ok(list)
    }

    async fn update_active_bonus(&self, b: &UserBonus) -> Result<bool, Error> {
        // Guarded write: a bonus that already left 'active' is immutable
        // for turnover and lifecycle purposes.
        let res = sqlx::query(
            r#"
            UPDATE user_bonuses
            SET
              status = $1,
              current_value = $2,
              turnover_progress = $3,
              claimed_at = $4,
              history = $5,
              updated_at = $6
            WHERE user_bonus_id = $7
              AND status = 'active'
            "#,
        )
        .bind(b.status.as_str())
        .bind(b.current_value)
        .bind(b.turnover_progress)
        .bind(b.claimed_at)
        .bind(serde_json::to_value(&b.history)?)
        .bind(Utc::now())
        .bind(b.user_bonus_id)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn has_bonus_of_type(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        bonus_type: BonusType,
    ) -> Result<bool, Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt
            FROM user_bonuses
            WHERE tenant_id = $1
              AND user_id = $2
              AND bonus_type = $3
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(bonus_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        let cnt: i64 = row.try_get("cnt")?;
        Ok(cnt > 0)
    }
}
