// File: bonushub-core/src/repositories/postgres/bonus_templates.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use bonushub_common::error::Error;
use bonushub_common::models::bonus::{
    BonusDomain, BonusTemplate, BonusType, BonusValueType,
};
use bonushub_common::traits::repository_traits::BonusTemplateRepository;

pub struct PostgresBonusTemplateRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresBonusTemplateRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_template(r: &PgRow) -> Result<BonusTemplate, Error> {
    let type_str: String = r.try_get("bonus_type")?;
    let domain_str: String = r.try_get("domain")?;
    let value_type_str: String = r.try_get("value_type")?;

    Ok(BonusTemplate {
        template_id: r.try_get("template_id")?,
        tenant_id: r.try_get("tenant_id")?,
        code: r.try_get("code")?,
        bonus_type: BonusType::from_string(&type_str)
            .ok_or_else(|| Error::Parse(format!("unknown bonus_type '{type_str}'")))?,
        domain: BonusDomain::from_string(&domain_str)
            .ok_or_else(|| Error::Parse(format!("unknown domain '{domain_str}'")))?,
        value_type: BonusValueType::from_string(&value_type_str)
            .ok_or_else(|| Error::Parse(format!("unknown value_type '{value_type_str}'")))?,
        value: r.try_get("value")?,
        max_value: r.try_get("max_value")?,
        min_deposit: r.try_get("min_deposit")?,
        turnover_multiplier: r.try_get("turnover_multiplier")?,
        supported_currencies: r.try_get("supported_currencies")?,
        eligible_tiers: r.try_get("eligible_tiers")?,
        eligible_categories: r.try_get("eligible_categories")?,
        max_uses_per_user: r.try_get("max_uses_per_user")?,
        max_uses_total: r.try_get("max_uses_total")?,
        current_uses_total: r.try_get("current_uses_total")?,
        expiration_days: r.try_get("expiration_days")?,
        approval_threshold: r.try_get("approval_threshold")?,
        valid_from: r.try_get("valid_from")?,
        valid_until: r.try_get("valid_until")?,
        priority: r.try_get("priority")?,
        is_active: r.try_get("is_active")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

const TEMPLATE_COLUMNS: &str = r#"
    template_id,
    tenant_id,
    code,
    bonus_type,
    domain,
    value_type,
    value,
    max_value,
    min_deposit,
    turnover_multiplier,
    supported_currencies,
    eligible_tiers,
    eligible_categories,
    max_uses_per_user,
    max_uses_total,
    current_uses_total,
    expiration_days,
    approval_threshold,
    valid_from,
    valid_until,
    priority,
    is_active,
    created_at,
    updated_at
"#;

#[async_trait]
impl BonusTemplateRepository for PostgresBonusTemplateRepository {
    async fn create_template(&self, t: &BonusTemplate) -> Result<(), Error> {
        let sql = format!(
            r#"
            INSERT INTO bonus_templates ({TEMPLATE_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22,$23,$24)
            "#
        );
        sqlx::query(&sql)
            .bind(t.template_id)
            .bind(t.tenant_id)
            .bind(&t.code)
            .bind(t.bonus_type.as_str())
            .bind(t.domain.as_str())
            .bind(t.value_type.as_str())
            .bind(t.value)
            .bind(t.max_value)
            .bind(t.min_deposit)
            .bind(t.turnover_multiplier)
            .bind(&t.supported_currencies)
            .bind(&t.eligible_tiers)
            .bind(&t.eligible_categories)
            .bind(t.max_uses_per_user)
            .bind(t.max_uses_total)
            .bind(t.current_uses_total)
            .bind(t.expiration_days)
            .bind(t.approval_threshold)
            .bind(t.valid_from)
            .bind(t.valid_until)
            .bind(t.priority)
            .bind(t.is_active)
            .bind(t.created_at)
            .bind(t.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_template(&self, template_id: Uuid) -> Result<Option<BonusTemplate>, Error> {
        let sql = format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM bonus_templates
            WHERE template_id = $1
            "#
        );
        let row_opt = sqlx::query(&sql)
            .bind(template_id)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.map(|r| row_to_template(&r)).transpose()
    }

    async fn get_template_by_code(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<BonusTemplate>, Error> {
        let sql = format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM bonus_templates
            WHERE tenant_id = $1
              AND LOWER(code) = LOWER($2)
            "#
        );
        let row_opt = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.map(|r| row_to_template(&r)).transpose()
    }

    async fn find_active_by_type(
        &self,
        tenant_id: Uuid,
        bonus_type: BonusType,
        now: DateTime<Utc>,
    ) -> Result<Option<BonusTemplate>, Error> {
        let sql = format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM bonus_templates
            WHERE tenant_id = $1
              AND bonus_type = $2
              AND is_active = TRUE
              AND valid_from <= $3
              AND valid_until >= $3
            ORDER BY priority DESC
            LIMIT 1
            "#
        );
        let row_opt = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(bonus_type.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.map(|r| row_to_template(&r)).transpose()
    }

    async fn try_increment_uses(&self, template_id: Uuid) -> Result<bool, Error> {
        // Server-side ceiling check. Never read-then-write: two concurrent
        // awards racing for the last slot must see exactly one winner.
        let res = sqlx::query(
            r#"
            UPDATE bonus_templates
            SET current_uses_total = current_uses_total + 1,
                updated_at = NOW()
            WHERE template_id = $1
              AND (max_uses_total IS NULL OR current_uses_total < max_uses_total)
            "#,
        )
        .bind(template_id)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn release_use(&self, template_id: Uuid) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE bonus_templates
            SET current_uses_total = current_uses_total - 1,
                updated_at = NOW()
            WHERE template_id = $1
              AND current_uses_total > 0
            "#,
        )
        .bind(template_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_template(&self, t: &BonusTemplate) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE bonus_templates
            SET
              code = $1,
              bonus_type = $2,
              domain = $3,
              value_type = $4,
              value = $5,
              max_value = $6,
              min_deposit = $7,
              turnover_multiplier = $8,
              supported_currencies = $9,
              eligible_tiers = $10,
              eligible_categories = $11,
              max_uses_per_user = $12,
              max_uses_total = $13,
              expiration_days = $14,
              approval_threshold = $15,
              valid_from = $16,
              valid_until = $17,
              priority = $18,
              is_active = $19,
              updated_at = $20
            WHERE template_id = $21
            "#,
        )
        .bind(&t.code)
        .bind(t.bonus_type.as_str())
        .bind(t.domain.as_str())
        .bind(t.value_type.as_str())
        .bind(t.value)
        .bind(t.max_value)
        .bind(t.min_deposit)
        .bind(t.turnover_multiplier)
        .bind(&t.supported_currencies)
        .bind(&t.eligible_tiers)
        .bind(&t.eligible_categories)
        .bind(t.max_uses_per_user)
        .bind(t.max_uses_total)
        .bind(t.expiration_days)
        .bind(t.approval_threshold)
        .bind(t.valid_from)
        .bind(t.valid_until)
        .bind(t.priority)
        .bind(t.is_active)
        .bind(Utc::now())
        .bind(t.template_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
