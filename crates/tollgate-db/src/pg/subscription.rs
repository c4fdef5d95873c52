//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::SubscriptionRow;
use crate::repo::{Change, CreateSubscription, SubscriptionChanges, SubscriptionRepository};

const COLUMNS: &str = "id, tenant_id, tier, status, trial_expires_at, created_at, updated_at";

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_tenant_id(&self, tenant_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {COLUMNS} FROM subscriptions WHERE tenant_id = $1"
        ))
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            INSERT INTO subscriptions (id, tenant_id, tier, status, trial_expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(sub.id)
        .bind(sub.tenant_id)
        .bind(&sub.tier)
        .bind(&sub.status)
        .bind(sub.trial_expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| DbError::from_write(err, "subscription for tenant"))?;

        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: SubscriptionChanges,
    ) -> DbResult<Option<Change<SubscriptionRow>>> {
        let mut tx = self.pool.begin().await?;

        let before = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {COLUMNS} FROM subscriptions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(before) = before else {
            return Ok(None);
        };

        let next = changes.apply(&before, Utc::now());

        let after = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            UPDATE subscriptions
            SET tier = $2, status = $3, trial_expires_at = $4, updated_at = $5
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&next.tier)
        .bind(&next.status)
        .bind(next.trial_expires_at)
        .bind(next.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(Change { before, after }))
    }
}
