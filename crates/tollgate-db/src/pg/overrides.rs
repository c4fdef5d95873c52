//! PostgreSQL override repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::OverrideRow;
use crate::repo::{OverrideRepository, UpsertOverride, Upserted};

const COLUMNS: &str = "id, tenant_id, name, value, created_by, created_at, updated_at";

/// PostgreSQL override repository
#[derive(Clone)]
pub struct PgOverrideRepository {
    pool: PgPool,
}

impl PgOverrideRepository {
    /// Create a new override repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OverrideRepository for PgOverrideRepository {
    async fn find_by_tenant_id(&self, tenant_id: Uuid) -> DbResult<Vec<OverrideRow>> {
        let rows = sqlx::query_as::<_, OverrideRow>(&format!(
            "SELECT {COLUMNS} FROM entitlement_overrides WHERE tenant_id = $1 ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn upsert(&self, input: UpsertOverride) -> DbResult<Upserted> {
        let mut tx = self.pool.begin().await?;

        // Writers for one tenant serialize on the owning subscription, first
        // inserts included, so `before` reflects the last committed write.
        let owner: Option<Uuid> = sqlx::query_scalar(
            "SELECT tenant_id FROM subscriptions WHERE tenant_id = $1 FOR UPDATE",
        )
        .bind(input.tenant_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owner.is_none() {
            return Err(DbError::NotFound);
        }

        let before = sqlx::query_as::<_, OverrideRow>(&format!(
            "SELECT {COLUMNS} FROM entitlement_overrides WHERE tenant_id = $1 AND name = $2"
        ))
        .bind(input.tenant_id)
        .bind(&input.name)
        .fetch_optional(&mut *tx)
        .await?;

        let after = sqlx::query_as::<_, OverrideRow>(&format!(
            r#"
            INSERT INTO entitlement_overrides (id, tenant_id, name, value, created_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, name)
            DO UPDATE SET value = EXCLUDED.value,
                          created_by = EXCLUDED.created_by,
                          updated_at = NOW()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(input.id)
        .bind(input.tenant_id)
        .bind(&input.name)
        .bind(&input.value)
        .bind(input.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| DbError::from_write(err, "override"))?;

        tx.commit().await?;

        Ok(Upserted { before, after })
    }

    async fn delete(&self, tenant_id: Uuid, name: &str) -> DbResult<Option<OverrideRow>> {
        let removed = sqlx::query_as::<_, OverrideRow>(&format!(
            "DELETE FROM entitlement_overrides WHERE tenant_id = $1 AND name = $2 RETURNING {COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(removed)
    }
}
