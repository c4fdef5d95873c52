//! PostgreSQL audit repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::AuditRow;
use crate::repo::{AuditRepository, CreateAuditEntry};

/// PostgreSQL audit repository
#[derive(Clone)]
pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    /// Create a new audit repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn append(&self, entry: CreateAuditEntry) -> DbResult<AuditRow> {
        let row = sqlx::query_as::<_, AuditRow>(
            r#"
            INSERT INTO audit_log (id, actor_id, tenant_id, action, diff)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, actor_id, tenant_id, action, diff, created_at
            "#,
        )
        .bind(entry.id)
        .bind(entry.actor_id)
        .bind(entry.tenant_id)
        .bind(&entry.action)
        .bind(&entry.diff)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_tenant_id(&self, tenant_id: Uuid, limit: i64) -> DbResult<Vec<AuditRow>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, actor_id, tenant_id, action, diff, created_at
            FROM audit_log
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
