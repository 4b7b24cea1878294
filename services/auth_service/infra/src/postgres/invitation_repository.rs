use async_trait::async_trait;
use auth_service_core::domain::model::Invitation;
use auth_service_core::domain::repository::InvitationRepository;
use chrono::{Duration, Utc};
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgInvitationRepository {
    pool: PgPool,
}

impl PgInvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationRepository for PgInvitationRepository {
    async fn issue(&self, tenant_id: Uuid, code: &str, ttl_hours: i64) -> Result<Invitation, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(ttl_hours);

        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (code, tenant_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(tenant_id)
        .bind(expires_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(invitation)
    }

    /// Atomic delete-if-present-and-valid: a single statement, no separate
    /// lookup, so two concurrent consumers of the same code can never both
    /// succeed.
    async fn consume(&self, code: &str, tenant_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM invitations WHERE code = $1 AND tenant_id = $2 AND expires_at > now()",
        )
        .bind(code)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
