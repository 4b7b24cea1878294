use async_trait::async_trait;
use auth_service_core::domain::model::RefreshFamily;
use auth_service_core::domain::repository::RefreshFamilyRepository;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgRefreshFamilyRepository {
    pool: PgPool,
}

impl PgRefreshFamilyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshFamilyRepository for PgRefreshFamilyRepository {
    async fn create(
        &self,
        jti: Uuid,
        bound_user_id: Uuid,
        bound_tenant_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshFamily, AppError> {
        let family_id = Uuid::new_v4();
        let now = Utc::now();

        let family = sqlx::query_as::<_, RefreshFamily>(
            r#"
            INSERT INTO refresh_families (
                family_id, current_jti, previous_jti, issued_at, expires_at,
                bound_user_id, bound_tenant_id, revoked
            )
            VALUES ($1, $2, NULL, $3, $4, $5, $6, false)
            RETURNING *
            "#,
        )
        .bind(family_id)
        .bind(jti)
        .bind(now)
        .bind(expires_at)
        .bind(bound_user_id)
        .bind(bound_tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(family)
    }

    async fn find_by_id(&self, family_id: Uuid) -> Result<Option<RefreshFamily>, AppError> {
        let family = sqlx::query_as::<_, RefreshFamily>(
            "SELECT * FROM refresh_families WHERE family_id = $1",
        )
        .bind(family_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(family)
    }

    /// The reuse-detection CAS (§4.9.3/§5): the `UPDATE ... WHERE current_jti
    /// = $old` either rotates the sole live generation or, if another
    /// request already rotated or the presented `jti` is stale, affects zero
    /// rows. In that case the whole family is revoked and `None` is
    /// returned — there is no partial state between the two statements that
    /// a concurrent `rotate` could observe.
    async fn rotate(
        &self,
        family_id: Uuid,
        old_jti: Uuid,
        new_jti: Uuid,
        new_expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshFamily>, AppError> {
        let rotated = sqlx::query_as::<_, RefreshFamily>(
            r#"
            UPDATE refresh_families
            SET current_jti = $3, previous_jti = $2, expires_at = $4
            WHERE family_id = $1 AND current_jti = $2 AND revoked = false
            RETURNING *
            "#,
        )
        .bind(family_id)
        .bind(old_jti)
        .bind(new_jti)
        .bind(new_expires_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(family) = rotated {
            return Ok(Some(family));
        }

        sqlx::query("UPDATE refresh_families SET revoked = true WHERE family_id = $1")
            .bind(family_id)
            .execute(&self.pool)
            .await?;

        Ok(None)
    }

    async fn revoke(&self, family_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE refresh_families SET revoked = true WHERE family_id = $1")
            .bind(family_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE refresh_families SET revoked = true WHERE bound_user_id = $1 AND revoked = false",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
