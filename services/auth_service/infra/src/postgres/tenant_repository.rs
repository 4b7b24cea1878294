use async_trait::async_trait;
use auth_service_core::domain::model::{CreationOutcome, Tenant};
use auth_service_core::domain::repository::TenantRepository;
use chrono::Utc;
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use super::is_unique_violation;

#[derive(Clone)]
pub struct PgTenantRepository {
    pool: PgPool,
}

impl PgTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PgTenantRepository {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE api_key = $1 AND deleted_at IS NULL",
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn find_by_tenant_secret(&self, tenant_secret: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE tenant_secret = $1 AND deleted_at IS NULL",
        )
        .bind(tenant_secret)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE tenant_id = $1 AND deleted_at IS NULL",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn find_or_create_by_name(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<(Tenant, CreationOutcome), AppError> {
        if let Some(existing) = sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE name = $1 AND deleted_at IS NULL",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok((existing, CreationOutcome::Existing));
        }

        let now = Utc::now();
        let tenant_id = Uuid::new_v4();
        let api_key = generate_secret("ak");
        let tenant_secret = generate_secret("ts");
        let signing_secret = generate_secret("sk");

        let inserted = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (
                tenant_id, name, description, is_active, api_key, tenant_secret,
                signing_secret, created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, true, $4, $5, $6, $7, $7, NULL)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .bind(&api_key)
        .bind(&tenant_secret)
        .bind(&signing_secret)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(tenant) => Ok((tenant, CreationOutcome::Created)),
            Err(e) if is_unique_violation(&e) => {
                // Lost the race to a concurrent creation under the same name.
                tracing::debug!(%name, "tenant creation raced, falling back to lookup");
                let tenant = sqlx::query_as::<_, Tenant>(
                    "SELECT * FROM tenants WHERE name = $1 AND deleted_at IS NULL",
                )
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
                Ok((tenant, CreationOutcome::Existing))
            },
            Err(e) => Err(e.into()),
        }
    }
}

fn generate_secret(prefix: &str) -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{prefix}_{}", hex::encode(bytes))
}
