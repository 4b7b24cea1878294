use async_trait::async_trait;
use auth_service_core::domain::model::{Membership, User};
use auth_service_core::domain::repository::UserRepository;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use shared_types::Role;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::is_unique_violation;

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A user row joined with its membership in one tenant. `sqlx` composes
/// `FromRow` only over flat scalar columns, so the join query aliases every
/// overlapping column (`created_at`, `updated_at`, `deleted_at`, `role`)
/// rather than relying on a `(User, Membership)` tuple decode.
#[derive(FromRow)]
struct UserMembershipRow {
    user_id: Uuid,
    canonical_email: String,
    username: String,
    password_hash: String,
    user_role: Role,
    user_created_at: DateTime<Utc>,
    user_updated_at: DateTime<Utc>,
    user_deleted_at: Option<DateTime<Utc>>,
    tenant_id: Uuid,
    membership_role: Role,
    membership_created_at: DateTime<Utc>,
    membership_updated_at: DateTime<Utc>,
    membership_deleted_at: Option<DateTime<Utc>>,
}

impl From<UserMembershipRow> for (User, Membership) {
    fn from(row: UserMembershipRow) -> Self {
        let user = User {
            user_id: row.user_id,
            canonical_email: row.canonical_email,
            username: row.username,
            password_hash: row.password_hash,
            role: row.user_role,
            created_at: row.user_created_at,
            updated_at: row.user_updated_at,
            deleted_at: row.user_deleted_at,
        };
        let membership = Membership {
            tenant_id: row.tenant_id,
            user_id: user.user_id,
            role: row.membership_role,
            created_at: row.membership_created_at,
            updated_at: row.membership_updated_at,
            deleted_at: row.membership_deleted_at,
        };
        (user, membership)
    }
}

const USER_MEMBERSHIP_JOIN: &str = r#"
    SELECT
        u.user_id, u.canonical_email, u.username, u.password_hash,
        u.role AS user_role,
        u.created_at AS user_created_at,
        u.updated_at AS user_updated_at,
        u.deleted_at AS user_deleted_at,
        m.tenant_id,
        m.role AS membership_role,
        m.created_at AS membership_created_at,
        m.updated_at AS membership_updated_at,
        m.deleted_at AS membership_deleted_at
    FROM users u
    JOIN memberships m ON m.user_id = u.user_id
"#;

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email_anywhere(&self, email_ci: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE canonical_email = $1 AND deleted_at IS NULL",
        )
        .bind(email_ci)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_in_tenant_by_email(
        &self,
        tenant_id: Uuid,
        email_ci: &str,
    ) -> Result<Option<(User, Membership)>, AppError> {
        let query = format!(
            "{USER_MEMBERSHIP_JOIN} WHERE m.tenant_id = $1 AND u.canonical_email = $2 \
             AND u.deleted_at IS NULL AND m.deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, UserMembershipRow>(&query)
            .bind(tenant_id)
            .bind(email_ci)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_in_tenant_by_username(
        &self,
        tenant_id: Uuid,
        username: &str,
    ) -> Result<Option<(User, Membership)>, AppError> {
        let query = format!(
            "{USER_MEMBERSHIP_JOIN} WHERE m.tenant_id = $1 AND u.username = $2 \
             AND u.deleted_at IS NULL AND m.deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, UserMembershipRow>(&query)
            .bind(tenant_id)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create_identity_with_membership(
        &self,
        tenant_id: Uuid,
        canonical_email: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let user_id = Uuid::new_v4();

        let insert_user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, canonical_email, username, password_hash, role, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6, NULL)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(canonical_email)
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(now)
        .fetch_one(&mut *tx)
        .await;

        let user = match insert_user {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict("Email already exists".to_string()))
            },
            Err(e) => return Err(e.into()),
        };

        let insert_membership = sqlx::query(
            r#"
            INSERT INTO memberships (tenant_id, user_id, role, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $4, NULL)
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role)
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert_membership {
            return if is_unique_violation(&e) {
                Err(AppError::Conflict("Email already exists".to_string()))
            } else {
                Err(e.into())
            };
        }

        tx.commit().await?;
        Ok(user)
    }

    async fn attach_membership(&self, tenant_id: Uuid, user_id: Uuid, role: Role) -> Result<(), AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO memberships (tenant_id, user_id, role, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $4, NULL)
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::Conflict("Email already exists".to_string()))
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn create_admin_with_invitation(
        &self,
        tenant_id: Uuid,
        canonical_email: &str,
        username: &str,
        password_hash: &str,
        invitation_code: &str,
    ) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let consumed = sqlx::query(
            "DELETE FROM invitations WHERE code = $1 AND tenant_id = $2 AND expires_at > now()",
        )
        .bind(invitation_code)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() == 0 {
            // Rolling back (implicit on drop) leaves the code untouched if it
            // existed but raced with another consumer.
            return Err(AppError::RoleForbidden("Invalid or missing invitation code".to_string()));
        }

        let now = Utc::now();
        let user_id = Uuid::new_v4();

        let insert_user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, canonical_email, username, password_hash, role, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, 'admin', $5, $5, NULL)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(canonical_email)
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .fetch_one(&mut *tx)
        .await;

        let user = match insert_user {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict("Email already exists".to_string()))
            },
            Err(e) => return Err(e.into()),
        };

        sqlx::query(
            r#"
            INSERT INTO memberships (tenant_id, user_id, role, created_at, updated_at, deleted_at)
            VALUES ($1, $2, 'admin', $3, $3, NULL)
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn update_password_hash(&self, user_id: Uuid, new_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE user_id = $1")
            .bind(user_id)
            .bind(new_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET deleted_at = now(), updated_at = now() WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE memberships SET deleted_at = now(), updated_at = now() WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE refresh_families SET revoked = true WHERE bound_user_id = $1 AND revoked = false",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
