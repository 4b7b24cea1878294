use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use uuid::Uuid;

use super::model::{CreationOutcome, Invitation, Membership, RefreshFamily, Tenant, User};

/// Transactional persistence of tenants, users, memberships, refresh-token
/// families, and invitation codes.
///
/// Implementations must make `rotate` and `create_admin_with_invitation`
/// atomic — they are where reuse detection and invitation single-use rest.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Tenant>, AppError>;
    async fn find_by_tenant_secret(&self, tenant_secret: &str) -> Result<Option<Tenant>, AppError>;
    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError>;

    /// Idempotent on `name` among non-deleted tenants: re-creating an
    /// existing active name returns the existing row unchanged.
    async fn find_or_create_by_name(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<(Tenant, CreationOutcome), AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Case-insensitive; excludes soft-deleted rows. Scans across all
    /// tenants (needed to enforce the cross-tenant role-mixing invariant).
    async fn find_by_email_anywhere(&self, email_ci: &str) -> Result<Option<User>, AppError>;

    /// Excludes soft-deleted rows; scoped to the membership inside `tenant_id`.
    async fn find_in_tenant_by_email(
        &self,
        tenant_id: Uuid,
        email_ci: &str,
    ) -> Result<Option<(User, Membership)>, AppError>;

    async fn find_in_tenant_by_username(
        &self,
        tenant_id: Uuid,
        username: &str,
    ) -> Result<Option<(User, Membership)>, AppError>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    /// Creates a brand-new identity plus its membership in `tenant_id`.
    /// Fails with `Conflict` if the (email, username) uniqueness invariant
    /// is violated within the tenant.
    async fn create_identity_with_membership(
        &self,
        tenant_id: Uuid,
        canonical_email: &str,
        username: &str,
        password_hash: &str,
        role: shared_types::Role,
    ) -> Result<User, AppError>;

    /// Attaches an already-existing `role = user` identity to a second
    /// tenant, reusing its `user_id` (§3's cross-tenant reuse contract).
    /// Fails with `Conflict` if a membership for this user already exists in
    /// `tenant_id`.
    async fn attach_membership(&self, tenant_id: Uuid, user_id: Uuid, role: shared_types::Role) -> Result<(), AppError>;

    /// Atomically consumes `invitation_code` and creates a fresh `role =
    /// admin` identity + membership. If the user insert fails after the code
    /// is looked up, the whole operation rolls back and the code remains
    /// valid (§4.7) — implementations must run this in a single transaction.
    async fn create_admin_with_invitation(
        &self,
        tenant_id: Uuid,
        canonical_email: &str,
        username: &str,
        password_hash: &str,
        invitation_code: &str,
    ) -> Result<User, AppError>;

    async fn update_password_hash(&self, user_id: Uuid, new_hash: &str) -> Result<(), AppError>;

    /// Soft delete + cascades to revoke every refresh family of the user.
    async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait RefreshFamilyRepository: Send + Sync {
    async fn create(
        &self,
        jti: Uuid,
        bound_user_id: Uuid,
        bound_tenant_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshFamily, AppError>;

    async fn find_by_id(&self, family_id: Uuid) -> Result<Option<RefreshFamily>, AppError>;

    /// Atomic compare-and-swap on `current_jti`. Returns the rotated family
    /// on success. On mismatch (reuse or lost race) the family is revoked and
    /// `Ok(None)` is returned — never partially applied.
    async fn rotate(
        &self,
        family_id: Uuid,
        old_jti: Uuid,
        new_jti: Uuid,
        new_expires_at: DateTime<Utc>,
    ) -> Result<Option<RefreshFamily>, AppError>;

    /// Idempotent.
    async fn revoke(&self, family_id: Uuid) -> Result<(), AppError>;

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn issue(&self, tenant_id: Uuid, code: &str, ttl_hours: i64) -> Result<Invitation, AppError>;

    /// Atomic delete-if-present-and-valid. `Ok(true)` iff the code existed,
    /// was bound to `tenant_id`, and had not expired.
    async fn consume(&self, code: &str, tenant_id: Uuid) -> Result<bool, AppError>;
}
