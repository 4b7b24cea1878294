//! Mock repository implementations for exercising the auth state machine
//! without a database.

use async_trait::async_trait;
use auth_service_core::domain::model::{CreationOutcome, Invitation, Membership, RefreshFamily, Tenant, User};
use auth_service_core::domain::repository::{
    InvitationRepository, RefreshFamilyRepository, TenantRepository, UserRepository,
};
use chrono::{DateTime, Utc};
use mockall::mock;
use shared_error::AppError;
use shared_types::Role;
use uuid::Uuid;

mock! {
    pub TenantRepo {}

    #[async_trait]
    impl TenantRepository for TenantRepo {
        async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Tenant>, AppError>;
        async fn find_by_tenant_secret(&self, tenant_secret: &str) -> Result<Option<Tenant>, AppError>;
        async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError>;
        async fn find_or_create_by_name(&self, name: &str, description: Option<&str>) -> Result<(Tenant, CreationOutcome), AppError>;
    }
}

mock! {
    pub UserRepo {}

    #[async_trait]
    impl UserRepository for UserRepo {
        async fn find_by_email_anywhere(&self, email_ci: &str) -> Result<Option<User>, AppError>;
        async fn find_in_tenant_by_email(&self, tenant_id: Uuid, email_ci: &str) -> Result<Option<(User, Membership)>, AppError>;
        async fn find_in_tenant_by_username(&self, tenant_id: Uuid, username: &str) -> Result<Option<(User, Membership)>, AppError>;
        async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;
        async fn create_identity_with_membership(&self, tenant_id: Uuid, canonical_email: &str, username: &str, password_hash: &str, role: Role) -> Result<User, AppError>;
        async fn attach_membership(&self, tenant_id: Uuid, user_id: Uuid, role: Role) -> Result<(), AppError>;
        async fn create_admin_with_invitation(&self, tenant_id: Uuid, canonical_email: &str, username: &str, password_hash: &str, invitation_code: &str) -> Result<User, AppError>;
        async fn update_password_hash(&self, user_id: Uuid, new_hash: &str) -> Result<(), AppError>;
        async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError>;
    }
}

mock! {
    pub RefreshRepo {}

    #[async_trait]
    impl RefreshFamilyRepository for RefreshRepo {
        async fn create(&self, jti: Uuid, bound_user_id: Uuid, bound_tenant_id: Uuid, expires_at: DateTime<Utc>) -> Result<RefreshFamily, AppError>;
        async fn find_by_id(&self, family_id: Uuid) -> Result<Option<RefreshFamily>, AppError>;
        async fn rotate(&self, family_id: Uuid, old_jti: Uuid, new_jti: Uuid, new_expires_at: DateTime<Utc>) -> Result<Option<RefreshFamily>, AppError>;
        async fn revoke(&self, family_id: Uuid) -> Result<(), AppError>;
        async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<(), AppError>;
    }
}

mock! {
    pub InvitationRepo {}

    #[async_trait]
    impl InvitationRepository for InvitationRepo {
        async fn issue(&self, tenant_id: Uuid, code: &str, ttl_hours: i64) -> Result<Invitation, AppError>;
        async fn consume(&self, code: &str, tenant_id: Uuid) -> Result<bool, AppError>;
    }
}

pub fn sample_tenant() -> Tenant {
    Tenant {
        tenant_id: Uuid::new_v4(),
        name: "acme".to_string(),
        description: None,
        is_active: true,
        api_key: "api-key".to_string(),
        tenant_secret: "tenant-secret".to_string(),
        signing_secret: "signing-secret".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

pub fn sample_user(role: Role, password_hash: &str) -> User {
    User {
        user_id: Uuid::new_v4(),
        canonical_email: "alice@example.com".to_string(),
        username: "alice".to_string(),
        password_hash: password_hash.to_string(),
        role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

pub fn sample_membership(tenant_id: Uuid, user_id: Uuid, role: Role) -> Membership {
    Membership { tenant_id, user_id, role, created_at: Utc::now(), updated_at: Utc::now(), deleted_at: None }
}
