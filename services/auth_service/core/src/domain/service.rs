use async_trait::async_trait;
use shared_error::AppError;

use super::model::Tenant;
use crate::dto::admin_dto::InvitationResp;
use crate::dto::auth_dto::{AuthResp, ChangePasswordReq, LoginReq, RegisterReq, VerifyResp};
use crate::dto::tenant_dto::TenantResp;

/// The state machine (C9): register, login, verify, refresh, logout,
/// change-password. `tenant` is always pre-resolved by the caller (C3) before
/// any of these are invoked.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Returns the response body and the refresh token to set as a cookie.
    async fn register(&self, tenant: &Tenant, req: RegisterReq) -> Result<(AuthResp, String), AppError>;

    async fn login(&self, tenant: &Tenant, req: LoginReq) -> Result<(AuthResp, String), AppError>;

    async fn refresh(&self, tenant: &Tenant, refresh_token: &str) -> Result<(AuthResp, String), AppError>;

    async fn verify(&self, tenant: &Tenant, access_token: &str) -> Result<VerifyResp, AppError>;

    async fn change_password(
        &self,
        tenant: &Tenant,
        access_token: &str,
        req: ChangePasswordReq,
    ) -> Result<(), AppError>;

    /// Revokes the family bound to `refresh_token` if present, else every
    /// family owned by the access token's subject.
    async fn logout(
        &self,
        tenant: &Tenant,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), AppError>;

    /// Returns the validated `redirect_uri` to send a 302 to. Revocation is
    /// best-effort and idempotent; an absent/stale cookie still redirects.
    async fn sso_logout(
        &self,
        tenant: &Tenant,
        refresh_token: Option<&str>,
        redirect_uri: &str,
    ) -> Result<String, AppError>;
}

/// `issue(tenant) → 8-char code` (C7). Consumption happens inside
/// [`AuthService::register`] via
/// [`super::repository::UserRepository::create_admin_with_invitation`], which
/// keeps the code's single-use guarantee in the same transaction as the
/// admin identity it provisions.
#[async_trait]
pub trait InvitationService: Send + Sync {
    async fn issue(&self, tenant_id: uuid::Uuid) -> Result<InvitationResp, AppError>;
}

/// Tenant provisioning, gated by the global or per-tenant secret (§6).
#[async_trait]
pub trait TenantService: Send + Sync {
    /// Idempotent on `name` among non-deleted tenants (§4.3).
    async fn create_or_get(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<(TenantResp, super::model::CreationOutcome), AppError>;
}
