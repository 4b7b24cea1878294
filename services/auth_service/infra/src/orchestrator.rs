//! The authentication state machine (C9), wired against the repository
//! traits (C4), the shared token codec (C2), password hasher (C1), rate
//! limiter (C6), invitation generator (C7), and SSO policy (C8).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use auth_service_core::domain::invitation::generate_code;
use auth_service_core::domain::model::{CreationOutcome, Tenant};
use auth_service_core::domain::repository::{
    InvitationRepository, RefreshFamilyRepository, TenantRepository, UserRepository,
};
use auth_service_core::domain::service::{AuthService, InvitationService, TenantService};
use auth_service_core::domain::sso_policy::SsoPolicy;
use auth_service_core::domain::validator;
use auth_service_core::dto::admin_dto::InvitationResp;
use auth_service_core::dto::auth_dto::{AuthResp, ChangePasswordReq, LoginReq, RegisterReq, VerifyResp};
use auth_service_core::dto::tenant_dto::TenantResp;
use chrono::Utc;
use shared_error::{AppError, FieldError};
use shared_jwt::{decode_jwt, encode_jwt, Claims, TokenError, TokenKind};
use shared_password::HashParams;
use shared_rate_limit::{KeyGenerator, RateLimiter};
use shared_types::Role;
use uuid::Uuid;

pub struct AuthServiceImpl<TR, UR, RFR> {
    tenant_repo: Arc<TR>,
    user_repo: Arc<UR>,
    refresh_repo: Arc<RFR>,
    rate_limiter: Arc<dyn RateLimiter>,
    sso_policy: SsoPolicy,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    rate_limit_max_attempts: u32,
    rate_limit_window: StdDuration,
    hash_params: HashParams,
}

impl<TR, UR, RFR> AuthServiceImpl<TR, UR, RFR>
where
    TR: TenantRepository,
    UR: UserRepository,
    RFR: RefreshFamilyRepository,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_repo: Arc<TR>,
        user_repo: Arc<UR>,
        refresh_repo: Arc<RFR>,
        rate_limiter: Arc<dyn RateLimiter>,
        sso_policy: SsoPolicy,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
        rate_limit_max_attempts: u32,
        rate_limit_window: StdDuration,
        hash_params: HashParams,
    ) -> Self {
        Self {
            tenant_repo,
            user_repo,
            refresh_repo,
            rate_limiter,
            sso_policy,
            access_ttl_secs,
            refresh_ttl_secs,
            rate_limit_max_attempts,
            rate_limit_window,
            hash_params,
        }
    }

    /// Issues a fresh access token + a brand-new refresh family, returning
    /// the body and the raw refresh token to set as a cookie.
    async fn mint_tokens(
        &self,
        tenant: &Tenant,
        user_id: Uuid,
        role: Role,
    ) -> Result<(AuthResp, String), AppError> {
        let access_claims = Claims::new_access(user_id, tenant.tenant_id, role, self.access_ttl_secs);
        let access_token = encode_jwt(&access_claims, &tenant.signing_secret)
            .map_err(|_| AppError::Internal("failed to sign access token".to_string()))?;

        let jti = Uuid::new_v4();
        let expires_at = Utc::now() + chrono::Duration::seconds(self.refresh_ttl_secs);
        let family = self.refresh_repo.create(jti, user_id, tenant.tenant_id, expires_at).await?;

        let refresh_claims =
            Claims::new_refresh(user_id, tenant.tenant_id, role, self.refresh_ttl_secs, family.family_id, jti);
        let refresh_token = encode_jwt(&refresh_claims, &tenant.signing_secret)
            .map_err(|_| AppError::Internal("failed to sign refresh token".to_string()))?;

        let resp = AuthResp {
            user_id,
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl_secs,
            role,
        };
        Ok((resp, refresh_token))
    }

    /// Every `TokenError` on an access token coalesces to `Unauthorized`
    /// (§7) — unlike refresh tokens, there is no distinct expired-token case.
    fn decode_access(&self, tenant: &Tenant, access_token: &str) -> Result<Claims, AppError> {
        decode_jwt(access_token, &tenant.signing_secret, TokenKind::Access).map_err(|_| AppError::MissingAuth)
    }

    async fn validate_sso_fields(&self, req_redirect_uri: &Option<String>, req_state: &Option<String>, req_nonce: &Option<String>) -> Result<(), AppError> {
        let mut details = Vec::new();
        if let Some(redirect_uri) = req_redirect_uri {
            if let Err(e) = validator::validate_redirect_uri(redirect_uri) {
                details.push(e);
            }
        }
        if let Some(state) = req_state {
            if let Err(e) = validator::validate_sso_state(state) {
                details.push(e);
            }
        }
        if let Some(nonce) = req_nonce {
            if let Err(e) = validator::validate_sso_nonce(nonce) {
                details.push(e);
            }
        }
        if !details.is_empty() {
            return Err(AppError::ValidationSyntactic(details));
        }
        if let Some(redirect_uri) = req_redirect_uri {
            if !self.sso_policy.is_allowed(redirect_uri) {
                return Err(AppError::RoleForbidden("Redirect URI not in allowed origins".to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<TR, UR, RFR> AuthService for AuthServiceImpl<TR, UR, RFR>
where
    TR: TenantRepository,
    UR: UserRepository,
    RFR: RefreshFamilyRepository,
{
    async fn register(&self, tenant: &Tenant, req: RegisterReq) -> Result<(AuthResp, String), AppError> {
        let (Some(email), Some(username), Some(password), Some(role_str)) =
            (req.email.as_deref(), req.username.as_deref(), req.password.as_deref(), req.role.as_deref())
        else {
            return Err(AppError::ValidationSemantic("Missing required fields".to_string()));
        };

        let role: Role = role_str
            .parse()
            .map_err(|_| AppError::ValidationSemantic("Bad Request".to_string()))?;

        self.validate_sso_fields(&req.redirect_uri, &req.state, &req.nonce).await?;

        let mut details = Vec::new();
        let canonical_email = match validator::validate_email(email) {
            Ok(e) => Some(e),
            Err(err) => {
                details.push(err);
                None
            },
        };
        if let Err(err) = validator::validate_username(username) {
            details.push(err);
        }
        if let Err(err) = validator::validate_password(password) {
            details.push(err);
        }
        if role == Role::Admin {
            if let Some(code) = req.invitation_code.as_deref().filter(|c| !c.is_empty()) {
                if let Err(err) = validator::validate_invitation_code_format(code) {
                    details.push(err);
                }
            }
        }
        if !details.is_empty() {
            return Err(AppError::ValidationSyntactic(details));
        }
        let canonical_email = canonical_email.expect("validated above");

        if role == Role::Admin {
            let invitation_code = req
                .invitation_code
                .as_deref()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| AppError::RoleForbidden("Invalid or missing invitation code".to_string()))?;

            if self.user_repo.find_by_email_anywhere(&canonical_email).await?.is_some() {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }

            let password_hash = shared_password::hash(password, self.hash_params)
                .map_err(|_| AppError::Internal("password hashing failed".to_string()))?;

            let user = self
                .user_repo
                .create_admin_with_invitation(
                    tenant.tenant_id,
                    &canonical_email,
                    username,
                    &password_hash,
                    invitation_code,
                )
                .await?;

            tracing::info!(user_id = %user.user_id, tenant_id = %tenant.tenant_id, "admin registered");
            return self.mint_tokens(tenant, user.user_id, Role::Admin).await;
        }

        let existing = self.user_repo.find_by_email_anywhere(&canonical_email).await?;

        let user_id = match existing {
            None => {
                let password_hash = shared_password::hash(password, self.hash_params)
                    .map_err(|_| AppError::Internal("password hashing failed".to_string()))?;
                let user = self
                    .user_repo
                    .create_identity_with_membership(
                        tenant.tenant_id,
                        &canonical_email,
                        username,
                        &password_hash,
                        Role::User,
                    )
                    .await?;
                tracing::info!(user_id = %user.user_id, tenant_id = %tenant.tenant_id, "user registered");
                user.user_id
            },
            Some(existing_user) if existing_user.role == Role::User => {
                if !shared_password::verify(password, &existing_user.password_hash)
                    .map_err(|_| AppError::Internal("password verification failed".to_string()))?
                {
                    // Per §B: mismatch reads as a generic conflict, not an
                    // oracle distinguishing "wrong password" from "taken".
                    return Err(AppError::Conflict("Email already exists".to_string()));
                }

                if self
                    .user_repo
                    .find_in_tenant_by_email(tenant.tenant_id, &canonical_email)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict("Email already exists".to_string()));
                }
                if self
                    .user_repo
                    .find_in_tenant_by_username(tenant.tenant_id, &existing_user.username)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict("Username already exists".to_string()));
                }

                self.user_repo.attach_membership(tenant.tenant_id, existing_user.user_id, Role::User).await?;
                tracing::info!(user_id = %existing_user.user_id, tenant_id = %tenant.tenant_id, "user attached to additional tenant");
                existing_user.user_id
            },
            Some(_) => {
                return Err(AppError::Conflict(
                    "Cannot register as user - account exists with admin/non-user role".to_string(),
                ));
            },
        };

        self.mint_tokens(tenant, user_id, Role::User).await
    }

    async fn login(&self, tenant: &Tenant, req: LoginReq) -> Result<(AuthResp, String), AppError> {
        if !tenant.is_live() {
            return Err(AppError::TenantOrUserInactive);
        }

        let identifier = req
            .email
            .as_deref()
            .or(req.username.as_deref())
            .ok_or_else(|| AppError::ValidationSemantic("Missing required fields".to_string()))?;

        let rate_key = KeyGenerator::tenant_identifier_key("rl:login", &tenant.tenant_id.to_string(), identifier);
        let check = self
            .rate_limiter
            .check_rate_limit(&rate_key, self.rate_limit_max_attempts, self.rate_limit_window)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        if !check.allowed {
            return Err(AppError::RateLimited);
        }

        let found = if let Some(email) = req.email.as_deref() {
            let canonical = email.to_lowercase();
            self.user_repo.find_in_tenant_by_email(tenant.tenant_id, &canonical).await?
        } else {
            self.user_repo.find_in_tenant_by_username(tenant.tenant_id, identifier).await?
        };

        let Some((user, membership)) = found else {
            return Err(AppError::InvalidCredentials("username or email or password invalid".to_string()));
        };

        if !user.is_live() {
            return Err(AppError::MissingAuth);
        }

        if let Some(requested_role) = req.role.as_deref() {
            let requested: Role = requested_role
                .parse()
                .map_err(|_| AppError::ValidationSemantic("Bad Request".to_string()))?;
            if requested != membership.role {
                // Role-probe mitigation (§4.9.2 / §B): do not reveal the
                // account exists under a different role.
                return Err(AppError::NotFound("User not found".to_string()));
            }
        }

        let password = req
            .password
            .as_deref()
            .ok_or_else(|| AppError::ValidationSemantic("Missing required fields".to_string()))?;

        let verified = shared_password::verify(password, &user.password_hash)
            .map_err(|_| AppError::Internal("password verification failed".to_string()))?;

        if !verified {
            // `check_rate_limit` above already recorded this attempt against
            // the window; a failed verify needs no second increment.
            return Err(AppError::InvalidCredentials("username or email or password invalid".to_string()));
        }

        self.rate_limiter.reset(&rate_key).await.map_err(|e| AppError::Internal(e.to_string()))?;

        tracing::info!(user_id = %user.user_id, tenant_id = %tenant.tenant_id, "user logged in");
        self.mint_tokens(tenant, user.user_id, membership.role).await
    }

    async fn refresh(&self, tenant: &Tenant, refresh_token: &str) -> Result<(AuthResp, String), AppError> {
        let claims = decode_jwt(refresh_token, &tenant.signing_secret, TokenKind::Refresh).map_err(|e| match e {
            TokenError::Expired => AppError::TokenExpired,
            _ => AppError::MissingAuth,
        })?;

        let family_id = claims.family_id.ok_or(AppError::MissingAuth)?;
        let family = self.refresh_repo.find_by_id(family_id).await?.ok_or(AppError::MissingAuth)?;

        if !family.is_live() || family.bound_tenant_id != tenant.tenant_id {
            return Err(AppError::MissingAuth);
        }

        let user = self.user_repo.find_by_id(family.bound_user_id).await?;
        let Some(user) = user else {
            self.refresh_repo.revoke(family_id).await?;
            return Err(AppError::MissingAuth);
        };
        if !user.is_live() {
            self.refresh_repo.revoke(family_id).await?;
            return Err(AppError::MissingAuth);
        }

        let new_jti = Uuid::new_v4();
        let new_expires_at = Utc::now() + chrono::Duration::seconds(self.refresh_ttl_secs);

        let rotated = self
            .refresh_repo
            .rotate(family_id, claims.jti, new_jti, new_expires_at)
            .await?;

        let Some(_rotated) = rotated else {
            tracing::warn!(family_id = %family_id, "refresh token reuse detected, family revoked");
            return Err(AppError::MissingAuth);
        };

        let access_claims =
            Claims::new_access(user.user_id, tenant.tenant_id, claims.role, self.access_ttl_secs);
        let access_token = encode_jwt(&access_claims, &tenant.signing_secret)
            .map_err(|_| AppError::Internal("failed to sign access token".to_string()))?;

        let refresh_claims =
            Claims::new_refresh(user.user_id, tenant.tenant_id, claims.role, self.refresh_ttl_secs, family_id, new_jti);
        let new_refresh_token = encode_jwt(&refresh_claims, &tenant.signing_secret)
            .map_err(|_| AppError::Internal("failed to sign refresh token".to_string()))?;

        let resp = AuthResp {
            user_id: user.user_id,
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl_secs,
            role: claims.role,
        };
        Ok((resp, new_refresh_token))
    }

    async fn verify(&self, tenant: &Tenant, access_token: &str) -> Result<VerifyResp, AppError> {
        let claims = self.decode_access(tenant, access_token)?;

        let user = self.user_repo.find_by_id(claims.sub).await?;
        match user {
            Some(user) if user.is_live() => {
                Ok(VerifyResp { user_id: user.user_id, tenant_id: tenant.tenant_id, role: claims.role })
            },
            _ => Err(AppError::MissingAuth),
        }
    }

    async fn change_password(
        &self,
        tenant: &Tenant,
        access_token: &str,
        req: ChangePasswordReq,
    ) -> Result<(), AppError> {
        let claims = self.decode_access(tenant, access_token)?;

        let (Some(old_password), Some(new_password), Some(confirm)) =
            (req.old_password.as_deref(), req.new_password.as_deref(), req.confirm_new_password.as_deref())
        else {
            return Err(AppError::ValidationSemantic("Missing required fields".to_string()));
        };

        if new_password != confirm {
            return Err(AppError::ValidationSyntactic(vec![FieldError::new(
                "confirm_new_password",
                "must match new_password",
            )]));
        }

        let mut details = Vec::new();
        if let Err(err) = validator::validate_password(new_password) {
            details.push(err);
        }
        if let Err(err) = validator::validate_new_password_differs(new_password, old_password) {
            details.push(err);
        }
        if !details.is_empty() {
            return Err(AppError::ValidationSyntactic(details));
        }

        let user = self.user_repo.find_by_id(claims.sub).await?.ok_or(AppError::MissingAuth)?;
        if !user.is_live() {
            return Err(AppError::MissingAuth);
        }

        let verified = shared_password::verify(old_password, &user.password_hash)
            .map_err(|_| AppError::Internal("password verification failed".to_string()))?;
        if !verified {
            return Err(AppError::InvalidCredentials("Invalid credentials".to_string()));
        }

        let new_hash = shared_password::hash(new_password, self.hash_params)
            .map_err(|_| AppError::Internal("password hashing failed".to_string()))?;

        self.user_repo.update_password_hash(user.user_id, &new_hash).await?;
        self.refresh_repo.revoke_all_for_user(user.user_id).await?;

        tracing::info!(user_id = %user.user_id, "password changed, all refresh families revoked");
        Ok(())
    }

    async fn logout(
        &self,
        tenant: &Tenant,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), AppError> {
        let claims = self.decode_access(tenant, access_token)?;

        if let Some(refresh_token) = refresh_token {
            if let Ok(refresh_claims) = decode_jwt(refresh_token, &tenant.signing_secret, TokenKind::Refresh) {
                if let Some(family_id) = refresh_claims.family_id {
                    self.refresh_repo.revoke(family_id).await?;
                    return Ok(());
                }
            }
        }

        self.refresh_repo.revoke_all_for_user(claims.sub).await?;
        Ok(())
    }

    async fn sso_logout(
        &self,
        tenant: &Tenant,
        refresh_token: Option<&str>,
        redirect_uri: &str,
    ) -> Result<String, AppError> {
        // §6 documents only 302/403 for this endpoint, so a syntactically
        // bad redirect_uri is folded into the same forbidden response as an
        // origin that isn't allow-listed, rather than a 422.
        if validator::validate_redirect_uri(redirect_uri).is_err() || !self.sso_policy.is_allowed(redirect_uri) {
            return Err(AppError::RoleForbidden("Redirect URI not in allowed origins".to_string()));
        }

        // Revocation is best-effort (§B "Idempotent SSO logout"): an absent
        // or already-stale cookie still redirects successfully.
        if let Some(refresh_token) = refresh_token {
            if let Ok(claims) = decode_jwt(refresh_token, &tenant.signing_secret, TokenKind::Refresh) {
                if let Some(family_id) = claims.family_id {
                    let _ = self.refresh_repo.revoke(family_id).await;
                }
            }
        }

        Ok(redirect_uri.to_string())
    }
}

pub struct InvitationServiceImpl<IR> {
    invitation_repo: Arc<IR>,
    ttl_hours: i64,
}

impl<IR: InvitationRepository> InvitationServiceImpl<IR> {
    pub fn new(invitation_repo: Arc<IR>, ttl_hours: i64) -> Self {
        Self { invitation_repo, ttl_hours }
    }
}

#[async_trait]
impl<IR: InvitationRepository> InvitationService for InvitationServiceImpl<IR> {
    async fn issue(&self, tenant_id: Uuid) -> Result<InvitationResp, AppError> {
        let code = generate_code();
        let invitation = self.invitation_repo.issue(tenant_id, &code, self.ttl_hours).await?;
        Ok(InvitationResp { code: invitation.code, expires_in_hours: self.ttl_hours })
    }
}

pub struct TenantServiceImpl<TR> {
    tenant_repo: Arc<TR>,
}

impl<TR: TenantRepository> TenantServiceImpl<TR> {
    pub fn new(tenant_repo: Arc<TR>) -> Self {
        Self { tenant_repo }
    }
}

#[async_trait]
impl<TR: TenantRepository> TenantService for TenantServiceImpl<TR> {
    async fn create_or_get(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<(TenantResp, CreationOutcome), AppError> {
        if name.is_empty() {
            return Err(AppError::ValidationSyntactic(vec![FieldError::new(
                "name",
                "must not be empty",
            )]));
        }

        let (tenant, outcome) = self.tenant_repo.find_or_create_by_name(name, description).await?;

        let resp = TenantResp {
            tenant_id: tenant.tenant_id,
            name: tenant.name,
            api_key: tenant.api_key,
            tenant_secret: match outcome {
                CreationOutcome::Created => Some(tenant.tenant_secret),
                CreationOutcome::Existing => None,
            },
        };
        Ok((resp, outcome))
    }
}
