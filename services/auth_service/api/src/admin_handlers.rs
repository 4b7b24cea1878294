//! Tenant-admin surface (§6): invitation issuance and tenant provisioning,
//! both gated by `X-Tenant-Secret-Key` rather than `X-API-Key`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared_config::Config;
use shared_error::{AppError, Envelope};

use auth_service_core::domain::model::CreationOutcome;
use auth_service_core::domain::repository::TenantRepository;
use auth_service_core::domain::service::{InvitationService, TenantService};
use auth_service_core::dto::tenant_dto::TenantCreateReq;

use crate::extractors::tenant_secret_key;

#[derive(Clone)]
pub struct AdminAppState {
    pub invitation_service: Arc<dyn InvitationService>,
    pub tenant_service: Arc<dyn TenantService>,
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub config: Config,
}

/// `POST /auth/internal/invitations` — 200 with the 8-char code (§6).
///
/// Resolves the issuing tenant via its own `tenant_secret` (C3's
/// `admin_by_tenant_secret`); there is no body, the tenant is entirely
/// determined by which secret was presented.
#[utoipa::path(
    post, path = "/auth/internal/invitations", tag = "admin",
    responses((status = 200, description = "Invitation issued"), (status = 401, description = "Unauthorized")),
)]
pub async fn create_invitation(State(state): State<AdminAppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let secret = tenant_secret_key(&headers).ok_or(AppError::MissingAuth)?;
    let tenant = state.tenant_repo.find_by_tenant_secret(&secret).await?.ok_or(AppError::MissingAuth)?;

    let resp = state.invitation_service.issue(tenant.tenant_id).await?;
    Ok(Json(Envelope::ok("Invitation created", resp)).into_response())
}

/// `POST /api/tenants` — idempotent on `name` (§4.3); gated by the
/// well-known global tenant secret, since there is no tenant yet to scope a
/// per-tenant secret to.
#[utoipa::path(
    post, path = "/api/tenants", tag = "admin",
    request_body = TenantCreateReq,
    responses(
        (status = 200, description = "Existing tenant returned"),
        (status = 201, description = "Tenant created"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed"),
    ),
)]
pub async fn create_tenant(
    State(state): State<AdminAppState>,
    headers: HeaderMap,
    Json(req): Json<TenantCreateReq>,
) -> Result<Response, AppError> {
    let secret = tenant_secret_key(&headers).ok_or(AppError::MissingAuth)?;
    if secret != state.config.global_tenant_secret {
        return Err(AppError::MissingAuth);
    }

    let name = req.name.as_deref().ok_or_else(|| AppError::ValidationSemantic("Missing required fields".to_string()))?;
    let (resp, outcome) = state.tenant_service.create_or_get(name, req.description.as_deref()).await?;

    let status = match outcome {
        CreationOutcome::Created => StatusCode::CREATED,
        CreationOutcome::Existing => StatusCode::OK,
    };
    let message = match outcome {
        CreationOutcome::Created => "Tenant created",
        CreationOutcome::Existing => "Tenant already exists",
    };
    Ok((status, Json(Envelope::ok(message, resp))).into_response())
}
