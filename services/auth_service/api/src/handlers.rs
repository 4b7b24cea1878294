//! The public auth surface (§6): register, login, refresh, verify,
//! change-password, logout, SSO logout. Each handler's only job is
//! tenant/credential extraction and response shaping — every decision lives
//! in [`AuthService`].

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared_config::Config;
use shared_error::{AppError, Envelope};
use utoipa::ToSchema;

use auth_service_core::domain::model::Tenant;
use auth_service_core::domain::repository::TenantRepository;
use auth_service_core::domain::service::AuthService;
use auth_service_core::dto::auth_dto::{ChangePasswordReq, LoginReq, RegisterReq};

use crate::cookie_helper::{clear_refresh_cookie, set_refresh_cookie};
use crate::extractors::{api_key, bearer_token, refresh_cookie};

/// Shared state threaded through every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub config: Config,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResp {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<Utc>,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, body = HealthResp)))]
pub async fn health_check() -> Json<HealthResp> {
    Json(HealthResp { status: "ok".to_string(), version: env!("CARGO_PKG_VERSION").to_string(), timestamp: Utc::now() })
}

/// Resolves the tenant bound to `X-API-Key` (§4.3, standard access).
async fn resolve_tenant_by_api_key(state: &AppState, headers: &HeaderMap) -> Result<Tenant, AppError> {
    let key = api_key(headers).ok_or(AppError::MissingAuth)?;
    state.tenant_repo.find_by_api_key(&key).await?.ok_or(AppError::MissingAuth)
}

#[utoipa::path(
    post, path = "/auth/register", tag = "auth",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Registered"),
        (status = 400, description = "Missing fields / bad role"),
        (status = 401, description = "Missing api key"),
        (status = 403, description = "Invitation invalid or redirect forbidden"),
        (status = 409, description = "Conflict"),
        (status = 422, description = "Validation failed"),
    ),
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterReq>,
) -> Result<Response, AppError> {
    let tenant = resolve_tenant_by_api_key(&state, &headers).await?;
    let (resp, refresh_token) = state.auth_service.register(&tenant, req).await?;

    let mut response_headers = HeaderMap::new();
    set_refresh_cookie(&mut response_headers, &refresh_token, state.config.refresh_token_ttl_secs);

    let body = Json(Envelope::ok("Registered successfully", resp));
    Ok((StatusCode::CREATED, response_headers, body).into_response())
}

#[utoipa::path(
    post, path = "/auth/login", tag = "auth",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found (role probe)"),
        (status = 422, description = "Validation failed"),
        (status = 429, description = "Too many attempts"),
    ),
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginReq>,
) -> Result<Response, AppError> {
    let tenant = resolve_tenant_by_api_key(&state, &headers).await?;
    let (resp, refresh_token) = state.auth_service.login(&tenant, req).await?;

    let mut response_headers = HeaderMap::new();
    set_refresh_cookie(&mut response_headers, &refresh_token, state.config.refresh_token_ttl_secs);

    let body = Json(Envelope::ok("Login successful", resp));
    Ok((StatusCode::OK, response_headers, body).into_response())
}

#[utoipa::path(
    post, path = "/auth/refresh", tag = "auth",
    responses((status = 200, description = "Rotated"), (status = 401, description = "Unauthorized")),
)]
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let tenant = resolve_tenant_by_api_key(&state, &headers).await?;
    let refresh_token = refresh_cookie(&headers).ok_or(AppError::MissingAuth)?;

    let (resp, new_refresh_token) = state.auth_service.refresh(&tenant, &refresh_token).await?;

    let mut response_headers = HeaderMap::new();
    set_refresh_cookie(&mut response_headers, &new_refresh_token, state.config.refresh_token_ttl_secs);

    let body = Json(Envelope::ok("Token refreshed", resp));
    Ok((StatusCode::OK, response_headers, body).into_response())
}

#[utoipa::path(
    get, path = "/auth/verify", tag = "auth",
    responses((status = 200, description = "Valid"), (status = 401, description = "Unauthorized")),
    security(("bearer_auth" = [])),
)]
pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let tenant = resolve_tenant_by_api_key(&state, &headers).await?;
    let access_token = bearer_token(&headers).ok_or(AppError::MissingAuth)?;

    let resp = state.auth_service.verify(&tenant, &access_token).await?;
    Ok(Json(Envelope::ok("Token is valid", resp)).into_response())
}

#[utoipa::path(
    put, path = "/auth/reset", tag = "auth",
    request_body = ChangePasswordReq,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordReq>,
) -> Result<Response, AppError> {
    let tenant = resolve_tenant_by_api_key(&state, &headers).await?;
    let access_token = bearer_token(&headers).ok_or(AppError::MissingAuth)?;

    state.auth_service.change_password(&tenant, &access_token, req).await?;
    Ok(Json(Envelope::ok_empty("Password changed successfully")).into_response())
}

#[utoipa::path(
    delete, path = "/auth/logout", tag = "auth",
    responses((status = 200, description = "Logged out")),
    security(("bearer_auth" = [])),
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let tenant = resolve_tenant_by_api_key(&state, &headers).await?;
    let access_token = bearer_token(&headers).ok_or(AppError::MissingAuth)?;
    let refresh_token = refresh_cookie(&headers);

    // Idempotent (§4.9.6): a second logout with a stale/missing bearer token
    // still returns 200 rather than surfacing 401 or 5xx.
    let _ = state.auth_service.logout(&tenant, &access_token, refresh_token.as_deref()).await;

    let mut response_headers = HeaderMap::new();
    clear_refresh_cookie(&mut response_headers);

    let body = Json(Envelope::ok_empty("Logged out successfully"));
    Ok((StatusCode::OK, response_headers, body).into_response())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SsoLogoutQuery {
    pub redirect_uri: String,
}

#[utoipa::path(
    get, path = "/auth/sso/logout", tag = "auth",
    params(("redirect_uri" = String, Query, description = "SSO redirect target")),
    responses((status = 302, description = "Redirect"), (status = 403, description = "Redirect not allowed")),
)]
pub async fn sso_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::extract::Query(query): axum::extract::Query<SsoLogoutQuery>,
) -> Result<Response, AppError> {
    let tenant = resolve_tenant_by_api_key(&state, &headers).await?;
    let refresh_token = refresh_cookie(&headers);

    let redirect_uri = state.auth_service.sso_logout(&tenant, refresh_token.as_deref(), &query.redirect_uri).await?;

    let mut response_headers = HeaderMap::new();
    clear_refresh_cookie(&mut response_headers);

    Ok((response_headers, Redirect::to(&redirect_uri)).into_response())
}
