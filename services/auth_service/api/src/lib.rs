pub mod admin_handlers;
pub mod cookie_helper;
pub mod extractors;
pub mod handlers;
pub mod openapi;

pub use admin_handlers::AdminAppState;
pub use handlers::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;
use shared_config::Config;
use shared_password::HashParams;
use sqlx::PgPool;
use shared_rate_limit::InMemoryRateLimiter;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth_service_core::domain::sso_policy::SsoPolicy;
use auth_service_infra::{
    AuthServiceImpl, InvitationServiceImpl, PgInvitationRepository, PgRefreshFamilyRepository,
    PgTenantRepository, PgUserRepository, TenantServiceImpl,
};

/// Builds the full router from a live database pool and loaded configuration
/// — the entry point both `main.rs` and integration tests use.
pub async fn get_app(db_pool: PgPool, config: &Config) -> Router {
    let tenant_repo = Arc::new(PgTenantRepository::new(db_pool.clone()));
    let user_repo = Arc::new(PgUserRepository::new(db_pool.clone()));
    let refresh_repo = Arc::new(PgRefreshFamilyRepository::new(db_pool.clone()));
    let invitation_repo = Arc::new(PgInvitationRepository::new(db_pool.clone()));

    let sso_policy = SsoPolicy::new(config.sso_allowed_origins());
    let hash_params = HashParams {
        memory_kib: config.password_hash_memory_kib,
        iterations: config.password_hash_iterations,
        parallelism: config.password_hash_parallelism,
    };

    let auth_service = Arc::new(AuthServiceImpl::new(
        tenant_repo.clone(),
        user_repo.clone(),
        refresh_repo.clone(),
        Arc::new(InMemoryRateLimiter::new()),
        sso_policy,
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
        config.rate_limit_max_attempts,
        Duration::from_secs(config.rate_limit_window_secs),
        hash_params,
    ));

    let invitation_service = Arc::new(InvitationServiceImpl::new(invitation_repo.clone(), config.invitation_ttl_hours));
    let tenant_service = Arc::new(TenantServiceImpl::new(tenant_repo.clone()));

    let sso_origins = config.sso_allowed_origins();

    let state = handlers::AppState { auth_service, tenant_repo: tenant_repo.clone(), config: config.clone() };
    let admin_state = admin_handlers::AdminAppState {
        invitation_service,
        tenant_service,
        tenant_repo,
        config: config.clone(),
    };

    build_router(state, admin_state).layer(cors_layer(&sso_origins))
}

/// Wires routes to handlers; split out from [`get_app`] so tests can supply
/// hand-built state without a live pool.
pub fn build_router(state: handlers::AppState, admin_state: admin_handlers::AdminAppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/auth/verify", get(handlers::verify))
        .route("/auth/reset", put(handlers::change_password))
        .route("/auth/logout", delete(handlers::logout))
        .route("/auth/sso/logout", get(handlers::sso_logout))
        .with_state(state);

    let admin_routes = Router::new()
        .route("/auth/internal/invitations", post(admin_handlers::create_invitation))
        .route("/api/tenants", post(admin_handlers::create_tenant))
        .with_state(admin_state);

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(auth_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

/// Browser clients hitting this service directly (rather than through a
/// same-origin backend-for-frontend) need CORS to read the JSON body and
/// send the `refresh_token` cookie cross-origin; scoped to the same
/// allow-list `SsoPolicy` enforces on `redirect_uri` so this never grants a
/// wider surface than the SSO policy already allows.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> =
        allowed_origins.iter().filter_map(|origin| origin.parse::<HeaderValue>().ok()).collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST, axum::http::Method::PUT, axum::http::Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION, "X-API-Key".parse().unwrap(), "X-Tenant-Secret-Key".parse().unwrap()])
}
