use auth_service_core::dto::admin_dto::*;
use auth_service_core::dto::auth_dto::*;
use auth_service_core::dto::tenant_dto::*;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_check,
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::refresh,
        crate::handlers::verify,
        crate::handlers::change_password,
        crate::handlers::logout,
        crate::handlers::sso_logout,
        crate::admin_handlers::create_invitation,
        crate::admin_handlers::create_tenant,
    ),
    components(schemas(
        crate::handlers::HealthResp,
        RegisterReq,
        LoginReq,
        AuthResp,
        VerifyResp,
        ChangePasswordReq,
        InvitationResp,
        TenantCreateReq,
        TenantResp,
    )),
    tags(
        (name = "auth", description = "Registration, login, token lifecycle"),
        (name = "admin", description = "Tenant provisioning and invitation issuance"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
