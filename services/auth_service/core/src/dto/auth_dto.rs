use serde::{Deserialize, Serialize};
use shared_types::Role;
use utoipa::ToSchema;
use uuid::Uuid;

/// `POST /auth/register` request body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
    #[schema(example = "alice")]
    pub username: Option<String>,
    #[schema(example = "StrongPass1!")]
    pub password: Option<String>,
    /// `"user"` or `"admin"`.
    #[schema(example = "user")]
    pub role: Option<String>,
    /// Required and consumed atomically with user creation when `role = admin`.
    pub invitation_code: Option<String>,
    /// Present only for registrations that continue into an SSO redirect.
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub nonce: Option<String>,
}

/// `POST /auth/login` request body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    /// Either the canonical email or the username; whichever is set is tried.
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// If present, must match the caller's stored membership role or the
    /// role-probe mitigation (§4.9.2) fires.
    pub role: Option<String>,
}

/// Body returned by register/login; the refresh token itself never appears
/// here — it only ever travels as the `refresh_token` cookie.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResp {
    pub user_id: Uuid,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub role: Role,
}

/// `GET /auth/verify` success payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResp {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
}

/// `PUT /auth/reset` request body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordReq {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_new_password: Option<String>,
}
