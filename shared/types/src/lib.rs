//! Primitive types shared across the identity server's crates.

pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;

use serde::{Deserialize, Serialize};

/// The two roles a membership can hold within a tenant.
///
/// `User` identities are shared across tenants (one `user_id`, many
/// memberships); `Admin` identities are never reused across tenants — each
/// tenant's admin is provisioned through its own invitation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

/// Resolved from the inbound `X-API-Key`/`X-Tenant-Secret-Key` headers before
/// a request reaches a handler.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub tenant_name: String,
}

/// Resolved from a validated bearer access token; attached to requests that
/// require authentication.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
}
