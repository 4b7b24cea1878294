use chrono::{DateTime, Utc};
use shared_types::Role;
use sqlx::FromRow;
use uuid::Uuid;

/// Tenant entity (domain model), mapped directly onto the `tenants` table.
#[derive(Debug, Clone, FromRow)]
pub struct Tenant {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub api_key: String,
    pub tenant_secret: String,
    /// Per-tenant JWT signing secret. Never serialized into any response.
    pub signing_secret: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Tenant {
    pub fn is_live(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }
}

/// A global user identity. For `role = user` this row is shared across every
/// tenant the person belongs to; for `role = admin` it is unique to one
/// tenant membership (see [`Membership`]).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub canonical_email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// The authoritative authorization record: a (tenant, user, role) tuple.
#[derive(Debug, Clone, FromRow)]
pub struct Membership {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A row in the refresh-token rotation chain produced by one login.
///
/// At most one `current_jti` is ever live; `previous_jti` is retained purely
/// so a reuse attempt can be logged with the stale generation it replayed.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshFamily {
    pub family_id: Uuid,
    pub current_jti: Uuid,
    pub previous_jti: Option<Uuid>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub bound_user_id: Uuid,
    pub bound_tenant_id: Uuid,
    pub revoked: bool,
}

impl RefreshFamily {
    pub fn is_live(&self) -> bool {
        !self.revoked && self.expires_at > Utc::now()
    }
}

/// A single-use, short-lived admin-provisioning code.
#[derive(Debug, Clone, FromRow)]
pub struct Invitation {
    pub code: String,
    pub tenant_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Whether a `find_or_create`-style operation created a fresh row or
/// returned one that already existed (e.g. idempotent tenant creation, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationOutcome {
    Created,
    Existing,
}
