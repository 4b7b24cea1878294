use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// `POST /api/tenants` request body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantCreateReq {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// `POST /api/tenants` response body. `tenant_secret` is only ever included
/// the first time a tenant is created — re-creating an existing active
/// tenant returns the row without it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantResp {
    pub tenant_id: Uuid,
    pub name: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_secret: Option<String>,
}
