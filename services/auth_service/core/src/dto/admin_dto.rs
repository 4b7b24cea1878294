use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `POST /auth/internal/invitations` response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvitationResp {
    #[schema(example = "3F7K9QRT")]
    pub code: String,
    pub expires_in_hours: i64,
}
