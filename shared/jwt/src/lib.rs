use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared_types::Role;
use uuid::Uuid;

/// Whether a token is an access token or a refresh token. Encoded into the
/// claims so a stolen access token can never be replayed at `/auth/refresh`
/// and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims shared by access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID.
    pub sub: Uuid,

    /// Tenant ID the token was issued for.
    pub tenant_id: Uuid,

    /// Role held in that tenant at issuance time.
    pub role: Role,

    /// Issued-at (Unix timestamp).
    pub iat: i64,

    /// Not-before (Unix timestamp); equal to `iat` at issuance — tokens are
    /// valid from the moment they're minted, this just makes the claim
    /// present and enforced rather than silently absent.
    pub nbf: i64,

    /// Expiration (Unix timestamp).
    pub exp: i64,

    pub token_type: TokenKind,

    /// Unique per-token identifier. For refresh tokens this is also the
    /// current `jti` stored on the token family row, and is rotated on every
    /// successful refresh.
    pub jti: Uuid,

    /// Refresh-token family identifier. `None` on access tokens.
    #[serde(default)]
    pub family_id: Option<Uuid>,
}

impl Claims {
    pub fn new_access(user_id: Uuid, tenant_id: Uuid, role: Role, ttl_secs: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id,
            tenant_id,
            role,
            iat: now,
            nbf: now,
            exp: now + ttl_secs,
            token_type: TokenKind::Access,
            jti: Uuid::new_v4(),
            family_id: None,
        }
    }

    pub fn new_refresh(
        user_id: Uuid,
        tenant_id: Uuid,
        role: Role,
        ttl_secs: i64,
        family_id: Uuid,
        jti: Uuid,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id,
            tenant_id,
            role,
            iat: now,
            nbf: now,
            exp: now + ttl_secs,
            token_type: TokenKind::Refresh,
            jti,
            family_id: Some(family_id),
        }
    }
}

/// Why a token failed to decode. Left for the caller to map into
/// `shared_error::AppError`, since the same `Expired` case means different
/// things for access tokens (coalesced to `Unauthorized`) and refresh tokens
/// (`TokenExpired`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Malformed,
    BadSignature,
    Expired,
    NotYetValid,
    /// Decoded successfully but `token_type` does not match what the caller expected.
    WrongTokenKind,
}

pub fn encode_jwt(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &key).map_err(|_| TokenError::Malformed)
}

/// Decode and validate a JWT, asserting it is of the expected `TokenKind`.
pub fn decode_jwt(token: &str, secret: &str, expect: TokenKind) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_nbf = true;

    let claims = decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            jsonwebtoken::errors::ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        })?;

    if claims.token_type != expect {
        return Err(TokenError::WrongTokenKind);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_access_token() {
        let user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let secret = "test_secret";

        let claims = Claims::new_access(user_id, tenant_id, Role::Admin, 3600);
        let token = encode_jwt(&claims, secret).unwrap();

        let decoded = decode_jwt(&token, secret, TokenKind::Access).unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.tenant_id, tenant_id);
        assert_eq!(decoded.role, Role::Admin);
    }

    #[test]
    fn rejects_refresh_token_presented_as_access() {
        let claims =
            Claims::new_refresh(Uuid::new_v4(), Uuid::new_v4(), Role::User, 7202, Uuid::new_v4(), Uuid::new_v4());
        let token = encode_jwt(&claims, "secret").unwrap();

        let err = decode_jwt(&token, "secret", TokenKind::Access).unwrap_err();
        assert_eq!(err, TokenError::WrongTokenKind);
    }

    #[test]
    fn rejects_bad_signature() {
        let claims = Claims::new_access(Uuid::new_v4(), Uuid::new_v4(), Role::User, 900);
        let token = encode_jwt(&claims, "secret-a").unwrap();

        let err = decode_jwt(&token, "secret-b", TokenKind::Access).unwrap_err();
        assert_eq!(err, TokenError::BadSignature);
    }

    #[test]
    fn rejects_token_not_yet_valid() {
        let mut claims = Claims::new_access(Uuid::new_v4(), Uuid::new_v4(), Role::User, 900);
        claims.nbf += 3600;
        claims.exp += 3600;
        let token = encode_jwt(&claims, "secret").unwrap();

        let err = decode_jwt(&token, "secret", TokenKind::Access).unwrap_err();
        assert_eq!(err, TokenError::NotYetValid);
    }
}
