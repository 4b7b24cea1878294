//! Request-boundary extraction: resolving the tenant binding headers (§6) and
//! the `Authorization: Bearer` / `refresh_token` cookie before a handler body
//! ever runs.

use axum::http::{header, HeaderMap};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const TENANT_SECRET_HEADER: &str = "x-tenant-secret-key";
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// `X-API-Key` header value, for standard (non-admin) endpoints.
pub fn api_key(headers: &HeaderMap) -> Option<String> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// `X-Tenant-Secret-Key` header value, for elevated tenant-admin endpoints.
pub fn tenant_secret_key(headers: &HeaderMap) -> Option<String> {
    headers.get(TENANT_SECRET_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// `Authorization: Bearer <token>` — returns the token itself, not the scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Reads a single named cookie out of the `Cookie` request header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(header::COOKIE).and_then(|v| v.to_str().ok()).and_then(|cookies| {
        cookies.split(';').find_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next()?;
            (key == name).then(|| value.to_string())
        })
    })
}

/// The `refresh_token` cookie, if present and non-empty.
pub fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, REFRESH_COOKIE_NAME).filter(|v| !v.is_empty())
}
