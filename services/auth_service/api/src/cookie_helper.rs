//! Builds the `Set-Cookie` header for the `refresh_token` cookie (§6:
//! `HttpOnly; Secure; SameSite=Strict`).

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};

use crate::extractors::REFRESH_COOKIE_NAME;

/// Appends a `Set-Cookie` header carrying a fresh refresh token.
pub fn set_refresh_cookie(headers: &mut HeaderMap, refresh_token: &str, max_age_secs: i64) {
    let cookie = format!(
        "{REFRESH_COOKIE_NAME}={refresh_token}; Path=/; Max-Age={max_age_secs}; HttpOnly; Secure; SameSite=Strict"
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.append(SET_COOKIE, value);
    }
}

/// Appends a `Set-Cookie` header clearing the refresh token (Max-Age=0, §4.9.6).
pub fn clear_refresh_cookie(headers: &mut HeaderMap) {
    let cookie = format!("{REFRESH_COOKIE_NAME}=; Path=/; Max-Age=0; HttpOnly; Secure; SameSite=Strict");
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.append(SET_COOKIE, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_carries_expected_attributes() {
        let mut headers = HeaderMap::new();
        set_refresh_cookie(&mut headers, "rt_abc", 7202);
        let value = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(value.contains("refresh_token=rt_abc"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=Strict"));
        assert!(value.contains("Max-Age=7202"));
    }

    #[test]
    fn clear_cookie_sets_max_age_zero() {
        let mut headers = HeaderMap::new();
        clear_refresh_cookie(&mut headers);
        let value = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(value.contains("Max-Age=0"));
    }
}
