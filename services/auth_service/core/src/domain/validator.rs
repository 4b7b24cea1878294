//! Stateless input validation (C5). Every rule here is the source of the
//! `details[]` reported on a 422 `ValidationSyntactic` response; nothing here
//! touches the identity store.

use std::sync::LazyLock;

use regex::Regex;
use shared_error::FieldError;

const RESERVED_USERNAMES: &[&str] = &["admin", "root", "system", "superuser", "administrator"];

static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

/// Parses, canonicalizes, and length-checks an email. Returns the lowercase
/// canonical form on success.
pub fn validate_email(raw: &str) -> Result<String, FieldError> {
    if raw.is_empty() || raw.len() > 254 {
        return Err(FieldError::new("email", "must be between 1 and 254 characters"));
    }
    // A syntactic check, not full RFC 5322: one '@', non-empty local and
    // domain parts, domain contains a dot.
    let Some((local, domain)) = raw.split_once('@') else {
        return Err(FieldError::new("email", "must be a valid email address"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(FieldError::new("email", "must be a valid email address"));
    }
    Ok(raw.to_lowercase())
}

/// 3-32 chars, alphanumeric plus `_`/`-`, not a reserved name.
pub fn validate_username(username: &str) -> Result<(), FieldError> {
    if username.len() < 3 || username.len() > 32 {
        return Err(FieldError::new("username", "must be between 3 and 32 characters"));
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(FieldError::new(
            "username",
            "must contain only letters, digits, '_' and '-'",
        ));
    }
    if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
        return Err(FieldError::new("username", "is reserved"));
    }
    Ok(())
}

/// 8-128 chars with at least 3 of {upper, lower, digit, symbol} classes
/// present. This replaces a strength-estimator in favor of an explicit,
/// auditable character-class floor.
pub fn validate_password(password: &str) -> Result<(), FieldError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(FieldError::new("password", "must be between 8 and 128 characters"));
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());

    let classes = [has_upper, has_lower, has_digit, has_symbol].iter().filter(|b| **b).count();
    if classes < 3 {
        return Err(FieldError::new(
            "password",
            "must contain at least 3 of: uppercase, lowercase, digit, symbol",
        ));
    }
    Ok(())
}

/// Change-password additionally requires the new password to differ from the
/// current one.
pub fn validate_new_password_differs(new_password: &str, old_password: &str) -> Result<(), FieldError> {
    if new_password == old_password {
        return Err(FieldError::new("new_password", "must differ from the current password"));
    }
    Ok(())
}

/// `state` is opaque and MUST round-trip unchanged; this only bounds length
/// and charset, never parses or re-encodes it.
pub fn validate_sso_state(state: &str) -> Result<(), FieldError> {
    if state.len() > 128 || !state.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(FieldError::new("state", "must be alphanumeric and at most 128 characters"));
    }
    Ok(())
}

/// `nonce` is opaque; length-checked only.
pub fn validate_sso_nonce(nonce: &str) -> Result<(), FieldError> {
    if nonce.len() > 128 {
        return Err(FieldError::new("nonce", "must be at most 128 characters"));
    }
    Ok(())
}

/// Syntactic `redirect_uri` check (§4.5): no control characters, and none of
/// `<` `>` `"` `'` — a precaution against a URL that parses fine and carries
/// an allow-listed origin but smuggles markup in its path or query. Origin
/// allow-listing itself is `SsoPolicy::is_allowed`'s job, run after this.
pub fn validate_redirect_uri(redirect_uri: &str) -> Result<(), FieldError> {
    if redirect_uri.chars().any(|c| c.is_control() || matches!(c, '<' | '>' | '"' | '\'')) {
        return Err(FieldError::new(
            "redirect_uri",
            "must not contain control characters or '<', '>', '\"', '\\''",
        ));
    }
    Ok(())
}

/// 8 chars, alphanumeric — matches the alphabet `invitation::generate_code` emits.
pub fn validate_invitation_code_format(code: &str) -> Result<(), FieldError> {
    if code.len() != 8 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(FieldError::new("invitation_code", "must be an 8-character alphanumeric code"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_lowercased() {
        assert_eq!(validate_email("Alice@Example.COM").unwrap(), "alice@example.com");
    }

    #[test]
    fn email_without_at_is_rejected() {
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn username_rejects_reserved_names() {
        assert!(validate_username("admin").is_err());
        assert!(validate_username("Administrator").is_err());
    }

    #[test]
    fn username_rejects_bad_chars() {
        assert!(validate_username("ali ce").is_err());
    }

    #[test]
    fn password_requires_three_classes() {
        assert!(validate_password("alllowercase").is_err());
        assert!(validate_password("StrongPass1!").is_ok());
    }

    #[test]
    fn password_enforces_length_bounds() {
        assert!(validate_password("Ab1!").is_err());
        assert!(validate_password(&"Ab1!".repeat(40)).is_err());
    }

    #[test]
    fn sso_state_rejects_non_alphanumeric() {
        assert!(validate_sso_state("abc-123").is_err());
        assert!(validate_sso_state("abc123").is_ok());
    }

    #[test]
    fn redirect_uri_rejects_embedded_markup() {
        assert!(validate_redirect_uri(r#"https://app.example.com/"><script>"#).is_err());
        assert!(validate_redirect_uri("https://app.example.com/cb?x='1'").is_err());
    }

    #[test]
    fn redirect_uri_rejects_control_chars() {
        assert!(validate_redirect_uri("https://app.example.com/cb\r\nInjected: 1").is_err());
    }

    #[test]
    fn redirect_uri_allows_ordinary_path_and_query() {
        assert!(validate_redirect_uri("https://app.example.com/cb?x=1&y=2").is_ok());
    }
}
