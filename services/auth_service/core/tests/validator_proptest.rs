//! Property tests for the stateless field validators (C5).

use auth_service_core::domain::sso_policy::SsoPolicy;
use auth_service_core::domain::validator::{validate_email, validate_password, validate_username};
use proptest::prelude::*;

proptest! {
    /// Any string accepted by `validate_email` must contain exactly one '@'
    /// and lowercase to itself (idempotent canonicalization).
    #[test]
    fn accepted_emails_are_canonical_and_idempotent(local in "[a-zA-Z0-9]{1,20}", domain in "[a-z]{1,10}\\.[a-z]{2,5}") {
        let raw = format!("{local}@{domain}");
        if let Ok(canonical) = validate_email(&raw) {
            prop_assert_eq!(canonical.matches('@').count(), 1);
            prop_assert_eq!(validate_email(&canonical).unwrap(), canonical);
        }
    }

    /// Strings with no '@' at all are never accepted.
    #[test]
    fn emails_without_at_sign_are_rejected(s in "[a-zA-Z0-9]{0,40}") {
        prop_assert!(validate_email(&s).is_err());
    }

    /// Any username that passes validation satisfies the length and charset
    /// rules on re-inspection.
    #[test]
    fn accepted_usernames_satisfy_own_rules(username in "[a-zA-Z0-9_-]{3,32}") {
        if validate_username(&username).is_ok() {
            prop_assert!(username.len() >= 3 && username.len() <= 32);
            prop_assert!(username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        }
    }

    /// Usernames shorter than 3 or longer than 32 chars are always rejected,
    /// regardless of charset.
    #[test]
    fn out_of_range_usernames_are_rejected(username in "[a-zA-Z0-9_-]{0,2}|[a-zA-Z0-9_-]{33,50}") {
        prop_assert!(validate_username(&username).is_err());
    }

    /// Any password accepted by `validate_password` draws from at least 3 of
    /// the 4 character classes, by construction of the validator itself —
    /// this pins that invariant against regressions in the class-counting logic.
    #[test]
    fn accepted_passwords_have_three_classes(
        upper in "[A-Z]{0,5}", lower in "[a-z]{0,5}", digit in "[0-9]{0,5}", symbol in "[!@#$%]{0,5}"
    ) {
        let password = format!("{upper}{lower}{digit}{symbol}");
        if validate_password(&password).is_ok() {
            let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
            let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
            let has_digit = password.chars().any(|c| c.is_ascii_digit());
            let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());
            let classes = [has_upper, has_lower, has_digit, has_symbol].iter().filter(|b| **b).count();
            prop_assert!(classes >= 3);
        }
    }

    /// Passwords under 8 chars are always rejected no matter how diverse
    /// their character classes are.
    #[test]
    fn short_passwords_are_always_rejected(password in "[A-Za-z0-9!@#$%]{0,7}") {
        prop_assert!(validate_password(&password).is_err());
    }

    /// `SsoPolicy::is_allowed` only ever accepts a redirect whose origin
    /// exactly equals one of the configured entries — a host-prefix or
    /// path-suffix match never passes.
    #[test]
    fn sso_policy_rejects_non_exact_origins(suffix in "[a-z0-9]{1,10}") {
        let policy = SsoPolicy::new(vec!["https://app.example.com".to_string()]);
        let spoofed = format!("https://app.example.com.{suffix}/cb");
        prop_assert!(!policy.is_allowed(&spoofed));
    }
}
