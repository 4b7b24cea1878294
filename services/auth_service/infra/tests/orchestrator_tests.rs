//! Exercises the auth state machine (register/login/refresh/change-password)
//! against mocked repositories — no database required.

mod mocks;

use std::sync::Arc;
use std::time::Duration;

use auth_service_core::domain::service::AuthService;
use auth_service_core::domain::sso_policy::SsoPolicy;
use auth_service_core::dto::auth_dto::{ChangePasswordReq, LoginReq, RegisterReq};
use auth_service_infra::AuthServiceImpl;
use chrono::Utc;
use mocks::{sample_membership, sample_tenant, sample_user, MockRefreshRepo, MockTenantRepo, MockUserRepo};
use shared_password::HashParams;
use shared_rate_limit::InMemoryRateLimiter;
use shared_types::Role;
use uuid::Uuid;

fn build_service(
    tenant_repo: MockTenantRepo,
    user_repo: MockUserRepo,
    refresh_repo: MockRefreshRepo,
) -> AuthServiceImpl<MockTenantRepo, MockUserRepo, MockRefreshRepo> {
    AuthServiceImpl::new(
        Arc::new(tenant_repo),
        Arc::new(user_repo),
        Arc::new(refresh_repo),
        Arc::new(InMemoryRateLimiter::new()),
        SsoPolicy::new(vec!["https://app.example.com".to_string()]),
        900,
        7202,
        5,
        Duration::from_secs(900),
        HashParams { memory_kib: 8, iterations: 1, parallelism: 1 },
    )
}

#[tokio::test]
async fn register_new_user_mints_tokens() {
    let tenant = sample_tenant();

    let mut user_repo = MockUserRepo::new();
    user_repo.expect_find_by_email_anywhere().returning(|_| Ok(None));
    user_repo
        .expect_create_identity_with_membership()
        .returning(move |_, email, username, hash, role| {
            let mut user = sample_user(role, hash);
            user.canonical_email = email.to_string();
            user.username = username.to_string();
            Ok(user)
        });

    let mut refresh_repo = MockRefreshRepo::new();
    refresh_repo.expect_create().returning(move |jti, user_id, bound_tenant_id, expires_at| {
        Ok(auth_service_core::domain::model::RefreshFamily {
            family_id: Uuid::new_v4(),
            current_jti: jti,
            previous_jti: None,
            issued_at: Utc::now(),
            expires_at,
            bound_user_id: user_id,
            bound_tenant_id,
            revoked: false,
        })
    });

    let service = build_service(MockTenantRepo::new(), user_repo, refresh_repo);

    let req = RegisterReq {
        email: Some("new@example.com".to_string()),
        username: Some("newuser".to_string()),
        password: Some("StrongPass1!".to_string()),
        role: Some("user".to_string()),
        invitation_code: None,
        redirect_uri: None,
        state: None,
        nonce: None,
    };

    let (resp, refresh_token) = service.register(&tenant, req).await.unwrap();
    assert_eq!(resp.role, Role::User);
    assert_eq!(resp.token_type, "Bearer");
    assert!(!refresh_token.is_empty());
}

#[tokio::test]
async fn login_with_mismatched_role_returns_not_found() {
    let tenant = sample_tenant();
    let hash = shared_password::hash("StrongPass1!", HashParams::default()).unwrap();
    let user = sample_user(Role::User, &hash);
    let membership = sample_membership(tenant.tenant_id, user.user_id, Role::User);

    let mut user_repo = MockUserRepo::new();
    user_repo.expect_find_in_tenant_by_email().returning(move |_, _| Ok(Some((user.clone(), membership.clone()))));

    let service = build_service(MockTenantRepo::new(), user_repo, MockRefreshRepo::new());

    let req = LoginReq {
        email: Some("alice@example.com".to_string()),
        username: None,
        password: Some("StrongPass1!".to_string()),
        role: Some("admin".to_string()),
    };

    let err = service.login(&tenant, req).await.unwrap_err();
    match err {
        shared_error::AppError::NotFound(msg) => assert_eq!(msg, "User not found"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn login_with_wrong_password_returns_invalid_credentials() {
    let tenant = sample_tenant();
    let hash = shared_password::hash("StrongPass1!", HashParams::default()).unwrap();
    let user = sample_user(Role::User, &hash);
    let membership = sample_membership(tenant.tenant_id, user.user_id, Role::User);

    let mut user_repo = MockUserRepo::new();
    user_repo.expect_find_in_tenant_by_email().returning(move |_, _| Ok(Some((user.clone(), membership.clone()))));

    let service = build_service(MockTenantRepo::new(), user_repo, MockRefreshRepo::new());

    let req = LoginReq {
        email: Some("alice@example.com".to_string()),
        username: None,
        password: Some("WrongPassword1!".to_string()),
        role: None,
    };

    let err = service.login(&tenant, req).await.unwrap_err();
    assert!(matches!(err, shared_error::AppError::InvalidCredentials(_)));
}

#[tokio::test]
async fn refresh_rejects_reused_jti() {
    let tenant = sample_tenant();
    let user = sample_user(Role::User, "unused-hash");
    let user_id = user.user_id;

    let family_id = Uuid::new_v4();
    let old_jti = Uuid::new_v4();
    let claims = shared_jwt::Claims::new_refresh(user_id, tenant.tenant_id, Role::User, 7202, family_id, old_jti);
    let refresh_token = shared_jwt::encode_jwt(&claims, &tenant.signing_secret).unwrap();

    let family = auth_service_core::domain::model::RefreshFamily {
        family_id,
        current_jti: old_jti,
        previous_jti: None,
        issued_at: Utc::now(),
        expires_at: Utc::now() + chrono::Duration::seconds(7202),
        bound_user_id: user_id,
        bound_tenant_id: tenant.tenant_id,
        revoked: false,
    };

    let mut user_repo = MockUserRepo::new();
    user_repo.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));

    let mut refresh_repo = MockRefreshRepo::new();
    refresh_repo.expect_find_by_id().returning(move |_| Ok(Some(family.clone())));
    // Simulates a replayed (already-rotated) jti: the CAS misses and the
    // repository reports the reuse by returning `None`.
    refresh_repo.expect_rotate().returning(|_, _, _, _| Ok(None));

    let service = build_service(MockTenantRepo::new(), user_repo, refresh_repo);

    let err = service.refresh(&tenant, &refresh_token).await.unwrap_err();
    assert!(matches!(err, shared_error::AppError::MissingAuth));
}

#[tokio::test]
async fn change_password_revokes_all_refresh_families() {
    let tenant = sample_tenant();
    let old_hash = shared_password::hash("OldPassword1!", HashParams::default()).unwrap();
    let user = sample_user(Role::User, &old_hash);
    let user_id = user.user_id;

    let access_claims = shared_jwt::Claims::new_access(user_id, tenant.tenant_id, Role::User, 900);
    let access_token = shared_jwt::encode_jwt(&access_claims, &tenant.signing_secret).unwrap();

    let mut user_repo = MockUserRepo::new();
    user_repo.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
    user_repo.expect_update_password_hash().returning(|_, _| Ok(()));

    let mut refresh_repo = MockRefreshRepo::new();
    refresh_repo.expect_revoke_all_for_user().withf(move |uid| *uid == user_id).times(1).returning(|_| Ok(()));

    let service = build_service(MockTenantRepo::new(), user_repo, refresh_repo);

    let req = ChangePasswordReq {
        old_password: Some("OldPassword1!".to_string()),
        new_password: Some("NewPassword1!".to_string()),
        confirm_new_password: Some("NewPassword1!".to_string()),
    };

    service.change_password(&tenant, &access_token, req).await.unwrap();
}

#[tokio::test]
async fn register_as_admin_with_valid_invitation_mints_tokens() {
    let tenant = sample_tenant();

    let mut user_repo = MockUserRepo::new();
    user_repo.expect_find_by_email_anywhere().returning(|_| Ok(None));
    user_repo.expect_create_admin_with_invitation().returning(move |_, email, username, hash, _code| {
        let mut user = sample_user(Role::Admin, hash);
        user.canonical_email = email.to_string();
        user.username = username.to_string();
        Ok(user)
    });

    let mut refresh_repo = MockRefreshRepo::new();
    refresh_repo.expect_create().returning(move |jti, user_id, bound_tenant_id, expires_at| {
        Ok(auth_service_core::domain::model::RefreshFamily {
            family_id: Uuid::new_v4(),
            current_jti: jti,
            previous_jti: None,
            issued_at: Utc::now(),
            expires_at,
            bound_user_id: user_id,
            bound_tenant_id,
            revoked: false,
        })
    });

    let service = build_service(MockTenantRepo::new(), user_repo, refresh_repo);

    let req = RegisterReq {
        email: Some("admin@example.com".to_string()),
        username: Some("adminuser".to_string()),
        password: Some("StrongPass1!".to_string()),
        role: Some("admin".to_string()),
        invitation_code: Some("ABCD2345".to_string()),
        redirect_uri: None,
        state: None,
        nonce: None,
    };

    let (resp, _refresh_token) = service.register(&tenant, req).await.unwrap();
    assert_eq!(resp.role, Role::Admin);
}

#[tokio::test]
async fn register_with_disallowed_redirect_uri_is_forbidden() {
    let tenant = sample_tenant();
    let service = build_service(MockTenantRepo::new(), MockUserRepo::new(), MockRefreshRepo::new());

    let req = RegisterReq {
        email: Some("new@example.com".to_string()),
        username: Some("newuser".to_string()),
        password: Some("StrongPass1!".to_string()),
        role: Some("user".to_string()),
        invitation_code: None,
        redirect_uri: Some("https://evil.example/cb".to_string()),
        state: None,
        nonce: None,
    };

    let err = service.register(&tenant, req).await.unwrap_err();
    assert!(matches!(err, shared_error::AppError::RoleForbidden(_)));
}

#[tokio::test]
async fn register_with_markup_in_redirect_uri_is_rejected() {
    let tenant = sample_tenant();
    let service = build_service(MockTenantRepo::new(), MockUserRepo::new(), MockRefreshRepo::new());

    let req = RegisterReq {
        email: Some("new@example.com".to_string()),
        username: Some("newuser".to_string()),
        password: Some("StrongPass1!".to_string()),
        role: Some("user".to_string()),
        invitation_code: None,
        // Origin is allow-listed (see `build_service`), but the path smuggles
        // markup that §4.5 requires the redirect_uri validator to reject.
        redirect_uri: Some(r#"https://app.example.com/"><script>"#.to_string()),
        state: None,
        nonce: None,
    };

    let err = service.register(&tenant, req).await.unwrap_err();
    assert!(matches!(err, shared_error::AppError::ValidationSyntactic(_)));
}

#[tokio::test]
async fn sso_logout_with_markup_in_redirect_uri_is_forbidden() {
    let tenant = sample_tenant();
    let service = build_service(MockTenantRepo::new(), MockUserRepo::new(), MockRefreshRepo::new());

    let err = service
        .sso_logout(&tenant, None, r#"https://app.example.com/"><script>"#)
        .await
        .unwrap_err();
    assert!(matches!(err, shared_error::AppError::RoleForbidden(_)));
}
