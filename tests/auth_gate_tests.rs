use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, Method, Request, header, request::Parts},
};
use chrono::{Duration, Utc};
use restaurant_menu::{
    ApiError, AppConfig, AppState, InMemoryRepository,
    auth::{AdminUser, AuthGate, AuthUser, authorize, bearer_token},
    models::Role,
    token::{SigningKey, TokenIssuer, TokenVerifier},
};
use std::sync::Arc;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_ACCOUNT_ID: i64 = 1;

fn issuer() -> TokenIssuer {
    TokenIssuer::new(SigningKey::from_secret(TEST_JWT_SECRET).unwrap(), 72).unwrap()
}

fn gate() -> AuthGate {
    AuthGate::new(TokenVerifier::new(
        SigningKey::from_secret(TEST_JWT_SECRET).unwrap(),
    ))
}

fn create_app_state() -> AppState {
    let mut config = AppConfig::default();
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    let repo = Arc::new(InMemoryRepository::new());
    AppState::build(config, repo.clone(), repo).unwrap()
}

fn bearer_headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

fn get_request_parts(authorization: Option<&str>) -> Parts {
    let mut builder = Request::builder().method(Method::GET).uri("/admin/all-categories");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

// --- Pipeline Tests ---

#[test]
fn test_bearer_token_extraction() {
    assert_eq!(bearer_token(&bearer_headers("Bearer abc.def")), Some("abc.def"));
    assert_eq!(bearer_token(&bearer_headers("Basic dXNlcjpwYXNz")), None);
    assert_eq!(bearer_token(&bearer_headers("bearer abc.def")), None);
    assert_eq!(bearer_token(&bearer_headers("Bearer ")), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
}

#[test]
fn test_missing_header_is_unauthenticated() {
    let result = gate().check(&HeaderMap::new(), Role::Admin, Utc::now());
    assert_eq!(result, Err(ApiError::Unauthenticated));
}

#[test]
fn test_header_without_bearer_prefix_is_unauthenticated() {
    let now = Utc::now();
    let token = issuer().issue_at(TEST_ACCOUNT_ID, Role::Admin, now).unwrap();

    let result = gate().check(&bearer_headers(&token), Role::Admin, now);
    assert_eq!(result, Err(ApiError::Unauthenticated));

    let result = gate().check(&bearer_headers(&format!("Token {token}")), Role::Admin, now);
    assert_eq!(result, Err(ApiError::Unauthenticated));
}

#[test]
fn test_expired_token_is_unauthenticated() {
    let issued = Utc::now() - Duration::hours(73);
    let token = issuer().issue_at(TEST_ACCOUNT_ID, Role::Admin, issued).unwrap();

    let result = gate().check(&bearer_headers(&format!("Bearer {token}")), Role::Admin, Utc::now());
    assert_eq!(result, Err(ApiError::Unauthenticated));
}

#[test]
fn test_client_role_is_forbidden_on_admin_operation() {
    let now = Utc::now();
    let token = issuer().issue_at(TEST_ACCOUNT_ID, Role::Client, now).unwrap();

    let result = gate().check(&bearer_headers(&format!("Bearer {token}")), Role::Admin, now);
    assert_eq!(result, Err(ApiError::Forbidden));
}

#[test]
fn test_admin_role_passes_with_subject_attached() {
    let now = Utc::now();
    let token = issuer().issue_at(TEST_ACCOUNT_ID, Role::Admin, now).unwrap();

    let user = gate()
        .check(&bearer_headers(&format!("Bearer {token}")), Role::Admin, now)
        .unwrap();
    assert_eq!(
        user,
        AuthUser {
            id: TEST_ACCOUNT_ID,
            role: Role::Admin
        }
    );
}

#[test]
fn test_token_signed_with_other_key_is_unauthenticated() {
    let now = Utc::now();
    let foreign = TokenIssuer::new(SigningKey::from_secret("someone-else").unwrap(), 72).unwrap();
    let token = foreign.issue_at(TEST_ACCOUNT_ID, Role::Admin, now).unwrap();

    let result = gate().check(&bearer_headers(&format!("Bearer {token}")), Role::Admin, now);
    assert_eq!(result, Err(ApiError::Unauthenticated));
}

#[test]
fn test_authorize_compares_roles() {
    let client = AuthUser {
        id: 2,
        role: Role::Client,
    };
    assert_eq!(authorize(client, Role::Admin), Err(ApiError::Forbidden));
    assert_eq!(authorize(client, Role::Client), Ok(client));
}

// --- Extractor Tests ---

#[tokio::test]
async fn test_extractor_success_with_valid_jwt() {
    let state = create_app_state();
    let token = issuer().issue(TEST_ACCOUNT_ID, Role::Client).unwrap();
    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));

    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user.id, TEST_ACCOUNT_ID);
    assert_eq!(user.role, Role::Client);
}

#[tokio::test]
async fn test_extractor_failure_with_missing_header() {
    let state = create_app_state();
    let mut parts = get_request_parts(None);

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert_eq!(result.unwrap_err(), ApiError::Unauthenticated);
}

#[tokio::test]
async fn test_admin_extractor_rejects_client() {
    let state = create_app_state();
    let token = issuer().issue(TEST_ACCOUNT_ID, Role::Client).unwrap();
    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));

    let result = AdminUser::from_request_parts(&mut parts, &state).await;
    assert_eq!(result.unwrap_err(), ApiError::Forbidden);
}

#[tokio::test]
async fn test_admin_extractor_accepts_admin() {
    let state = create_app_state();
    let token = issuer().issue(TEST_ACCOUNT_ID, Role::Admin).unwrap();
    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));

    let AdminUser(user) = AdminUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user.id, TEST_ACCOUNT_ID);
}

#[tokio::test]
async fn test_extractor_prefers_identity_attached_by_gate() {
    let state = create_app_state();
    let mut parts = get_request_parts(None);
    let attached = AuthUser {
        id: 99,
        role: Role::Admin,
    };
    parts.extensions.insert(attached);

    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user, attached);
}
