use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::{error::ApiError, models::Role, token::TokenVerifier};

/// AuthUser
///
/// The resolved identity of an authenticated request: the token's subject and role.
/// Once the gate accepts a request this value is attached to the request extensions,
/// where handlers pick it up as an extractor argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

/// AdminUser
///
/// An `AuthUser` whose role is `admin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdminUser(pub AuthUser);

/// AuthGate
///
/// The request-time pipeline: extract the bearer credential, verify it, decode its claims,
/// then authorize the role. Each step short-circuits; nothing is retried.
#[derive(Clone)]
pub struct AuthGate {
    verifier: TokenVerifier,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// Steps 1 to 3. Every failure is `Unauthenticated`.
    pub fn authenticate(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Result<AuthUser, ApiError> {
        let token = bearer_token(headers).ok_or_else(|| {
            tracing::debug!("Rejected request without a bearer credential");
            ApiError::Unauthenticated
        })?;

        let claims = self.verifier.verify_at(token, now).map_err(|e| {
            tracing::debug!(reason = %e, "Rejected bearer token");
            ApiError::Unauthenticated
        })?;

        Ok(AuthUser {
            id: claims.account_id,
            role: claims.role,
        })
    }

    /// The full pipeline, including the role comparison (step 4).
    pub fn check(
        &self,
        headers: &HeaderMap,
        required: Role,
        now: DateTime<Utc>,
    ) -> Result<AuthUser, ApiError> {
        let user = self.authenticate(headers, now)?;
        authorize(user, required)
    }
}

/// Returns the token of an `Authorization: Bearer <token>` header, if there is one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// Step 4: a valid identity with the wrong role is `Forbidden`, not `Unauthenticated`.
pub fn authorize(user: AuthUser, required: Role) -> Result<AuthUser, ApiError> {
    if user.role != required {
        tracing::info!(account_id = user.id, role = %user.role, required = %required, "Role check failed");
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}

/// AuthUser Extractor Implementation
///
/// Reuses the identity attached by `require_admin` when present, otherwise runs the
/// authentication steps of the gate against the current time.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthGate: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let gate = AuthGate::from_ref(state);
        gate.authenticate(&parts.headers, Utc::now())
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AuthGate: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        authorize(user, Role::Admin).map(AdminUser)
    }
}

/// require_admin
///
/// Route layer for the `/admin` router. A rejection from the `AdminUser` extractor ends the
/// request before any handler runs; on success the identity is attached to the request.
pub async fn require_admin(AdminUser(user): AdminUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}
