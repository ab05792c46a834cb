use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Role;

/// Default lifetime of an issued token.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;

/// Upper bound for a configured token lifetime (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// TokenError
///
/// Internal classification of token failures. The gate collapses every variant into a single
/// outward "unauthenticated" answer; the distinction only feeds logs and tests.
#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("signing key is empty")]
    EmptySigningKey,

    #[error("token lifetime must be between 1 and {max} hours, got {0}", max = MAX_TOKEN_TTL_HOURS)]
    InvalidTtl(i64),

    #[error("token encoding failed: {0}")]
    Encoding(String),

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token expired")]
    Expired,

    #[error("unrecognized role in token: {0}")]
    UnknownRole(String),
}

/// Claims
///
/// The payload signed into every bearer token. Nothing about it is stored server-side;
/// each request reconstructs it from the token alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the account id.
    pub sub: i64,
    /// The account's role at login time. Kept as a raw string so an unknown value can be
    /// rejected explicitly instead of failing deserialization.
    pub role: String,
    /// Issued At (iat), Unix seconds.
    pub iat: i64,
    /// Expiration Time (exp), Unix seconds. Always `iat + ttl`.
    pub exp: i64,
}

/// VerifiedClaims
///
/// Claims that passed signature, expiry and role checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifiedClaims {
    pub account_id: i64,
    pub role: Role,
    pub expires_at: i64,
}

/// SigningKey
///
/// The process-wide HMAC key, built once from configuration and shared read-only by the
/// issuer and the verifier. An empty secret is refused at construction.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn from_secret(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySigningKey);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }
}

/// TokenIssuer
///
/// Signs HS256 JWTs with a fixed lifetime.
#[derive(Clone)]
pub struct TokenIssuer {
    key: SigningKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Fails with `InvalidTtl` unless `ttl_hours` is in `1..=MAX_TOKEN_TTL_HOURS`, so every
    /// issued token expires strictly after its issue time.
    pub fn new(key: SigningKey, ttl_hours: i64) -> Result<Self, TokenError> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&ttl_hours) {
            return Err(TokenError::InvalidTtl(ttl_hours));
        }
        let ttl = Duration::try_hours(ttl_hours).ok_or(TokenError::InvalidTtl(ttl_hours))?;
        Ok(Self { key, ttl })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, account_id: i64, role: Role) -> Result<String, TokenError> {
        self.issue_at(account_id, role, Utc::now())
    }

    /// Issues a token as if the current time were `now`. Deterministic for identical inputs.
    pub fn issue_at(
        &self,
        account_id: i64,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: account_id,
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .ok_or_else(|| TokenError::Encoding("expiry out of range".to_string()))?
                .timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.key.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }
}

/// TokenVerifier
///
/// Checks signature, expiry and claim shape of an inbound token.
#[derive(Clone)]
pub struct TokenVerifier {
    key: SigningKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(key: SigningKey) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against an explicit instant in `verify_at`, with no leeway.
        // `exp` stays a required claim.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies the token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedClaims, TokenError> {
        let data = decode::<Claims>(token, &self.key.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;
        let claims = data.claims;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        // Malformed claims are never treated as elevated.
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| TokenError::UnknownRole(claims.role.clone()))?;

        Ok(VerifiedClaims {
            account_id: claims.sub,
            role,
            expires_at: claims.exp,
        })
    }
}
