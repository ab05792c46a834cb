use crate::{
    error::{ApiError, ApiResult},
    models::{AccountResponse, NewAccount, RegisterRequest, Role},
    password::PasswordHasher,
    repository::{AccountDirectoryState, RepositoryError},
    token::TokenIssuer,
};
use tokio::{sync::OnceCell, task};

// Stand-in password hashed once per service, so an unknown email costs one bcrypt verify
// just like a wrong password.
const DUMMY_PASSWORD: &str = "restaurant-menu-dummy-password";

/// AuthService
///
/// Composes the account directory, the password hasher and the token issuer into the
/// register and login flows. Holds no per-request state, so one instance serves every request.
pub struct AuthService {
    accounts: AccountDirectoryState,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    dummy_digest: OnceCell<String>,
}

impl AuthService {
    pub fn new(accounts: AccountDirectoryState, hasher: PasswordHasher, issuer: TokenIssuer) -> Self {
        Self {
            accounts,
            hasher,
            issuer,
            dummy_digest: OnceCell::new(),
        }
    }

    /// Runs bcrypt hashing on the blocking pool so it never stalls an async worker.
    async fn hash_password(&self, password: String) -> ApiResult<String> {
        let hasher = self.hasher;
        let digest = task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))??;
        Ok(digest)
    }

    /// Blocking-pool counterpart of `PasswordHasher::verify`.
    async fn verify_password(&self, password: &str, digest: &str) -> ApiResult<bool> {
        let hasher = self.hasher;
        let password = password.to_string();
        let digest = digest.to_string();
        task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| ApiError::Internal(format!("password verify task failed: {e}")))
    }

    async fn dummy_digest(&self) -> ApiResult<&str> {
        self.dummy_digest
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD.to_string()))
            .await
            .map(String::as_str)
    }

    /// register
    ///
    /// Hashes the password, rejects an already registered email and stores the account with
    /// the role chosen by the caller's route. The lookup is only a fast path: the directory's
    /// insert is what actually guarantees uniqueness under concurrent registrations.
    pub async fn register(&self, input: RegisterRequest, role: Role) -> ApiResult<AccountResponse> {
        let password_hash = self.hash_password(input.password).await?;

        if self.accounts.find_by_email(&input.email).await?.is_some() {
            tracing::info!(email = %input.email, "Registration rejected: email already registered");
            return Err(ApiError::Conflict("email already registered".to_string()));
        }

        let account = self
            .accounts
            .insert(NewAccount {
                name: input.name,
                email: input.email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => {
                    ApiError::Conflict("email already registered".to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(account_id = account.id, role = %account.role, "Account registered");
        Ok(AccountResponse::from(&account))
    }

    /// login
    ///
    /// Unknown email and wrong password produce the same `InvalidCredentials` error, and both
    /// run one bcrypt verify.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<String> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            let digest = self.dummy_digest().await?;
            self.verify_password(password, digest).await?;
            tracing::info!(email = %email, "Login failed");
            return Err(ApiError::InvalidCredentials);
        };

        if !self.verify_password(password, &account.password_hash).await? {
            tracing::info!(email = %email, "Login failed");
            return Err(ApiError::InvalidCredentials);
        }

        let token = self
            .issuer
            .issue(account.id, account.role)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        tracing::info!(account_id = account.id, "Login succeeded");
        Ok(token)
    }
}
