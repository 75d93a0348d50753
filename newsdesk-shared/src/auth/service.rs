/// Registration and login
///
/// [`AuthService`] ties together the credential store, the password hasher and the
/// token issuer. All three are injected at construction. The only other state is a
/// placeholder hash, derived once from the hasher's parameters, that unknown-user logins
/// are verified against so they cost the same Argon2 work as a wrong password.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use newsdesk_shared::auth::{jwt::TokenIssuer, password::PasswordHasher, service::AuthService};
/// use newsdesk_shared::models::user::InMemoryCredentialStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = AuthService::new(
///     Arc::new(InMemoryCredentialStore::new()),
///     PasswordHasher::new(),
///     TokenIssuer::new("your-secret-key-at-least-32-bytes-long")?,
/// );
///
/// service.register("alice", "s3cret-password").await?;
/// let token = service.login("alice", "s3cret-password").await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::jwt::TokenIssuer;
use super::password::PasswordHasher;
use crate::models::user::{CredentialStore, NewUser, StoreError, User};

/// Error type for registration and login
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// A required field is missing or blank
    #[error("{field} must not be blank")]
    Validation { field: &'static str },

    /// Username already registered
    #[error("Username already exists")]
    Conflict,

    /// Unknown user or wrong password; deliberately indistinguishable
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Credential store unreachable
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),

    /// Hashing or signing failed
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => AuthServiceError::Conflict,
            StoreError::NotFound(_) => AuthServiceError::InvalidCredentials,
            StoreError::Unavailable(msg) => AuthServiceError::Unavailable(msg),
        }
    }
}

/// Register/login orchestration
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    dummy_hash: Arc<OnceCell<String>>,
}

/// Password hashed into the placeholder; never matches a real login
const DUMMY_PASSWORD: &str = "newsdesk-unknown-user-placeholder";

impl AuthService {
    /// Creates a service from its collaborators
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher, issuer: TokenIssuer) -> Self {
        Self {
            store,
            hasher,
            issuer,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Registers a new user
    ///
    /// # Errors
    ///
    /// - `Validation` if the username or password is blank
    /// - `Conflict` if the username is taken, including when a concurrent
    ///   registration wins the race
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthServiceError> {
        if username.trim().is_empty() {
            return Err(AuthServiceError::Validation { field: "username" });
        }
        if password.trim().is_empty() {
            return Err(AuthServiceError::Validation { field: "password" });
        }

        // Cheap early exit; the store's save is still the authoritative check.
        match self.store.find_by_username(username).await {
            Ok(_) => return Err(AuthServiceError::Conflict),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let password_hash = self.hash_password(password).await?;

        let user = self
            .store
            .save(NewUser {
                username: username.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Verifies credentials and issues a token
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown user and for a wrong password alike.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthServiceError> {
        let user = match self.store.find_by_username(username).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                // Same Argon2 cost as a wrong password for an existing user.
                let dummy = self.dummy_hash().await?;
                self.verify_password(password, dummy).await?;
                warn!(username = %username, "Login failed");
                return Err(AuthServiceError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.verify_password(password, &user.password_hash).await? {
            warn!(username = %username, "Login failed");
            return Err(AuthServiceError::InvalidCredentials);
        }

        let token = self
            .issuer
            .issue(&user.username)
            .map_err(|e| AuthServiceError::Internal(e.to_string()))?;

        info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok(token)
    }

    async fn dummy_hash(&self) -> Result<&str, AuthServiceError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
            .await
            .map(String::as_str)
    }

    // Argon2 work runs on the blocking pool.
    async fn hash_password(&self, password: &str) -> Result<String, AuthServiceError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthServiceError::Internal(e.to_string()))?
            .map_err(|e| AuthServiceError::Internal(e.to_string()))
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthServiceError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthServiceError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenValidator;
    use crate::models::user::InMemoryCredentialStore;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            PasswordHasher::with_params(4096, 1, 1).unwrap(),
            TokenIssuer::new(SECRET).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();

        let user = service.register("alice", "password123").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "password123");

        let token = service.login("alice", "password123").await.unwrap();
        let claims = TokenValidator::new(SECRET).unwrap().validate(&token).unwrap();
        assert_eq!(claims.sub, "alice");
    }

    #[tokio::test]
    async fn test_register_blank_fields() {
        let service = service();

        assert!(matches!(
            service.register("", "password").await,
            Err(AuthServiceError::Validation { field: "username" })
        ));
        assert!(matches!(
            service.register("   ", "password").await,
            Err(AuthServiceError::Validation { field: "username" })
        ));
        assert!(matches!(
            service.register("alice", "").await,
            Err(AuthServiceError::Validation { field: "password" })
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let service = service();

        service.register("alice", "password123").await.unwrap();
        let second = service.register("alice", "other-password").await;
        assert!(matches!(second, Err(AuthServiceError::Conflict)));

        // Original password still works
        assert!(service.login("alice", "password123").await.is_ok());
        assert!(service.login("alice", "other-password").await.is_err());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.register("alice", "password123").await.unwrap();

        let wrong_password = service.login("alice", "wrongpassword").await.unwrap_err();
        let unknown_user = service.login("nouser", "anything").await.unwrap_err();

        assert!(matches!(wrong_password, AuthServiceError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthServiceError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_unknown_user_login_runs_argon2() {
        let service = service();
        assert!(service.dummy_hash.get().is_none());

        let err = service.login("nouser", "anything").await.unwrap_err();
        assert!(matches!(err, AuthServiceError::InvalidCredentials));

        // The placeholder was hashed with the configured parameters and verified against
        let dummy = service.dummy_hash.get().expect("placeholder hash created");
        assert!(dummy.starts_with("$argon2id$v=19$m=4096,t=1,p=1$"));

        // Built once and reused
        service.login("other", "anything").await.unwrap_err();
        assert_eq!(service.dummy_hash.get(), Some(dummy));
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_take_comparable_time() {
        let service = AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            PasswordHasher::with_params(19456, 2, 1).unwrap(),
            TokenIssuer::new(SECRET).unwrap(),
        );
        service.register("alice", "password123").await.unwrap();

        // Warm the placeholder so only verification is measured
        service.login("warmup", "x").await.unwrap_err();

        let started = std::time::Instant::now();
        service.login("alice", "wrongpassword").await.unwrap_err();
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        service.login("nouser", "wrongpassword").await.unwrap_err();
        let unknown_user = started.elapsed();

        assert!(
            unknown_user * 10 > wrong_password,
            "unknown user {:?} vs wrong password {:?}",
            unknown_user,
            wrong_password
        );
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            AuthServiceError::from(StoreError::Conflict("a".into())),
            AuthServiceError::Conflict
        ));
        assert!(matches!(
            AuthServiceError::from(StoreError::NotFound("a".into())),
            AuthServiceError::InvalidCredentials
        ));
        assert!(matches!(
            AuthServiceError::from(StoreError::Unavailable("down".into())),
            AuthServiceError::Unavailable(_)
        ));
    }
}
