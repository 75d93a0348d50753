/// Password hashing module using Argon2id
///
/// Hashes are produced in PHC string format, so the algorithm, cost parameters and the
/// per-hash random salt travel with the stored value. Verification reads the parameters
/// back out of the hash, which lets the cost be raised later without invalidating
/// existing users.
///
/// # Security
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use newsdesk_shared::auth::password::PasswordHasher;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new();
/// let hash = hasher.hash("super_secret_password_123")?;
///
/// assert!(hasher.verify("super_secret_password_123", &hash));
/// assert!(!hasher.verify("wrong_password", &hash));
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Argon2, Params, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Cost parameters were rejected by Argon2
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),
}

/// Default Argon2 memory cost in KiB (64 MB)
pub const DEFAULT_M_COST: u32 = 65536;

/// Default Argon2 iteration count
pub const DEFAULT_T_COST: u32 = 3;

/// Default Argon2 parallelism
pub const DEFAULT_P_COST: u32 = 4;

/// One-way salted password hasher
///
/// Cheap to clone; holds only the cost parameters used for new hashes.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Creates a hasher with the production cost parameters
    pub fn new() -> Self {
        // The default constants are always accepted by Argon2.
        Self::with_params(DEFAULT_M_COST, DEFAULT_T_COST, DEFAULT_P_COST)
            .unwrap_or_else(|_| Self {
                params: Params::default(),
            })
    }

    /// Creates a hasher with custom cost parameters
    ///
    /// # Arguments
    ///
    /// * `m_cost` - Memory in KiB (at least `8 * p_cost`)
    /// * `t_cost` - Number of passes (at least 1)
    /// * `p_cost` - Degree of parallelism (at least 1)
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParams` if Argon2 rejects the combination
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(m_cost)
            .t_cost(t_cost)
            .p_cost(p_cost)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self { params })
    }

    /// Hashes a plaintext password with a fresh random salt
    ///
    /// Example output:
    /// ```text
    /// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if hashing fails
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        );

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    /// Verifies a password against a stored PHC hash
    ///
    /// Returns `false` for a wrong password and also for a stored hash that cannot be
    /// parsed; a corrupt record must never authenticate, and callers get a plain answer.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        // Parameters are embedded in the hash.
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
