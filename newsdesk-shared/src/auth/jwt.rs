/// Token issuance and validation
///
/// Tokens are compact JWTs (`header.claims.signature`, each segment base64url without
/// padding) signed with HS256 under a process-wide secret. The issuer and the validator
/// are built once at startup from configuration and shared by reference afterwards.
///
/// # Validation stages
///
/// 1. **Structure**: three non-empty segments, an HS256 header and decodable claims.
///    Anything else is [`TokenError::Malformed`] and no signature check is attempted.
/// 2. **Signature**: HMAC-SHA256 over `header.claims`. Any mismatch is
///    [`TokenError::InvalidSignature`].
/// 3. **Expiry**: `exp <= now` is [`TokenError::Expired`].
///
/// The three kinds stay distinct for logging and tests; the HTTP boundary collapses them
/// into a single 401.
///
/// # Example
///
/// ```
/// use newsdesk_shared::auth::jwt::{TokenIssuer, TokenValidator};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "your-secret-key-at-least-32-bytes-long";
/// let issuer = TokenIssuer::new(secret)?;
/// let validator = TokenValidator::new(secret)?;
///
/// let token = issuer.issue("alice")?;
/// let claims = validator.validate(&token)?;
/// assert_eq!(claims.sub, "alice");
/// # Ok(())
/// # }
/// ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Lifetime of every issued token
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Minimum accepted length of the signing secret in bytes (256 bits for HS256)
pub const MIN_SECRET_LEN: usize = 32;

/// Error raised while building keys or signing
///
/// Both cases mean the process is misconfigured; they are not per-request failures.
#[derive(Debug, thiserror::Error)]
pub enum SigningKeyError {
    /// Secret is shorter than [`MIN_SECRET_LEN`]
    #[error("Signing secret must be at least {min} bytes, got {actual}")]
    TooShort { min: usize, actual: usize },

    /// Encoding the token failed
    #[error("Failed to sign token: {0}")]
    Encode(String),
}

/// Reason a presented token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not a structurally valid HS256 token
    #[error("Malformed token")]
    Malformed,

    /// Well-formed but signed with a different key or tampered with
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Correctly signed but past its expiry
    #[error("Token has expired")]
    Expired,
}

impl TokenError {
    /// Short label for structured logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
        }
    }
}

/// Signed token payload
///
/// - `sub`: Subject (username)
/// - `iat`: Issued at (Unix seconds)
/// - `exp`: Expiration (Unix seconds), always `iat + 24h`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - username
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for `subject` issued at `issued_at`
    pub fn new(subject: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        let expiration = issued_at + Duration::hours(TOKEN_LIFETIME_HOURS);

        Self {
            sub: subject.into(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Checks expiry against a supplied instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

fn check_secret(secret: &str) -> Result<(), SigningKeyError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(SigningKeyError::TooShort {
            min: MIN_SECRET_LEN,
            actual: secret.len(),
        });
    }
    Ok(())
}

/// Creates signed tokens for authenticated subjects
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    header: Header,
}

impl TokenIssuer {
    /// Builds an issuer from the process-wide secret
    ///
    /// # Errors
    ///
    /// Returns `SigningKeyError::TooShort` if the secret is under 32 bytes
    pub fn new(secret: &str) -> Result<Self, SigningKeyError> {
        check_secret(secret)?;

        Ok(Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            header: Header::new(Algorithm::HS256),
        })
    }

    /// Issues a token for `username` valid for 24 hours from now
    pub fn issue(&self, username: &str) -> Result<String, SigningKeyError> {
        self.issue_at(username, Utc::now())
    }

    /// Issues a token for `username` as if the current time were `now`
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<String, SigningKeyError> {
        let claims = Claims::new(username, now);

        encode(&self.header, &claims, &self.key)
            .map_err(|e| SigningKeyError::Encode(e.to_string()))
    }
}

/// Verifies tokens produced by [`TokenIssuer`]
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    /// Builds a validator from the process-wide secret
    ///
    /// # Errors
    ///
    /// Returns `SigningKeyError::TooShort` if the secret is under 32 bytes
    pub fn new(secret: &str) -> Result<Self, SigningKeyError> {
        check_secret(secret)?;

        // Expiry is checked against an explicit clock in `validate_at`, with no leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Validates a token against the current time
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validates a token against a supplied instant
    ///
    /// Pure computation: no I/O, no shared mutable state.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        parse_structure(token)?;

        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::trace!(error = %e, "Token signature check failed");
            TokenError::InvalidSignature
        })?;

        if data.claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

/// Structural checks that run before any cryptography.
fn parse_structure(token: &str) -> Result<Claims, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(claims), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    if header.is_empty() || claims.is_empty() || signature.is_empty() {
        return Err(TokenError::Malformed);
    }

    let header: Header = decode_segment(header)?;
    if header.alg != Algorithm::HS256 {
        return Err(TokenError::Malformed);
    }

    decode_segment(claims)
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
