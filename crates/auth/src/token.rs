//! Bearer token validation.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::RawClaims;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("invalid issuer")]
    InvalidIssuer,

    #[error("invalid audience")]
    InvalidAudience,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("invalid verification key: {0}")]
    InvalidKey(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
            ErrorKind::InvalidAudience => TokenError::InvalidAudience,
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidKeyFormat => {
                TokenError::InvalidKey(e.to_string())
            }
            _ => TokenError::Malformed(e.to_string()),
        }
    }
}

/// Validates a bearer token and returns its decoded payload.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<RawClaims, TokenError>;
}

/// Registered-claim checks applied on top of the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSettings {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_secs: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            issuer: None,
            audience: Some("account".to_string()),
            leeway_secs: 300,
        }
    }
}

/// Validator over a single, statically configured key.
#[derive(Clone)]
pub struct StaticKeyValidator {
    key: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for StaticKeyValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StaticKeyValidator")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl StaticKeyValidator {
    /// HS256 with a shared secret.
    pub fn hs256(secret: &[u8], settings: &TokenSettings) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: validation(Algorithm::HS256, settings),
        }
    }

    /// RS256 with the identity provider's PEM-encoded public key.
    pub fn rs256_pem(pem: &[u8], settings: &TokenSettings) -> Result<Self, TokenError> {
        Ok(Self {
            key: DecodingKey::from_rsa_pem(pem)?,
            validation: validation(Algorithm::RS256, settings),
        })
    }
}

impl JwtValidator for StaticKeyValidator {
    fn validate(&self, token: &str) -> Result<RawClaims, TokenError> {
        let data = jsonwebtoken::decode::<RawClaims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

fn validation(alg: Algorithm, settings: &TokenSettings) -> Validation {
    let mut validation = Validation::new(alg);
    validation.leeway = settings.leeway_secs;

    match &settings.issuer {
        Some(issuer) => validation.set_issuer(&[issuer.as_str()]),
        None => validation.iss = None,
    }
    match &settings.audience {
        Some(audience) => validation.set_audience(&[audience.as_str()]),
        None => validation.validate_aud = false,
    }

    validation
}
