//! Stateless access tokens (compact JWS, HS256).

use chrono::{DateTime, Duration, Timelike, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use reading_core::Identity;

use crate::claims::{TokenClaims, validate_claims};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token could not be encoded")]
    Encoding,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenConfigError {
    #[error("signing key must not be empty")]
    EmptyKey,

    #[error("token validity must be positive (got {0}s)")]
    NonPositiveValidity(i64),

    #[error("token validity must not exceed {max}s (got {got}s)")]
    ValidityTooLong { got: i64, max: i64 },
}

/// Process-wide HMAC secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, TokenConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenConfigError::EmptyKey);
        }
        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Deployment policy for token issuance: the signing key and how long an
/// issued token stays valid.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    key: SigningKey,
    validity: Duration,
}

impl TokenConfig {
    pub const DEFAULT_VALIDITY_SECS: i64 = 3600;
    /// 30 days.
    pub const MAX_VALIDITY_SECS: i64 = 30 * 24 * 3600;

    pub fn new(key: SigningKey, validity: Duration) -> Result<Self, TokenConfigError> {
        if validity <= Duration::zero() {
            return Err(TokenConfigError::NonPositiveValidity(validity.num_seconds()));
        }
        if validity.num_seconds() > Self::MAX_VALIDITY_SECS {
            return Err(TokenConfigError::ValidityTooLong {
                got: validity.num_seconds(),
                max: Self::MAX_VALIDITY_SECS,
            });
        }
        Ok(Self { key, validity })
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }
}

/// Issues and parses access tokens.
///
/// Built once at startup from a [`TokenConfig`] and shared read-only across
/// requests. Time is always passed in, so callers decide what "now" means.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    validity: Duration,
}

impl TokenCodec {
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked by `validate_claims` against the injected clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(config.key.as_bytes()),
            decoding: DecodingKey::from_secret(config.key.as_bytes()),
            validation,
            validity: config.validity,
        }
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Build the claim set for `identity` issued at `now` (truncated to whole
    /// seconds, the precision of the wire format).
    ///
    /// Fails with [`TokenError::Encoding`] when the expiry is not
    /// representable.
    pub fn claims_for(&self, identity: Identity, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let issued_at = now.with_nanosecond(0).unwrap_or(now);
        let expires_at = issued_at
            .checked_add_signed(self.validity)
            .ok_or(TokenError::Encoding)?;
        Ok(TokenClaims {
            sub: identity,
            issued_at,
            expires_at,
        })
    }

    pub fn issue(&self, identity: Identity, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = self.claims_for(identity, now)?;
        jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|_| TokenError::Encoding)
    }

    /// Verify `token` and return the identity it asserts.
    ///
    /// Order matters: the signature over `header.payload` is checked before
    /// any claim is decoded, so a forged token never reaches the expiry check.
    pub fn parse(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let claims = self.verify(token)?;
        validate_claims(&claims, now)?;
        Ok(claims.sub)
    }

    /// Signature and decoding only; no time checks.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let (message, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;

        let signed = jsonwebtoken::crypto::verify(signature, message.as_bytes(), &self.decoding, ALGORITHM)
            .map_err(|_| TokenError::BadSignature)?;
        if !signed {
            return Err(TokenError::BadSignature);
        }

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Malformed)?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}
