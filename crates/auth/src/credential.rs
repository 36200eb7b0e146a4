//! Password credentials: Argon2id hashing and verification.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("secret is empty or cannot be hashed")]
    InvalidSecret,

    #[error("credential does not match")]
    MismatchedCredential,

    #[error("invalid hashing parameters")]
    InvalidParams,
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for CredentialConfig {
    /// OWASP minimum for Argon2id (19 MiB, 2 passes, 1 lane).
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl CredentialConfig {
    /// Smallest parameters Argon2 accepts. Test-only strength.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Hashes secrets for storage and checks candidates against stored digests.
///
/// Digests are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`), so a
/// digest produced under older parameters still verifies after a config change.
pub struct CredentialVerifier {
    params: Params,
    /// Digest of a throwaway secret, verified against when there is no real
    /// digest to check, so unknown accounts cost as much as wrong passwords.
    dummy_digest: String,
}

impl CredentialVerifier {
    pub fn new(config: CredentialConfig) -> Result<Self, CredentialError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|_| CredentialError::InvalidParams)?;
        let salt = SaltString::generate(&mut OsRng);
        let dummy_digest = hash_with(&params, b"reading-api-dummy-credential", &salt)?;
        Ok(Self { params, dummy_digest })
    }

    /// Hash `secret` with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hash_with_salt(secret, &salt)
    }

    /// Deterministic for a given salt.
    pub fn hash_with_salt(&self, secret: &str, salt: &SaltString) -> Result<String, CredentialError> {
        if secret.is_empty() {
            return Err(CredentialError::InvalidSecret);
        }
        hash_with(&self.params, secret.as_bytes(), salt)
    }

    /// Check `candidate` against a stored `digest`.
    ///
    /// A digest that cannot be parsed is reported as a mismatch, after doing
    /// the same amount of hashing work as a real comparison.
    pub fn verify(&self, digest: &str, candidate: &str) -> Result<(), CredentialError> {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2()
                .verify_password(candidate.as_bytes(), &parsed)
                .map_err(|_| CredentialError::MismatchedCredential),
            Err(_) => {
                self.burn(candidate);
                Err(CredentialError::MismatchedCredential)
            }
        }
    }

    pub fn matches(&self, digest: &str, candidate: &str) -> bool {
        self.verify(digest, candidate).is_ok()
    }

    /// Spend one verification's worth of work and discard the result.
    pub fn burn(&self, candidate: &str) {
        if let Ok(parsed) = PasswordHash::new(&self.dummy_digest) {
            let _ = self.argon2().verify_password(candidate.as_bytes(), &parsed);
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

fn hash_with(params: &Params, secret: &[u8], salt: &SaltString) -> Result<String, CredentialError> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
        .hash_password(secret, salt)
        .map(|h| h.to_string())
        .map_err(|_| CredentialError::InvalidSecret)
}

impl core::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
