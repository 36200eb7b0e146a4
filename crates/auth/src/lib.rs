//! `reading-auth` — authentication and ownership-authorization core.
//!
//! This crate is intentionally decoupled from HTTP and storage: the API layer
//! hands it raw header values and persisted owner ids, and gets back an
//! [`Identity`] or a terminal error.

pub mod claims;
pub mod credential;
pub mod gate;
pub mod ownership;
pub mod token;

pub use claims::{TokenClaims, validate_claims};
pub use credential::{CredentialConfig, CredentialError, CredentialVerifier};
pub use gate::{GateError, authenticate};
pub use ownership::{AuthzError, authorize, authorize_mutation};
pub use reading_core::Identity;
pub use token::{SigningKey, TokenCodec, TokenConfig, TokenConfigError, TokenError};
