use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reading_core::Identity;

use crate::token::TokenError;

/// Signed claim set carried by an access token.
///
/// Timestamps travel as whole seconds since the epoch (`iat`/`exp`), so a
/// decoded claim set compares equal to the one that was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the identity the token asserts.
    pub sub: Identity,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

/// Deterministically validate the time window of decoded claims.
///
/// Note: this validates the *claims* only. Callers must have verified the
/// signature before trusting anything in here.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenError::Malformed);
    }
    if now >= claims.expires_at {
        return Err(TokenError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn claims() -> TokenClaims {
        let iat = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        TokenClaims {
            sub: Identity::new(42),
            issued_at: iat,
            expires_at: iat + Duration::hours(1),
        }
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let c = claims();
        assert_eq!(validate_claims(&c, c.expires_at - Duration::seconds(1)), Ok(()));
        assert_eq!(validate_claims(&c, c.expires_at), Err(TokenError::Expired));
    }

    #[test]
    fn inverted_window_is_malformed() {
        let mut c = claims();
        c.expires_at = c.issued_at;
        assert_eq!(validate_claims(&c, c.issued_at), Err(TokenError::Malformed));
    }

    #[test]
    fn wire_names_are_compact() {
        let json = serde_json::to_value(claims()).unwrap();
        assert_eq!(json["sub"], 42);
        assert_eq!(json["iat"], 1_704_110_400);
        assert_eq!(json["exp"], 1_704_114_000);
    }
}
