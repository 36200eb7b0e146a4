//! Request authentication: raw `Authorization` header in, [`Identity`] out.

use chrono::{DateTime, Utc};
use thiserror::Error;

use reading_core::Identity;

use crate::token::{TokenCodec, TokenError};

/// The single outcome a client sees for any authentication failure.
///
/// Missing header, malformed header and every token failure all collapse into
/// this one variant so a caller cannot probe which check rejected it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    #[error("unauthenticated")]
    Unauthenticated,
}

/// Internal reason for a denial; logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denial {
    MissingHeader,
    MalformedHeader,
    Token(TokenError),
}

impl core::fmt::Display for Denial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Denial::MissingHeader => f.write_str("missing authorization header"),
            Denial::MalformedHeader => f.write_str("malformed authorization header"),
            Denial::Token(e) => core::fmt::Display::fmt(e, f),
        }
    }
}

/// Authenticate a request from its `Authorization` header value.
///
/// - No IO
/// - No panics
/// - `None` means the header was absent or not valid UTF-8
pub fn authenticate(
    codec: &TokenCodec,
    authorization: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Identity, GateError> {
    match resolve(codec, authorization, now) {
        Ok(identity) => Ok(identity),
        Err(denial) => {
            tracing::debug!(reason = %denial, "authentication denied");
            Err(GateError::Unauthenticated)
        }
    }
}

fn resolve(codec: &TokenCodec, authorization: Option<&str>, now: DateTime<Utc>) -> Result<Identity, Denial> {
    let header = authorization.ok_or(Denial::MissingHeader)?;
    let token = bearer_token(header).ok_or(Denial::MalformedHeader)?;
    codec.parse(token, now).map_err(Denial::Token)
}

/// Extract the token from `Bearer <token>`. The scheme is case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}
