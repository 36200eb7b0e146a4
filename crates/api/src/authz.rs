//! Handler-side ownership checks.
//!
//! Thin adapters over `reading_auth::ownership` that log the denial and map it
//! to an HTTP error. The owner ids come from storage or the request path; the
//! checks themselves never do IO.

use reading_auth::{authorize, authorize_mutation};
use reading_core::Identity;

use crate::app::errors::ApiError;
use crate::context::AuthContext;

/// The caller must be `owner` (e.g. the `:id` of `/authors/:id`).
pub fn require_owner(ctx: &AuthContext, owner: Identity) -> Result<(), ApiError> {
    authorize(ctx.identity(), owner).map_err(|e| {
        tracing::info!(identity = %ctx.identity(), %owner, "ownership check failed");
        ApiError::from(e)
    })
}

/// The caller must own the persisted record and, if the payload names an
/// owner, be that owner too.
pub fn require_mutation(
    ctx: &AuthContext,
    owner: Identity,
    claimed: Option<Identity>,
) -> Result<(), ApiError> {
    authorize_mutation(ctx.identity(), owner, claimed).map_err(|e| {
        tracing::info!(
            identity = %ctx.identity(),
            %owner,
            claimed = ?claimed,
            "ownership check failed"
        );
        ApiError::from(e)
    })
}
