//! Ownership guard: may this identity mutate that resource?

use thiserror::Error;

use reading_core::Identity;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden")]
    Forbidden,
}

/// Allow only when the authenticated identity is the target's owner.
///
/// There is no wildcard: identity `0` is compared like any other and owns
/// nothing storage ever created.
///
/// - No IO
/// - No panics
pub fn authorize(request: Identity, target: Identity) -> Result<(), AuthzError> {
    if request == target {
        Ok(())
    } else {
        Err(AuthzError::Forbidden)
    }
}

/// Authorize an update of a persisted resource.
///
/// The caller must own the resource as persisted (`owner`) *and*, when the
/// payload names an owner (`claimed`), must be that owner too. This stops a
/// caller from editing someone else's record and from handing their own
/// record over to someone else in the same request.
pub fn authorize_mutation(
    request: Identity,
    owner: Identity,
    claimed: Option<Identity>,
) -> Result<(), AuthzError> {
    authorize(request, owner)?;
    if let Some(claimed) = claimed {
        authorize(request, claimed)?;
    }
    Ok(())
}
