//! Provider selection.
//!
//! Picks one provider given the caller's credentials and the set of
//! providers already attempted this call. Pure and deterministic - the
//! same inputs always yield the same provider.

use std::collections::HashSet;

use crate::credentials::CredentialSet;
use crate::types::ProviderKind;

/// Selects the next provider to attempt.
///
/// The preferred provider wins when it has a usable secret and has not
/// been excluded; otherwise the fixed priority order
/// ([`ProviderKind::ALL`]) is walked and the first usable, non-excluded
/// member is returned. `None` is a normal outcome meaning no candidate
/// remains - the caller decides whether that is a configuration error
/// (first pick) or exhaustion (after fallback).
pub fn select_provider(
    credentials: &CredentialSet,
    excluding: &HashSet<ProviderKind>,
) -> Option<ProviderKind> {
    if let Some(preferred) = credentials.preferred() {
        if !excluding.contains(&preferred) && credentials.is_usable(preferred) {
            return Some(preferred);
        }
    }

    ProviderKind::ALL
        .into_iter()
        .find(|kind| !excluding.contains(kind) && credentials.is_usable(*kind))
}
