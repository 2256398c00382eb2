//! Deterministic merge of local and remote collections

use crate::models::{Quote, ResolutionChoice, Resolutions};

/// Merge `remote` into a copy of `local`.
///
/// Same-id records are overwritten in place with the remote version unless
/// a resolution keeps the local one; remote records without a local
/// counterpart append in input order. Local-only records keep their
/// position and content. Identity is the only dedup key.
#[must_use]
pub fn merge_quotes(local: &[Quote], remote: &[Quote], resolutions: &Resolutions) -> Vec<Quote> {
    let mut merged = local.to_vec();

    for remote_quote in remote {
        match merged.iter().position(|quote| quote.id == remote_quote.id) {
            Some(index) => {
                if resolutions.choice_for(remote_quote.id) == ResolutionChoice::Server {
                    merged[index] = remote_quote.clone();
                }
            }
            None => merged.push(remote_quote.clone()),
        }
    }

    merged
}
