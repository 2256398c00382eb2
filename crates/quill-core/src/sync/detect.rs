//! Conflict detection between local and remote collections

use crate::models::{Conflict, ConflictKind, Quote};

/// Compare collections by identity and flag same-id records whose text or
/// category differ.
///
/// Output follows `remote` input order. Remote records with no local
/// counterpart are additions (handled by the merge), not conflicts, and
/// local-only records are never flagged.
#[must_use]
pub fn detect_conflicts(local: &[Quote], remote: &[Quote]) -> Vec<Conflict> {
    remote
        .iter()
        .filter_map(|remote_quote| {
            let local_match = local.iter().find(|quote| quote.id == remote_quote.id)?;
            if local_match.equivalent(remote_quote) {
                None
            } else {
                Some(Conflict {
                    id: remote_quote.id,
                    local: local_match.clone(),
                    remote: remote_quote.clone(),
                    kind: ConflictKind::Modified,
                })
            }
        })
        .collect()
}
