//! Conflict and resolution models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::quote::{Quote, QuoteId};

/// How a conflict came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Same-id records with differing text or category
    Modified,
}

/// A same-identity disagreement between the local and remote collections.
///
/// Produced per sync attempt and discarded once a resolution is applied or
/// the sync is abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Shared record identity
    pub id: QuoteId,
    /// The local side of the disagreement
    pub local: Quote,
    /// The remote side of the disagreement
    pub remote: Quote,
    /// Conflict classification
    pub kind: ConflictKind,
}

/// Which side's data wins a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionChoice {
    /// Keep the local record unchanged
    Local,
    /// Overwrite with the remote record
    Server,
}

/// Per-conflict choices supplied by an external actor once conflicts are
/// surfaced. A conflict without an entry resolves to the server version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolutions(HashMap<QuoteId, ResolutionChoice>);

impl Resolutions {
    /// An empty resolution set (every conflict resolves to server).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a choice for a conflict id.
    pub fn insert(&mut self, id: QuoteId, choice: ResolutionChoice) {
        self.0.insert(id, choice);
    }

    /// The effective choice for `id`, defaulting to server.
    #[must_use]
    pub fn choice_for(&self, id: QuoteId) -> ResolutionChoice {
        self.0
            .get(&id)
            .copied()
            .unwrap_or(ResolutionChoice::Server)
    }

    /// Whether any explicit choices were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(QuoteId, ResolutionChoice)> for Resolutions {
    fn from_iter<I: IntoIterator<Item = (QuoteId, ResolutionChoice)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
