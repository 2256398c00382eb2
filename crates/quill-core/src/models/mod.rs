//! Shared data models

pub mod conflict;
pub mod quote;

pub use conflict::{Conflict, ConflictKind, ResolutionChoice, Resolutions};
pub use quote::{default_quotes, Quote, QuoteId, QuoteSource};
