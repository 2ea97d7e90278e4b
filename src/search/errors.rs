//! Error types for the search tools

use thiserror::Error;

/// Validation errors raised before a search starts.
///
/// All of these are synchronous; a constructed search never fails, it only
/// finishes with or without a result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("Pattern is empty; provide a prefix and/or suffix")]
    EmptyPattern,

    #[error("Character '{0}' is not part of the Base58 address alphabet")]
    InvalidCharacter(char),

    #[error("Expected difficulty {expected:.0} exceeds the ceiling {ceiling:.0}; shorten the pattern")]
    DifficultyCeiling { expected: f64, ceiling: f64 },

    #[error("No seeds provided")]
    NoSeeds,

    #[error("Too many seeds: {0} (at most 15 before the bump seed)")]
    TooManySeeds(usize),

    #[error("Seed '{0}' exceeds the 32-byte seed limit")]
    SeedTooLong(String),

    #[error("Invalid seed range: min {min} > max {max}")]
    InvalidRange { min: u64, max: u64 },

    #[error("Unparseable seed spec '{0}' (expected 'str:<text>' or 'range:<min>:<max>')")]
    BadSeedSpec(String),

    #[error("Candidate space of {count} combinations exceeds the ceiling {ceiling}")]
    TooManyCandidates { count: u128, ceiling: u128 },
}
