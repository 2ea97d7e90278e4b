//! CPU-bound brute-force searches
//!
//! Two search loops share one control surface: validate up front, run on
//! dedicated worker threads, report [`crate::types::SearchProgress`]
//! through a bounded channel, stop cooperatively through an atomic flag.
//!
//! - **vanity**: random keypair generation matched against a Base58
//!   prefix/suffix pattern
//! - **pda**: exhaustive enumeration of seed combinations derived into
//!   program addresses

pub mod errors;
pub mod pattern;
pub mod pda;
pub mod progress;
pub mod vanity;

pub use errors::SearchError;
pub use pattern::PatternMatcher;
pub use pda::{PdaBruteForcer, PdaOptions, PdaResult, Seed};
pub use progress::StopFlag;
pub use vanity::{VanityGenerator, VanityOptions, VanityResult};
