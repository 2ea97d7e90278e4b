//! Solana client toolkit
//!
//! Library surface for the `solkit` CLI: a priority-fee-aware transaction
//! pipeline (build, simulate, send with retry/confirmation), Jito bundle
//! submission, vanity address and PDA brute-force searches, a token
//! metadata cache, and a file-backed transaction history.

pub mod cache;
pub mod config;
pub mod fees;
pub mod history;
pub mod rpc;
pub mod search;
pub mod tx;
pub mod types;
pub mod wallet;

pub mod test_utils;

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};

#[cfg(test)]
mod tests;
