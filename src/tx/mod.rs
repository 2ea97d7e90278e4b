//! Transaction pipeline
//!
//! The pipeline is split into focused modules:
//! - **errors**: error taxonomy with retryability classification
//! - **instructions**: compute-budget prefix and transfer templates
//! - **builder**: priority-fee-aware transaction planning and assembly
//! - **simulate**: dry-run against cluster state and the send guard
//! - **retry**: send/confirm state machine with backoff resubmission
//! - **bundle**: Jito atomic bundle submission
//!
//! A send flows builder → simulator (guard) → retry manager. Each stage is
//! usable on its own; they share the [`crate::rpc::ClusterRpc`] seam.

pub mod errors;
pub use errors::TxError;

pub mod builder;
pub mod bundle;
pub mod instructions;
pub mod retry;
pub mod simulate;

pub use builder::{
    assemble_signed, BuiltTransaction, PriorityFee, TransactionBuilder, TransactionPlan, TxVersion,
};
pub use bundle::{BundleStatus, BundleTransaction, JitoBundleResult, JitoBundler};
pub use retry::{RetryManager, RetryOptions, SendOutcome};
pub use simulate::{ensure_sendable, TransactionSimulator};
