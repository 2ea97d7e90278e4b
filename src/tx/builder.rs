//! Priority-fee-aware transaction building
//!
//! The builder collects a fee payer, payload instructions, and fee
//! configuration, resolves the priority fee (manual value or speed preset),
//! and produces either a [`TransactionPlan`] for the retry manager to
//! assemble per attempt, or a fully signed transaction for one-shot use.

use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::{v0, Message, VersionedMessage},
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, VersionedTransaction},
};
use std::sync::Arc;
use tracing::debug;

use super::errors::TxError;
use super::instructions::{compute_budget_prefix, sanity_check_order};
use crate::fees::PriorityFeeCalculator;
use crate::rpc::ClusterRpc;
use crate::types::FeeSpeed;
use crate::wallet::TransactionSigner;

/// Priority fee selection: an explicit per-CU price or a speed preset
/// resolved against recent cluster fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityFee {
    Manual { micro_lamports: u64 },
    Speed(FeeSpeed),
}

impl Default for PriorityFee {
    fn default() -> Self {
        Self::Speed(FeeSpeed::Normal)
    }
}

/// Target transaction format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxVersion {
    #[default]
    Legacy,
    V0,
}

/// Resolved, blockhash-independent description of a transaction.
///
/// `instructions` is the complete ordered list including the
/// compute-budget prefix. The retry manager assembles and signs a fresh
/// transaction from a plan on every submission.
#[derive(Debug, Clone)]
pub struct TransactionPlan {
    pub fee_payer: Pubkey,
    pub version: TxVersion,
    pub instructions: Vec<Instruction>,
    pub priority_fee_micro_lamports: u64,
    pub compute_unit_limit: Option<u32>,
}

/// A signed transaction in its target format
#[derive(Debug, Clone)]
pub enum BuiltTransaction {
    Legacy(Transaction),
    Versioned(VersionedTransaction),
}

impl BuiltTransaction {
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Self::Legacy(tx) => tx.signatures.first(),
            Self::Versioned(tx) => tx.signatures.first(),
        }
    }

    /// Wire form for broadcast; legacy transactions are wrapped losslessly.
    pub fn to_versioned(&self) -> VersionedTransaction {
        match self {
            Self::Legacy(tx) => VersionedTransaction::from(tx.clone()),
            Self::Versioned(tx) => tx.clone(),
        }
    }
}

/// Assemble and sign a transaction from a plan against a blockhash.
///
/// The signer must be the plan's fee payer; a single-signer transaction is
/// produced (the only shape this toolkit builds).
pub fn assemble_signed(
    plan: &TransactionPlan,
    blockhash: Hash,
    signer: &dyn TransactionSigner,
) -> Result<BuiltTransaction, TxError> {
    if signer.pubkey() != plan.fee_payer {
        return Err(TxError::signing(format!(
            "signer {} does not match fee payer {}",
            signer.pubkey(),
            plan.fee_payer
        )));
    }
    match plan.version {
        TxVersion::Legacy => {
            let message = Message::new_with_blockhash(
                &plan.instructions,
                Some(&plan.fee_payer),
                &blockhash,
            );
            let signature = signer.sign_message(&message.serialize());
            Ok(BuiltTransaction::Legacy(Transaction {
                signatures: vec![signature],
                message,
            }))
        }
        TxVersion::V0 => {
            let message = v0::Message::try_compile(&plan.fee_payer, &plan.instructions, &[], blockhash)
                .map_err(|e| TxError::Compile(e.to_string()))?;
            let message = VersionedMessage::V0(message);
            let signature = signer.sign_message(&message.serialize());
            Ok(BuiltTransaction::Versioned(VersionedTransaction {
                signatures: vec![signature],
                message,
            }))
        }
    }
}

/// Assembles instructions into a signable transaction with compute-budget
/// and priority-fee instructions attached.
pub struct TransactionBuilder {
    rpc: Arc<dyn ClusterRpc>,
    fee_payer: Option<Pubkey>,
    instructions: Vec<Instruction>,
    priority_fee: PriorityFee,
    compute_unit_limit: Option<u32>,
    version: TxVersion,
}

impl TransactionBuilder {
    pub fn new(rpc: Arc<dyn ClusterRpc>) -> Self {
        Self {
            rpc,
            fee_payer: None,
            instructions: Vec::new(),
            priority_fee: PriorityFee::default(),
            compute_unit_limit: None,
            version: TxVersion::default(),
        }
    }

    pub fn fee_payer(mut self, payer: Pubkey) -> Self {
        self.fee_payer = Some(payer);
        self
    }

    pub fn instruction(mut self, ix: Instruction) -> Self {
        self.instructions.push(ix);
        self
    }

    pub fn instructions(mut self, ixs: impl IntoIterator<Item = Instruction>) -> Self {
        self.instructions.extend(ixs);
        self
    }

    pub fn priority_fee(mut self, fee: PriorityFee) -> Self {
        self.priority_fee = fee;
        self
    }

    pub fn compute_unit_limit(mut self, limit: u32) -> Self {
        self.compute_unit_limit = Some(limit);
        self
    }

    pub fn version(mut self, version: TxVersion) -> Self {
        self.version = version;
        self
    }

    /// Resolve the fee and produce the final instruction list.
    ///
    /// Validation failures (no fee payer, no instructions) are synchronous
    /// and happen before the fee lookup.
    pub async fn plan(&self) -> Result<TransactionPlan, TxError> {
        let fee_payer = self
            .fee_payer
            .ok_or_else(|| TxError::validation("fee payer is required"))?;
        if self.instructions.is_empty() {
            return Err(TxError::validation("instruction list is empty"));
        }

        let micro_lamports = match self.priority_fee {
            PriorityFee::Manual { micro_lamports } => micro_lamports,
            PriorityFee::Speed(speed) => {
                let calculator = PriorityFeeCalculator::new(Arc::clone(&self.rpc));
                calculator.fee_for_speed(speed).await
            }
        };
        debug!(
            micro_lamports,
            cu_limit = ?self.compute_unit_limit,
            ix_count = self.instructions.len(),
            "resolved transaction plan"
        );

        let mut instructions = compute_budget_prefix(self.compute_unit_limit, micro_lamports);
        instructions.extend(self.instructions.iter().cloned());
        sanity_check_order(&instructions)?;

        Ok(TransactionPlan {
            fee_payer,
            version: self.version,
            instructions,
            priority_fee_micro_lamports: micro_lamports,
            compute_unit_limit: self.compute_unit_limit,
        })
    }

    /// Plan, fetch a recent blockhash, and sign.
    ///
    /// A blockhash fetch failure propagates as the underlying RPC error.
    pub async fn build(&self, signer: &dyn TransactionSigner) -> Result<BuiltTransaction, TxError> {
        let plan = self.plan().await?;
        let blockhash = self.rpc.latest_blockhash().await?;
        assemble_signed(&plan, blockhash, signer)
    }
}
