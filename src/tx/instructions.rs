//! Instruction templates and compute-budget handling
//!
//! Compute-budget instructions must form a prefix of the instruction list:
//! set-compute-unit-limit (optional), then set-compute-unit-price, then the
//! payload instructions in caller order.

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction, instruction::Instruction, pubkey::Pubkey,
    system_instruction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};

use super::errors::TxError;

// Compute-budget instruction discriminators
const SET_COMPUTE_UNIT_LIMIT: u8 = 2;
const SET_COMPUTE_UNIT_PRICE: u8 = 3;

/// Compute-budget prefix for a plan: optional CU limit, then CU price
pub fn compute_budget_prefix(cu_limit: Option<u32>, cu_price_micro_lamports: u64) -> Vec<Instruction> {
    let mut prefix = Vec::with_capacity(2);
    if let Some(limit) = cu_limit {
        prefix.push(ComputeBudgetInstruction::set_compute_unit_limit(limit));
    }
    prefix.push(ComputeBudgetInstruction::set_compute_unit_price(
        cu_price_micro_lamports,
    ));
    prefix
}

/// SOL transfer template
pub fn sol_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Result<Instruction, TxError> {
    if lamports == 0 {
        return Err(TxError::validation("transfer amount must be positive"));
    }
    Ok(system_instruction::transfer(from, to, lamports))
}

/// SPL token transfer template: idempotent recipient-ATA creation followed
/// by a checked transfer from the owner's ATA.
pub fn spl_token_transfer(
    owner: &Pubkey,
    mint: &Pubkey,
    recipient: &Pubkey,
    amount: u64,
    decimals: u8,
) -> Result<Vec<Instruction>, TxError> {
    if amount == 0 {
        return Err(TxError::validation("transfer amount must be positive"));
    }
    let source = get_associated_token_address(owner, mint);
    let destination = get_associated_token_address(recipient, mint);
    let create_ata =
        create_associated_token_account_idempotent(owner, recipient, mint, &spl_token::id());
    let transfer = spl_token::instruction::transfer_checked(
        &spl_token::id(),
        &source,
        mint,
        &destination,
        owner,
        &[],
        amount,
        decimals,
    )
    .map_err(|e| TxError::validation(format!("token transfer instruction: {e}")))?;
    Ok(vec![create_ata, transfer])
}

/// Verify the compute-budget instructions form a prefix of the list
pub fn sanity_check_order(instructions: &[Instruction]) -> Result<(), TxError> {
    let budget_program = solana_sdk::compute_budget::id();
    let payload_start = instructions
        .iter()
        .position(|ix| ix.program_id != budget_program)
        .unwrap_or(instructions.len());
    if let Some(stray) = instructions[payload_start..]
        .iter()
        .find(|ix| ix.program_id == budget_program)
    {
        return Err(TxError::validation(format!(
            "compute-budget instruction after payload start (data {:?})",
            stray.data.first()
        )));
    }
    Ok(())
}

/// Decode a set-compute-unit-price instruction back to micro-lamports
pub fn decode_compute_unit_price(ix: &Instruction) -> Option<u64> {
    if ix.program_id != solana_sdk::compute_budget::id() {
        return None;
    }
    match ix.data.split_first() {
        Some((&SET_COMPUTE_UNIT_PRICE, rest)) if rest.len() >= 8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&rest[..8]);
            Some(u64::from_le_bytes(bytes))
        }
        _ => None,
    }
}

/// Decode a set-compute-unit-limit instruction back to units
pub fn decode_compute_unit_limit(ix: &Instruction) -> Option<u32> {
    if ix.program_id != solana_sdk::compute_budget::id() {
        return None;
    }
    match ix.data.split_first() {
        Some((&SET_COMPUTE_UNIT_LIMIT, rest)) if rest.len() >= 4 => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&rest[..4]);
            Some(u32::from_le_bytes(bytes))
        }
        _ => None,
    }
}
