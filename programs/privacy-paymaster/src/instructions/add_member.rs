//! Add Member Instructions
//!
//! Admits identity commitments into a pool. The caller pays the joining fee
//! once per commitment; the payment goes to the vault and is tracked as the
//! pool's deposit, which later funds its members' sponsored transactions.
//!
//! # Remaining Accounts
//! One `MemberLeaf` PDA per commitment, `[b"member", pool, commitment]`,
//! in any order. They must not exist yet; they are created here and make a
//! second admission of the same commitment fail.
//!
//! # Commitment Model
//! The commitment is computed off-chain by the member and is opaque here.
//! It only has to be a nonzero BN254 scalar field element.

use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Transfer};

use crate::error::PaymasterError;
use crate::events::MemberAdded;
use crate::state::{MerkleTree, PaymasterConfig, PdaLeafRegistry, Pool, Vault, MAX_BATCH_SIZE};

/// Accounts for add_member and add_members.
#[derive(Accounts)]
#[instruction(pool_id: u64)]
pub struct AddMembers<'info> {
    #[account(
        mut,
        seeds = [PaymasterConfig::SEED],
        bump = config.bump,
    )]
    pub config: Account<'info, PaymasterConfig>,

    /// Receives the joining fees.
    #[account(
        mut,
        seeds = [Vault::SEED],
        bump = config.vault_bump,
    )]
    pub vault: Account<'info, Vault>,

    #[account(
        mut,
        seeds = [Pool::SEED_PREFIX, pool_id.to_le_bytes().as_ref()],
        bump = pool.bump,
        has_one = merkle_tree @ PaymasterError::PoolNotFound,
    )]
    pub pool: Box<Account<'info, Pool>>,

    #[account(mut)]
    pub merkle_tree: Box<Account<'info, MerkleTree>>,

    /// Pays the joining fees and leaf account rent.
    #[account(mut)]
    pub payer: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Handler for add_member and add_members.
///
/// # Arguments
/// * `commitments` - 1 to `MAX_BATCH_SIZE` commitments
/// * `payment` - must equal `joining_fee × commitments.len()`
///
/// # Returns
/// The tree root after the last insertion.
pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, AddMembers<'info>>,
    _pool_id: u64,
    commitments: Vec<[u8; 32]>,
    payment: u64,
) -> Result<[u8; 32]> {
    require!(
        !commitments.is_empty() && commitments.len() <= MAX_BATCH_SIZE,
        PaymasterError::InvalidBatchSize
    );
    require!(
        payment == ctx.accounts.pool.required_payment(commitments.len())?,
        PaymasterError::IncorrectPayment
    );

    // ========== PAYMENT ==========

    system_program::transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            Transfer {
                from: ctx.accounts.payer.to_account_info(),
                to: ctx.accounts.vault.to_account_info(),
            },
        ),
        payment,
    )?;

    ctx.accounts.pool.credit_deposits(payment)?;
    ctx.accounts.config.record_deposit(payment)?;

    // ========== MERKLE TREE UPDATE ==========

    let payer = ctx.accounts.payer.to_account_info();
    let system_program = ctx.accounts.system_program.to_account_info();
    let pool_key = ctx.accounts.pool.key();
    let mut registry = PdaLeafRegistry::new(
        ctx.program_id,
        pool_key,
        ctx.remaining_accounts,
        &payer,
        &system_program,
    );

    let pool = &ctx.accounts.pool;
    let merkle_tree = &mut ctx.accounts.merkle_tree;
    let first_index = merkle_tree.size;
    let root = pool.admit(merkle_tree, &commitments, &mut registry)?;

    // ========== EVENT EMISSION ==========

    let timestamp = Clock::get()?.unix_timestamp;
    for (offset, commitment) in commitments.iter().enumerate() {
        emit!(MemberAdded {
            pool_id: pool.pool_id,
            commitment: *commitment,
            leaf_index: first_index + offset as u64,
            merkle_root: root,
            timestamp,
        });
        // Only log first 8 bytes for privacy
        msg!("Member added: {:?}", &commitment[..8]);
    }
    msg!("Pool {} size: {}", pool.pool_id, merkle_tree.size);

    Ok(root)
}
