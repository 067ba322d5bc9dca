//! Read-only queries answered through return data.

use anchor_lang::prelude::*;

use crate::error::PaymasterError;
use crate::state::{pda, MemberCredit, MemberLeaf, MerkleTree, Pool, UsageBook};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RootInfo {
    pub root: [u8; 32],
    pub index: u32,
    pub size: u64,
    pub depth: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PoolInfo {
    pub pool_id: u64,
    pub joining_fee: u64,
    pub total_deposits: u64,
    pub scope: [u8; 32],
    pub size: u64,
    pub depth: u8,
}

// ============================================================================
// POOL
// ============================================================================

#[derive(Accounts)]
pub struct PoolView<'info> {
    #[account(has_one = merkle_tree @ PaymasterError::PoolNotFound)]
    pub pool: Box<Account<'info, Pool>>,

    pub merkle_tree: Box<Account<'info, MerkleTree>>,
}

pub fn pool_info_handler(ctx: Context<PoolView>) -> Result<PoolInfo> {
    let pool = &ctx.accounts.pool;
    let tree = &ctx.accounts.merkle_tree;
    Ok(PoolInfo {
        pool_id: pool.pool_id,
        joining_fee: pool.joining_fee,
        total_deposits: pool.total_deposits,
        scope: pool.scope,
        size: tree.size,
        depth: tree.depth,
    })
}

#[derive(Accounts)]
#[instruction(commitment: [u8; 32])]
pub struct MembershipView<'info> {
    pub pool: Box<Account<'info, Pool>>,

    /// CHECK: leaf marker of `commitment`, exists only once admitted.
    #[account(
        seeds = [MemberLeaf::SEED_PREFIX, pool.key().as_ref(), commitment.as_ref()],
        bump,
    )]
    pub member_leaf: UncheckedAccount<'info>,
}

/// Whether `commitment` has been admitted to the pool.
pub fn is_member_handler(ctx: Context<MembershipView>, _commitment: [u8; 32]) -> Result<bool> {
    Ok(pda::is_initialized(
        &ctx.accounts.member_leaf.to_account_info(),
        ctx.program_id,
    ))
}

// ============================================================================
// AVAILABLE CREDIT
// ============================================================================

#[derive(Accounts)]
#[instruction(account: Pubkey)]
pub struct AvailableCredit<'info> {
    #[account(has_one = merkle_tree)]
    pub pool: Box<Account<'info, Pool>>,

    pub merkle_tree: Box<Account<'info, MerkleTree>>,

    /// CHECK: credit PDA of `account`, possibly not created yet.
    #[account(
        seeds = [MemberCredit::SEED_PREFIX, pool.key().as_ref(), account.as_ref()],
        bump,
    )]
    pub member_credit: UncheckedAccount<'info>,
}

/// Credit `account` can still spend in this pool.
///
/// Remaining accounts: the usage PDAs of the member's nullifiers.
pub fn available_credit_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, AvailableCredit<'info>>,
    account: Pubkey,
) -> Result<u64> {
    let credit = MemberCredit::load(
        &ctx.accounts.member_credit.to_account_info(),
        ctx.program_id,
        ctx.accounts.pool.key(),
        account,
        ctx.bumps.member_credit,
    )?;
    let usages = UsageBook::load(ctx.program_id, &credit.nullifiers(), ctx.remaining_accounts)?;
    Ok(credit.available(ctx.accounts.pool.joining_fee, &usages))
}

// ============================================================================
// ROOT HISTORY
// ============================================================================

#[derive(Accounts)]
pub struct RootHistory<'info> {
    pub merkle_tree: Box<Account<'info, MerkleTree>>,
}

/// Most recent root with its history slot.
pub fn latest_root_handler(ctx: Context<RootHistory>) -> Result<RootInfo> {
    let tree = &ctx.accounts.merkle_tree;
    let (root, index) = tree.latest_root_info();
    Ok(RootInfo {
        root,
        index,
        size: tree.size,
        depth: tree.depth,
    })
}

pub fn root_at_handler(ctx: Context<RootHistory>, index: u32) -> Result<Option<[u8; 32]>> {
    Ok(ctx.accounts.merkle_tree.root_at(index))
}

/// Roots a proof may still reference, most recent first.
pub fn valid_roots_handler(ctx: Context<RootHistory>) -> Result<Vec<[u8; 32]>> {
    Ok(ctx.accounts.merkle_tree.valid_roots())
}

pub fn is_known_root_handler(ctx: Context<RootHistory>, root: [u8; 32]) -> Result<bool> {
    Ok(ctx.accounts.merkle_tree.is_known_root(&root))
}

/// History slot still holding `root`, if any.
pub fn find_root_index_handler(ctx: Context<RootHistory>, root: [u8; 32]) -> Result<Option<u32>> {
    Ok(ctx.accounts.merkle_tree.find_root_index(&root))
}
