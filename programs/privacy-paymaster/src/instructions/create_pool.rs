//! Create Pool Instruction
//!
//! Allocates the next pool id and creates the pool record together with
//! its empty commitment tree. The scope is fixed here for the life of the
//! pool.

use anchor_lang::prelude::*;

use crate::error::PaymasterError;
use crate::events::PoolCreated;
use crate::state::{MerkleTree, PaymasterConfig, Pool};

#[derive(Accounts)]
pub struct CreatePool<'info> {
    #[account(
        mut,
        seeds = [PaymasterConfig::SEED],
        bump = config.bump,
        has_one = authority @ PaymasterError::Unauthorized,
    )]
    pub config: Account<'info, PaymasterConfig>,

    #[account(
        init,
        payer = authority,
        space = Pool::LEN,
        seeds = [Pool::SEED_PREFIX, config.pool_count.to_le_bytes().as_ref()],
        bump
    )]
    pub pool: Box<Account<'info, Pool>>,

    #[account(
        init,
        payer = authority,
        space = MerkleTree::LEN,
        seeds = [MerkleTree::SEED_PREFIX, pool.key().as_ref()],
        bump
    )]
    pub merkle_tree: Box<Account<'info, MerkleTree>>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// # Returns
/// The new pool id.
pub fn handler(ctx: Context<CreatePool>, joining_fee: u64) -> Result<u64> {
    let config = &mut ctx.accounts.config;
    let pool = &mut ctx.accounts.pool;
    let merkle_tree = &mut ctx.accounts.merkle_tree;

    let pool_id = config.next_pool_id()?;
    let pool_address = pool.key();

    pool.initialize(
        pool_id,
        joining_fee,
        &pool_address,
        config.chain_id,
        merkle_tree.key(),
        ctx.bumps.pool,
    )?;
    merkle_tree.initialize(pool_address);

    emit!(PoolCreated {
        pool: pool_address,
        pool_id,
        joining_fee,
        scope: pool.scope,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("Pool created");
    msg!("Pool id: {}", pool_id);
    msg!("Joining fee: {}", joining_fee);

    Ok(pool_id)
}
