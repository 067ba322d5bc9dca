//! Initialize Paymaster Instruction

use anchor_lang::prelude::*;

use crate::error::PaymasterError;
use crate::events::PaymasterInitialized;
use crate::state::{PaymasterConfig, Vault};

#[derive(Accounts)]
pub struct InitializePaymaster<'info> {
    #[account(
        init,
        payer = authority,
        space = PaymasterConfig::LEN,
        seeds = [PaymasterConfig::SEED],
        bump
    )]
    pub config: Account<'info, PaymasterConfig>,

    #[account(
        init,
        payer = authority,
        space = Vault::LEN,
        seeds = [Vault::SEED],
        bump
    )]
    pub vault: Account<'info, Vault>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<InitializePaymaster>,
    entry_point: Pubkey,
    verifier: Pubkey,
    chain_id: u64,
) -> Result<()> {
    require!(
        entry_point != Pubkey::default() && verifier != Pubkey::default(),
        PaymasterError::InvalidAuthority
    );

    let config = &mut ctx.accounts.config;
    config.initialize(
        ctx.accounts.authority.key(),
        entry_point,
        verifier,
        chain_id,
        ctx.bumps.config,
        ctx.bumps.vault,
    );
    ctx.accounts.vault.bump = ctx.bumps.vault;

    emit!(PaymasterInitialized {
        config: config.key(),
        authority: config.authority,
        entry_point,
        verifier,
        chain_id,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("Privacy paymaster initialized");
    msg!("Entry point: {}", entry_point);
    msg!("Verifier: {}", verifier);
    Ok(())
}
