//! Withdraw Revenue Instruction
//!
//! The vault always holds at least the sum of user deposits; only the
//! surplus (settlement overheads) can leave it through this instruction.

use anchor_lang::prelude::*;

use crate::error::PaymasterError;
use crate::events::RevenueWithdrawn;
use crate::state::{PaymasterConfig, Vault};

#[derive(Accounts)]
pub struct WithdrawRevenue<'info> {
    #[account(
        seeds = [PaymasterConfig::SEED],
        bump = config.bump,
        has_one = authority @ PaymasterError::Unauthorized,
    )]
    pub config: Account<'info, PaymasterConfig>,

    #[account(
        mut,
        seeds = [Vault::SEED],
        bump = config.vault_bump,
    )]
    pub vault: Account<'info, Vault>,

    pub authority: Signer<'info>,

    /// CHECK: any account chosen by the authority.
    #[account(mut)]
    pub recipient: UncheckedAccount<'info>,
}

pub fn handler(ctx: Context<WithdrawRevenue>, amount: u64) -> Result<()> {
    let vault = ctx.accounts.vault.to_account_info();
    let withdrawable = ctx.accounts.config.withdrawable(Vault::funding(&vault)?);
    require!(
        amount > 0 && amount <= withdrawable,
        PaymasterError::InsufficientRevenue
    );

    Vault::pay(&vault, &ctx.accounts.recipient.to_account_info(), amount)?;

    emit!(RevenueWithdrawn {
        authority: ctx.accounts.authority.key(),
        recipient: ctx.accounts.recipient.key(),
        amount,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("Revenue withdrawn: {}", amount);
    Ok(())
}
