//! Update Authority Instruction
//!
//! Transfer paymaster admin rights to a new address.
//! Only callable by current authority.

use anchor_lang::prelude::*;

use crate::error::PaymasterError;
use crate::events::AuthorityTransferred;
use crate::state::PaymasterConfig;

#[derive(Accounts)]
pub struct UpdateAuthority<'info> {
    #[account(
        mut,
        seeds = [PaymasterConfig::SEED],
        bump = config.bump,
        has_one = authority @ PaymasterError::Unauthorized,
    )]
    pub config: Account<'info, PaymasterConfig>,

    pub authority: Signer<'info>,
}

pub fn handler(ctx: Context<UpdateAuthority>, new_authority: Pubkey) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let old_authority = config.authority;

    require!(
        new_authority != old_authority && new_authority != Pubkey::default(),
        PaymasterError::InvalidAuthority
    );

    config.transfer_authority(new_authority);

    emit!(AuthorityTransferred {
        config: config.key(),
        old_authority,
        new_authority,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("Authority transferred");
    msg!("Old authority: {}", old_authority);
    msg!("New authority: {}", new_authority);

    Ok(())
}
