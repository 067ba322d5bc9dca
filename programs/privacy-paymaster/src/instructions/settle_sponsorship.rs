//! Settle Sponsorship Instruction
//!
//! Second phase of the sponsorship protocol, called by the entry point
//! exactly once after the sponsored request has executed. The actual cost,
//! capped at the context's charge ceiling, is paid from the vault to the
//! entry point's beneficiary; the overhead share stays in the vault as
//! paymaster revenue.
//!
//! # Remaining Accounts
//! `NullifierUsage` PDAs for every nullifier held by the member and, for an
//! activation context, for the context's nullifier. Missing records are
//! created with `payer` funding the rent.

use anchor_lang::prelude::*;

use crate::error::PaymasterError;
use crate::events::{CreditActivated, SponsorshipSettled};
use crate::sponsorship::{settle, SettlementContext, SettlementLedger, SettlementMode};
use crate::state::{MemberCredit, PaymasterConfig, Pool, UsageBook, Vault};

#[derive(Accounts)]
#[instruction(mode: SettlementMode, context: SettlementContext)]
pub struct SettleSponsorship<'info> {
    #[account(
        mut,
        seeds = [PaymasterConfig::SEED],
        bump = config.bump,
        has_one = entry_point @ PaymasterError::Unauthorized,
    )]
    pub config: Account<'info, PaymasterConfig>,

    pub entry_point: Signer<'info>,

    #[account(
        mut,
        seeds = [Vault::SEED],
        bump = config.vault_bump,
    )]
    pub vault: Account<'info, Vault>,

    #[account(
        mut,
        seeds = [Pool::SEED_PREFIX, context.pool_id().to_le_bytes().as_ref()],
        bump = pool.bump,
    )]
    pub pool: Box<Account<'info, Pool>>,

    #[account(
        init_if_needed,
        payer = payer,
        space = MemberCredit::LEN,
        seeds = [MemberCredit::SEED_PREFIX, pool.key().as_ref(), context.account().as_ref()],
        bump,
    )]
    pub member_credit: Box<Account<'info, MemberCredit>>,

    /// CHECK: receives the actual cost; chosen by the entry point.
    #[account(mut)]
    pub beneficiary: UncheckedAccount<'info>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// # Arguments
/// * `mode` - whether the sponsored request succeeded or reverted
/// * `context` - context returned by validation
/// * `actual_cost` - lamports the request actually cost
/// * `fee_rate` - price per unit applied to the settlement overhead
pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, SettleSponsorship<'info>>,
    mode: SettlementMode,
    context: SettlementContext,
    actual_cost: u64,
    fee_rate: u64,
) -> Result<()> {
    let program_id = ctx.program_id;

    // First activation of this member in this pool
    if ctx.accounts.member_credit.account == Pubkey::default() {
        let record = MemberCredit::empty(
            ctx.accounts.pool.key(),
            context.account(),
            ctx.bumps.member_credit,
        );
        ctx.accounts.member_credit.set_inner(record);
    }

    let mut nullifiers = ctx.accounts.member_credit.nullifiers();
    nullifiers.extend(context.nullifier());
    let mut usages = UsageBook::load(program_id, &nullifiers, ctx.remaining_accounts)?;

    // ========== ACCOUNTING ==========

    let receipt = {
        let accounts = &mut *ctx.accounts;
        let mut ledger = SettlementLedger {
            config: &mut accounts.config,
            pool: &mut accounts.pool,
            credit: &mut accounts.member_credit,
            usages: &mut usages,
        };
        settle(&mut ledger, &context, actual_cost, fee_rate)?
    };

    usages.persist(
        program_id,
        ctx.remaining_accounts,
        &ctx.accounts.payer.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
    )?;

    // ========== PAYOUT ==========

    Vault::pay(
        &ctx.accounts.vault.to_account_info(),
        &ctx.accounts.beneficiary.to_account_info(),
        receipt.payout,
    )?;

    // ========== EVENT EMISSION ==========

    let credit = &ctx.accounts.member_credit;
    if let (Some(slot), Some(nullifier)) = (receipt.slot, context.nullifier()) {
        emit!(CreditActivated {
            pool_id: context.pool_id(),
            account: context.account(),
            nullifier,
            slot,
            credit_state: credit.state.encode(),
        });
        msg!("Credit activated in slot {}", slot);
    }

    emit!(SponsorshipSettled {
        account: context.account(),
        request_id: context.request_id(),
        pool_id: context.pool_id(),
        actual_cost,
        payout: receipt.payout,
        total_charged: receipt.total_charged,
        unconsumed: receipt.unconsumed,
        reverted: mode == SettlementMode::Reverted,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("Sponsorship settled ({:?})", mode);
    msg!("Actual cost: {}", actual_cost);
    msg!("Payout: {}", receipt.payout);
    msg!("Total charged: {}", receipt.total_charged);
    msg!("Credit state: {:#07b}", credit.state.encode());

    Ok(())
}
