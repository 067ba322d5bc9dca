//! Validate Sponsorship Instruction
//!
//! First phase of the sponsorship protocol, called by the entry point
//! before the sponsored request executes. Leaves every account untouched
//! and answers with a [`ValidationResult`] through return data.
//!
//! # Remaining Accounts
//! `NullifierUsage` PDAs for every nullifier held by the member and, on the
//! activation route, for the proof's nullifier. Uncreated PDAs are fine
//! and read as zero usage.

use anchor_lang::prelude::*;

use crate::crypto::verifier::VerifierProgram;
use crate::error::PaymasterError;
use crate::sponsorship::{
    validate_request, SponsoredRequest, SponsorshipRoute, ValidationOutcome, ValidationResult,
    ValidationState,
};
use crate::state::{MemberCredit, MerkleTree, PaymasterConfig, Pool, UsageBook, Vault};

#[derive(Accounts)]
#[instruction(request: SponsoredRequest)]
pub struct ValidateSponsorship<'info> {
    #[account(
        seeds = [PaymasterConfig::SEED],
        bump = config.bump,
        has_one = entry_point @ PaymasterError::Unauthorized,
        has_one = verifier @ PaymasterError::Unauthorized,
    )]
    pub config: Account<'info, PaymasterConfig>,

    pub entry_point: Signer<'info>,

    #[account(
        seeds = [Vault::SEED],
        bump = config.vault_bump,
    )]
    pub vault: Account<'info, Vault>,

    /// Pool named by the paymaster data; the id is compared during validation.
    #[account(has_one = merkle_tree @ PaymasterError::PoolNotFound)]
    pub pool: Box<Account<'info, Pool>>,

    pub merkle_tree: Box<Account<'info, MerkleTree>>,

    /// CHECK: credit PDA of the request sender, possibly not created yet;
    /// address enforced by seeds, contents checked on read.
    #[account(
        seeds = [MemberCredit::SEED_PREFIX, pool.key().as_ref(), request.sender.as_ref()],
        bump,
    )]
    pub member_credit: UncheckedAccount<'info>,

    /// CHECK: address enforced by `has_one` on config.
    pub verifier: UncheckedAccount<'info>,
}

/// # Arguments
/// * `request` - request whose fee is to be sponsored
/// * `request_id` - entry point's identifier for the request
/// * `max_cost` - upper bound the entry point may charge
pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, ValidateSponsorship<'info>>,
    request: SponsoredRequest,
    request_id: [u8; 32],
    max_cost: u64,
) -> Result<ValidationResult> {
    let program_id = ctx.program_id;
    let accounts = &ctx.accounts;

    // ========== DECODE ==========

    let route = SponsorshipRoute::decode(&request.paymaster_data, program_id)?;

    let credit = MemberCredit::load(
        &accounts.member_credit.to_account_info(),
        program_id,
        accounts.pool.key(),
        request.sender,
        ctx.bumps.member_credit,
    )?;

    let mut nullifiers = credit.nullifiers();
    if let SponsorshipRoute::Activation(payload) = &route {
        nullifiers.push(payload.proof.nullifier);
    }
    let usages = UsageBook::load(program_id, &nullifiers, ctx.remaining_accounts)?;

    // ========== VALIDATION ==========

    let state = ValidationState {
        program_id,
        chain_id: accounts.config.chain_id,
        pool: &accounts.pool,
        tree: &accounts.merkle_tree,
        credit: &credit,
        usages: &usages,
        funding: Vault::funding(&accounts.vault.to_account_info())?,
    };
    let verifier_info = accounts.verifier.to_account_info();
    let verifier = VerifierProgram::new(&verifier_info);

    let result = validate_request(&state, &verifier, &request, &route, request_id, max_cost)?;

    match (&route, result.outcome) {
        (_, ValidationOutcome::WouldFail) => msg!("Sponsorship would fail"),
        (SponsorshipRoute::Activation(_), ValidationOutcome::Valid) => {
            msg!("Activation validated")
        }
        (SponsorshipRoute::Cached(_), ValidationOutcome::Valid) => msg!("Cached credit validated"),
    }
    msg!("Pool id: {}", route.pool_id());
    msg!("Max cost: {}", max_cost);

    Ok(result)
}
