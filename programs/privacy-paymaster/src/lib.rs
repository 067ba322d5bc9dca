//! Privacy Paymaster
//!
//! Members prepay a joining fee into a pool and later have transaction fees
//! sponsored anonymously: a zero-knowledge membership proof activates a
//! gas credit under a nullifier, and later requests spend that credit
//! without another proof.

use anchor_lang::prelude::*;

pub mod crypto;
pub mod error;
pub mod events;
pub mod instructions;
pub mod sponsorship;
pub mod state;


use instructions::*;
use sponsorship::{SettlementContext, SettlementMode, SponsoredRequest, ValidationResult};

declare_id!("5JhrUmvePkb5HjykwhpwBUsakhc4XPxTgHCfkwxnD8g3");

#[program]
pub mod privacy_paymaster {
    use super::*;

    pub fn initialize_paymaster(
        ctx: Context<InitializePaymaster>,
        entry_point: Pubkey,
        verifier: Pubkey,
        chain_id: u64,
    ) -> Result<()> {
        instructions::initialize_paymaster::handler(ctx, entry_point, verifier, chain_id)
    }

    pub fn create_pool(ctx: Context<CreatePool>, joining_fee: u64) -> Result<u64> {
        instructions::create_pool::handler(ctx, joining_fee)
    }

    pub fn add_member<'info>(
        ctx: Context<'_, '_, '_, 'info, AddMembers<'info>>,
        pool_id: u64,
        commitment: [u8; 32],
        payment: u64,
    ) -> Result<[u8; 32]> {
        instructions::add_member::handler(ctx, pool_id, vec![commitment], payment)
    }

    pub fn add_members<'info>(
        ctx: Context<'_, '_, '_, 'info, AddMembers<'info>>,
        pool_id: u64,
        commitments: Vec<[u8; 32]>,
        payment: u64,
    ) -> Result<[u8; 32]> {
        instructions::add_member::handler(ctx, pool_id, commitments, payment)
    }

    pub fn validate_sponsorship<'info>(
        ctx: Context<'_, '_, '_, 'info, ValidateSponsorship<'info>>,
        request: SponsoredRequest,
        request_id: [u8; 32],
        max_cost: u64,
    ) -> Result<ValidationResult> {
        instructions::validate_sponsorship::handler(ctx, request, request_id, max_cost)
    }

    pub fn settle_sponsorship<'info>(
        ctx: Context<'_, '_, '_, 'info, SettleSponsorship<'info>>,
        mode: SettlementMode,
        context: SettlementContext,
        actual_cost: u64,
        fee_rate: u64,
    ) -> Result<()> {
        instructions::settle_sponsorship::handler(ctx, mode, context, actual_cost, fee_rate)
    }

    pub fn available_credit<'info>(
        ctx: Context<'_, '_, '_, 'info, AvailableCredit<'info>>,
        account: Pubkey,
    ) -> Result<u64> {
        instructions::views::available_credit_handler(ctx, account)
    }

    pub fn pool_info(ctx: Context<PoolView>) -> Result<PoolInfo> {
        instructions::views::pool_info_handler(ctx)
    }

    pub fn is_member(ctx: Context<MembershipView>, commitment: [u8; 32]) -> Result<bool> {
        instructions::views::is_member_handler(ctx, commitment)
    }

    pub fn latest_root(ctx: Context<RootHistory>) -> Result<RootInfo> {
        instructions::views::latest_root_handler(ctx)
    }

    pub fn root_at(ctx: Context<RootHistory>, index: u32) -> Result<Option<[u8; 32]>> {
        instructions::views::root_at_handler(ctx, index)
    }

    pub fn valid_roots(ctx: Context<RootHistory>) -> Result<Vec<[u8; 32]>> {
        instructions::views::valid_roots_handler(ctx)
    }

    pub fn is_known_root(ctx: Context<RootHistory>, root: [u8; 32]) -> Result<bool> {
        instructions::views::is_known_root_handler(ctx, root)
    }

    pub fn find_root_index(ctx: Context<RootHistory>, root: [u8; 32]) -> Result<Option<u32>> {
        instructions::views::find_root_index_handler(ctx, root)
    }

    pub fn update_authority(ctx: Context<UpdateAuthority>, new_authority: Pubkey) -> Result<()> {
        instructions::admin::update_authority::handler(ctx, new_authority)
    }

    pub fn withdraw_revenue(ctx: Context<WithdrawRevenue>, amount: u64) -> Result<()> {
        instructions::admin::withdraw_revenue::handler(ctx, amount)
    }
}
