//! Events for the privacy paymaster

use anchor_lang::prelude::*;

#[event]
pub struct PaymasterInitialized {
    pub config: Pubkey,
    pub authority: Pubkey,
    pub entry_point: Pubkey,
    pub verifier: Pubkey,
    pub chain_id: u64,
    pub timestamp: i64,
}

#[event]
pub struct PoolCreated {
    pub pool: Pubkey,
    pub pool_id: u64,
    pub joining_fee: u64,
    pub scope: [u8; 32],
    pub timestamp: i64,
}

#[event]
pub struct MemberAdded {
    pub pool_id: u64,
    pub commitment: [u8; 32],
    pub leaf_index: u64,
    pub merkle_root: [u8; 32],
    pub timestamp: i64,
}

#[event]
pub struct CreditActivated {
    pub pool_id: u64,
    pub account: Pubkey,
    pub nullifier: [u8; 32],
    pub slot: u8,
    /// Compact credit word after activation
    pub credit_state: u8,
}

#[event]
pub struct SponsorshipSettled {
    pub account: Pubkey,
    pub request_id: [u8; 32],
    pub pool_id: u64,
    pub actual_cost: u64,
    pub payout: u64,
    pub total_charged: u64,
    pub unconsumed: u64,
    pub reverted: bool,
    pub timestamp: i64,
}

#[event]
pub struct AuthorityTransferred {
    pub config: Pubkey,
    pub old_authority: Pubkey,
    pub new_authority: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct RevenueWithdrawn {
    pub authority: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}
