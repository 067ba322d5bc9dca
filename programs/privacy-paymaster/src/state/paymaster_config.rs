//! Paymaster configuration and vault accounts
//!
//! Stores the global configuration: who administers the paymaster, which
//! entry point may drive validation and settlement, which program verifies
//! membership proofs, and the aggregate of user deposits held by the vault.

use anchor_lang::prelude::*;

use crate::error::PaymasterError;

/// Global paymaster configuration.
///
/// PDA Seeds: `[b"paymaster"]`
#[account]
pub struct PaymasterConfig {
    /// Admin - creates pools, withdraws revenue, transfers authority
    pub authority: Pubkey,

    /// Only signer allowed to validate and settle sponsorships
    pub entry_point: Pubkey,

    /// External membership proof verifier program
    pub verifier: Pubkey,

    /// Chain identifier bound into scopes and request messages
    pub chain_id: u64,

    /// Number of pools created, also the next pool id
    pub pool_count: u64,

    /// Sum of all pools' deposits, always backed by the vault
    pub total_users_deposit: u64,

    /// PDA bump seed
    pub bump: u8,

    /// Vault PDA bump seed
    pub vault_bump: u8,

    /// Reserved space for future upgrades
    pub _reserved: [u8; 32],
}

impl PaymasterConfig {
    /// Account space calculation
    pub const LEN: usize = 8 // discriminator
        + 32 // authority
        + 32 // entry_point
        + 32 // verifier
        + 8  // chain_id
        + 8  // pool_count
        + 8  // total_users_deposit
        + 1  // bump
        + 1  // vault_bump
        + 32; // reserved

    pub const SEED: &'static [u8] = b"paymaster";

    /// Initialize configuration
    pub fn initialize(
        &mut self,
        authority: Pubkey,
        entry_point: Pubkey,
        verifier: Pubkey,
        chain_id: u64,
        bump: u8,
        vault_bump: u8,
    ) {
        self.authority = authority;
        self.entry_point = entry_point;
        self.verifier = verifier;
        self.chain_id = chain_id;
        self.pool_count = 0;
        self.total_users_deposit = 0;
        self.bump = bump;
        self.vault_bump = vault_bump;
        self._reserved = [0u8; 32];
    }

    /// Allocate the next sequential pool id.
    pub fn next_pool_id(&mut self) -> Result<u64> {
        let pool_id = self.pool_count;
        self.pool_count = self
            .pool_count
            .checked_add(1)
            .ok_or(error!(PaymasterError::ArithmeticOverflow))?;
        Ok(pool_id)
    }

    /// Record joining fees paid into the vault (checked arithmetic)
    pub fn record_deposit(&mut self, amount: u64) -> Result<()> {
        self.total_users_deposit = self
            .total_users_deposit
            .checked_add(amount)
            .ok_or(error!(PaymasterError::ArithmeticOverflow))?;
        Ok(())
    }

    /// Release deposits spent on a settled sponsorship.
    ///
    /// # Errors
    /// * `InvariantViolation` - would go below zero
    pub fn release_deposit(&mut self, amount: u64) -> Result<()> {
        self.total_users_deposit = self
            .total_users_deposit
            .checked_sub(amount)
            .ok_or(error!(PaymasterError::InvariantViolation))?;
        Ok(())
    }

    /// Vault funds beyond user deposits, i.e. paymaster revenue.
    pub fn withdrawable(&self, vault_funding: u64) -> u64 {
        vault_funding.saturating_sub(self.total_users_deposit)
    }

    /// Transfer authority to new address
    pub fn transfer_authority(&mut self, new_authority: Pubkey) {
        self.authority = new_authority;
    }
}

/// Lamport vault holding joining fees and paying sponsored costs.
///
/// PDA Seeds: `[b"vault"]`
#[account]
pub struct Vault {
    /// PDA bump seed
    pub bump: u8,
}

impl Vault {
    pub const LEN: usize = 8 + 1;

    pub const SEED: &'static [u8] = b"vault";

    /// Lamports above the rent-exempt minimum.
    pub fn funding(info: &AccountInfo) -> Result<u64> {
        let reserve = Rent::get()?.minimum_balance(info.data_len());
        Ok(info.lamports().saturating_sub(reserve))
    }

    /// Move lamports out of the program-owned vault.
    pub fn pay<'info>(
        vault: &AccountInfo<'info>,
        recipient: &AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        require!(
            Self::funding(vault)? >= amount,
            PaymasterError::InsufficientPaymasterFunding
        );

        let mut vault_lamports = vault.try_borrow_mut_lamports()?;
        **vault_lamports = vault_lamports
            .checked_sub(amount)
            .ok_or(error!(PaymasterError::ArithmeticOverflow))?;

        let mut recipient_lamports = recipient.try_borrow_mut_lamports()?;
        **recipient_lamports = recipient_lamports
            .checked_add(amount)
            .ok_or(error!(PaymasterError::ArithmeticOverflow))?;
        Ok(())
    }
}
