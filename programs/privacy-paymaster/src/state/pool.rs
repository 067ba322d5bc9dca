//! Pool state account
//!
//! A pool groups members who paid the same joining fee. Its deposits fund
//! their sponsored transactions, and its scope binds membership proofs to
//! this pool on this chain forever.

use anchor_lang::prelude::*;
use solana_program::keccak;

use crate::crypto::field::{reduce_to_field, FieldElement};
use crate::error::PaymasterError;

use super::merkle_tree::MerkleTree;

/// Upper bound on the joining fee (10_000 SOL)
pub const MAX_JOINING_FEE: u64 = 10_000 * 1_000_000_000;

/// Maximum commitments per `add_members` call
pub const MAX_BATCH_SIZE: usize = 16;

/// Presence map of commitments already admitted to a pool.
pub trait LeafRegistry {
    fn contains(&self, commitment: &FieldElement) -> Result<bool>;

    fn record(&mut self, commitment: &FieldElement, leaf_index: u64) -> Result<()>;
}

/// Pool record.
///
/// PDA Seeds: `[b"pool", pool_id.to_le_bytes().as_ref()]`
#[account]
pub struct Pool {
    /// Sequential pool identifier
    pub pool_id: u64,

    /// Fee paid per member, also each nullifier's gas budget
    pub joining_fee: u64,

    /// Deposits not yet spent on sponsorships
    pub total_deposits: u64,

    /// Proof binding derived at creation
    pub scope: [u8; 32],

    /// Merkle tree account address (cached for convenience)
    pub merkle_tree: Pubkey,

    /// PDA bump seed
    pub bump: u8,
}

impl Pool {
    /// Account space calculation
    pub const LEN: usize = 8 // discriminator
        + 8  // pool_id
        + 8  // joining_fee
        + 8  // total_deposits
        + 32 // scope
        + 32 // merkle_tree
        + 1; // bump

    pub const SEED_PREFIX: &'static [u8] = b"pool";

    /// Initialize pool, deriving its scope from its own address.
    pub fn initialize(
        &mut self,
        pool_id: u64,
        joining_fee: u64,
        pool_address: &Pubkey,
        chain_id: u64,
        merkle_tree: Pubkey,
        bump: u8,
    ) -> Result<()> {
        require!(
            joining_fee > 0 && joining_fee <= MAX_JOINING_FEE,
            PaymasterError::InvalidJoiningFee
        );

        self.pool_id = pool_id;
        self.joining_fee = joining_fee;
        self.total_deposits = 0;
        self.scope = Self::derive_scope(pool_address, chain_id, joining_fee);
        self.merkle_tree = merkle_tree;
        self.bump = bump;
        Ok(())
    }

    /// `keccak256(pool ‖ chain_id ‖ joining_fee) mod r`
    pub fn derive_scope(pool_address: &Pubkey, chain_id: u64, joining_fee: u64) -> FieldElement {
        let digest = keccak::hashv(&[
            pool_address.as_ref(),
            &chain_id.to_be_bytes(),
            &joining_fee.to_be_bytes(),
        ]);
        reduce_to_field(&digest.to_bytes())
    }

    /// Exact payment expected for `count` new members.
    pub fn required_payment(&self, count: usize) -> Result<u64> {
        self.joining_fee
            .checked_mul(count as u64)
            .ok_or(error!(PaymasterError::ArithmeticOverflow))
    }

    pub fn credit_deposits(&mut self, amount: u64) -> Result<()> {
        self.total_deposits = self
            .total_deposits
            .checked_add(amount)
            .ok_or(error!(PaymasterError::ArithmeticOverflow))?;
        Ok(())
    }

    /// # Errors
    /// * `InvariantViolation` - deposits would go negative
    pub fn debit_deposits(&mut self, amount: u64) -> Result<()> {
        self.total_deposits = self
            .total_deposits
            .checked_sub(amount)
            .ok_or(error!(PaymasterError::InvariantViolation))?;
        Ok(())
    }

    /// Insert commitments one by one, each under the single-insert rules.
    ///
    /// # Returns
    /// The root after the last insertion.
    pub fn admit<R: LeafRegistry>(
        &self,
        tree: &mut MerkleTree,
        commitments: &[FieldElement],
        registry: &mut R,
    ) -> Result<FieldElement> {
        require!(
            !commitments.is_empty() && commitments.len() <= MAX_BATCH_SIZE,
            PaymasterError::InvalidBatchSize
        );

        let mut root = tree.root();
        for commitment in commitments {
            require!(
                !registry.contains(commitment)?,
                PaymasterError::DuplicateCommitment
            );
            let (new_root, leaf_index) = tree.insert(*commitment)?;
            registry.record(commitment, leaf_index)?;
            root = new_root;
        }
        Ok(root)
    }
}
