//! Nullifier gas usage using per-nullifier PDA pattern
//!
//! Each nullifier that has ever been activated gets its own account holding
//! the cumulative amount charged against it. Usage is global: the account
//! is keyed by the nullifier alone, not by pool or member.
//!
//! # Loading Pattern
//! Instructions pass the usage accounts they touch as `remaining_accounts`.
//! [`UsageBook::load`] resolves them by PDA address into an in-memory book,
//! the sponsorship engine reads and updates the book, and
//! [`UsageBook::persist`] writes back only what changed, creating accounts
//! on first charge.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::crypto::field::FieldElement;
use crate::error::PaymasterError;

use super::pda;

/// Cumulative usage of one nullifier.
///
/// PDA Seeds: `[b"nullifier", nullifier.as_ref()]`
#[account]
pub struct NullifierUsage {
    /// The nullifier this record tracks
    pub nullifier: [u8; 32],

    /// Total amount charged against the nullifier
    pub usage: u64,

    /// PDA bump seed
    pub bump: u8,
}

impl NullifierUsage {
    /// Account space
    pub const LEN: usize = 8  // discriminator
        + 32                  // nullifier
        + 8                   // usage
        + 1;                  // bump

    /// Seed prefix for PDA derivation
    pub const SEED_PREFIX: &'static [u8] = b"nullifier";

    /// Derive the PDA address for a nullifier
    pub fn find_pda(program_id: &Pubkey, nullifier: &FieldElement) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[Self::SEED_PREFIX, nullifier.as_ref()], program_id)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct UsageEntry {
    loaded: u64,
    current: u64,
}

/// In-memory view of the nullifier usage map for one instruction.
///
/// Nullifiers never loaded read as zero usage.
#[derive(Clone, Debug, Default)]
pub struct UsageBook {
    entries: BTreeMap<FieldElement, UsageEntry>,
}

impl UsageBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the book with a stored usage value.
    pub fn insert(&mut self, nullifier: FieldElement, usage: u64) {
        self.entries.insert(
            nullifier,
            UsageEntry {
                loaded: usage,
                current: usage,
            },
        );
    }

    pub fn usage(&self, nullifier: &FieldElement) -> u64 {
        self.entries
            .get(nullifier)
            .map(|entry| entry.current)
            .unwrap_or(0)
    }

    pub fn set_usage(&mut self, nullifier: FieldElement, usage: u64) {
        self.entries.entry(nullifier).or_default().current = usage;
    }

    /// Add `amount` to a nullifier's usage (checked).
    pub fn charge(&mut self, nullifier: FieldElement, amount: u64) -> Result<u64> {
        let usage = self
            .usage(&nullifier)
            .checked_add(amount)
            .ok_or(error!(PaymasterError::ArithmeticOverflow))?;
        self.set_usage(nullifier, usage);
        Ok(usage)
    }

    /// Nullifiers whose usage differs from what was loaded.
    pub fn changed(&self) -> impl Iterator<Item = (&FieldElement, u64)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.current != entry.loaded)
            .map(|(nullifier, entry)| (nullifier, entry.current))
    }

    /// Resolve the usage accounts for `nullifiers` among `accounts`.
    ///
    /// An uncreated account reads as zero usage.
    ///
    /// # Errors
    /// * `MissingUsageAccount` - a required PDA was not supplied
    pub fn load(
        program_id: &Pubkey,
        nullifiers: &[FieldElement],
        accounts: &[AccountInfo],
    ) -> Result<Self> {
        let mut book = Self::new();
        for nullifier in nullifiers {
            let (address, _) = NullifierUsage::find_pda(program_id, nullifier);
            let info = pda::find_supplied(accounts, &address)
                .ok_or(error!(PaymasterError::MissingUsageAccount))?;

            let usage = if pda::is_initialized(info, program_id) {
                pda::read::<NullifierUsage>(info, program_id)?.usage
            } else {
                0
            };
            book.insert(*nullifier, usage);
        }
        Ok(book)
    }

    /// Write changed usages back, creating accounts that do not exist yet.
    pub fn persist<'info>(
        &self,
        program_id: &Pubkey,
        accounts: &[AccountInfo<'info>],
        payer: &AccountInfo<'info>,
        system_program: &AccountInfo<'info>,
    ) -> Result<()> {
        for (nullifier, usage) in self.changed() {
            let (address, bump) = NullifierUsage::find_pda(program_id, nullifier);
            let info = pda::find_supplied(accounts, &address)
                .ok_or(error!(PaymasterError::MissingUsageAccount))?;

            let record = NullifierUsage {
                nullifier: *nullifier,
                usage,
                bump,
            };

            if pda::is_initialized(info, program_id) {
                pda::write(info, &record)?;
            } else {
                let bump_seed = [bump];
                pda::create_and_write(
                    payer,
                    info,
                    system_program,
                    &[NullifierUsage::SEED_PREFIX, nullifier.as_ref(), &bump_seed],
                    NullifierUsage::LEN,
                    program_id,
                    &record,
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_nullifier_reads_zero() {
        let book = UsageBook::new();
        assert_eq!(book.usage(&[7u8; 32]), 0);
    }

    #[test]
    fn test_changed_tracks_only_updates() {
        let mut book = UsageBook::new();
        book.insert([1u8; 32], 10);
        book.insert([2u8; 32], 20);
        book.charge([2u8; 32], 5).unwrap();
        book.charge([3u8; 32], 1).unwrap();

        let changed: Vec<_> = book.changed().map(|(n, u)| (*n, u)).collect();
        assert_eq!(changed, vec![([2u8; 32], 25), ([3u8; 32], 1)]);
    }

    #[test]
    fn test_charge_overflow() {
        let mut book = UsageBook::new();
        book.insert([1u8; 32], u64::MAX);
        assert!(book.charge([1u8; 32], 1).is_err());
    }

    #[test]
    fn test_pda_is_deterministic() {
        let program_id = Pubkey::new_unique();
        let (a, _) = NullifierUsage::find_pda(&program_id, &[9u8; 32]);
        let (b, _) = NullifierUsage::find_pda(&program_id, &[9u8; 32]);
        let (c, _) = NullifierUsage::find_pda(&program_id, &[8u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
