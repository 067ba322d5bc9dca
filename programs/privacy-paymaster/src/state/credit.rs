//! Per-member gas credit ledger
//!
//! A member of a pool holds up to two activated nullifiers at once. Each
//! nullifier may be charged up to the pool's joining fee (its budget), after
//! which it is exhausted and its slot can be taken by a future activation.
//!
//! # Consumption Order
//! Cached settlements start at the active slot and continue round-robin,
//! `(active + i) % 2`. The slot with less room is not skipped: the order is
//! strictly positional so that a member's spending history is predictable
//! across transactions.
//!
//! # Compact Word
//! [`CreditState::encode`] packs the state into one byte for logs and
//! events: bits 0-1 activated count, bit 2 active index, bit 3 exhausted
//! flag, bit 4 exhausted index.

use anchor_lang::prelude::*;

use crate::crypto::field::{is_zero, FieldElement, ZERO};
use crate::error::PaymasterError;

use super::nullifier_usage::UsageBook;
use super::pda;

/// Concurrent nullifiers per member
pub const MAX_CREDIT_SLOTS: usize = 2;

const COUNT_MASK: u8 = 0b0000_0011;
const ACTIVE_INDEX_BIT: u8 = 0b0000_0100;
const EXHAUSTED_FLAG_BIT: u8 = 0b0000_1000;
const EXHAUSTED_INDEX_BIT: u8 = 0b0001_0000;

// ============================================================================
// CREDIT STATE
// ============================================================================

/// Slot bookkeeping for one (pool, member) pair.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreditState {
    /// Number of activated slots (0, 1 or 2)
    pub activated: u8,

    /// Slot consumed first by the next settlement
    pub active_index: u8,

    /// Whether a slot is exhausted and may be reused
    pub has_exhausted: bool,

    /// Which slot is exhausted, meaningful only with `has_exhausted`
    pub exhausted_index: u8,
}

impl CreditState {
    /// Activated count 0 -> 1, consumption starts at slot 0.
    pub fn initialize_first_slot(&mut self) -> Result<()> {
        require!(self.activated == 0, PaymasterError::InvariantViolation);
        self.activated = 1;
        self.active_index = 0;
        Ok(())
    }

    /// Activated count 1 -> 2.
    pub fn add_second_slot(&mut self) -> Result<()> {
        require!(self.activated == 1, PaymasterError::InvariantViolation);
        self.activated = 2;
        Ok(())
    }

    /// Clear the exhausted flag; the flagged slot is replaced in place.
    ///
    /// When the other slot is itself exhausted the flag moves there.
    pub fn reuse_exhausted_slot(&mut self, other_exhausted: bool) -> Result<()> {
        require!(self.has_exhausted, PaymasterError::InvariantViolation);
        if other_exhausted {
            self.exhausted_index = Self::other(self.exhausted_index);
        } else {
            self.has_exhausted = false;
            self.exhausted_index = 0;
        }
        Ok(())
    }

    /// Flag `slot` as exhausted unless a slot is already flagged, and move
    /// consumption to the other slot when there is one.
    pub fn mark_exhausted(&mut self, slot: u8) {
        if !self.has_exhausted {
            self.has_exhausted = true;
            self.exhausted_index = slot;
        }
        if self.activated as usize == MAX_CREDIT_SLOTS && self.active_index == slot {
            self.active_index = Self::other(slot);
        }
    }

    /// Whether an activation can find a slot.
    pub fn has_free_slot(&self) -> bool {
        (self.activated as usize) < MAX_CREDIT_SLOTS || self.has_exhausted
    }

    /// Slot the next activation would take: empty, then exhausted reuse,
    /// then second slot.
    pub fn next_slot(&self) -> Option<u8> {
        if self.activated == 0 {
            Some(0)
        } else if self.has_exhausted {
            Some(self.exhausted_index)
        } else if (self.activated as usize) < MAX_CREDIT_SLOTS {
            Some(self.activated)
        } else {
            None
        }
    }

    /// Activated slot indices in consumption order.
    pub fn consumption_order(&self) -> impl Iterator<Item = usize> {
        let start = self.active_index as usize;
        (0..self.activated as usize).map(move |i| (start + i) % MAX_CREDIT_SLOTS)
    }

    pub fn encode(&self) -> u8 {
        let mut word = self.activated & COUNT_MASK;
        if self.active_index == 1 {
            word |= ACTIVE_INDEX_BIT;
        }
        if self.has_exhausted {
            word |= EXHAUSTED_FLAG_BIT;
        }
        if self.exhausted_index == 1 {
            word |= EXHAUSTED_INDEX_BIT;
        }
        word
    }

    pub fn decode(word: u8) -> Self {
        Self {
            activated: word & COUNT_MASK,
            active_index: u8::from(word & ACTIVE_INDEX_BIT != 0),
            has_exhausted: word & EXHAUSTED_FLAG_BIT != 0,
            exhausted_index: u8::from(word & EXHAUSTED_INDEX_BIT != 0),
        }
    }

    fn other(slot: u8) -> u8 {
        1 - (slot & 1)
    }
}

// ============================================================================
// MEMBER CREDIT ACCOUNT
// ============================================================================

/// Credit record of one member in one pool.
///
/// PDA Seeds: `[b"credit", pool.key().as_ref(), account.as_ref()]`
#[account]
#[derive(Default)]
pub struct MemberCredit {
    /// Pool the credit belongs to
    pub pool: Pubkey,

    /// Member account spending the credit
    pub account: Pubkey,

    /// Slot bookkeeping
    pub state: CreditState,

    /// Nullifier per slot, zero = empty
    pub slots: [[u8; 32]; 2],

    /// PDA bump seed
    pub bump: u8,
}

impl MemberCredit {
    /// Account space calculation
    pub const LEN: usize = 8 // discriminator
        + 32 // pool
        + 32 // account
        + 4  // state
        + 32 * MAX_CREDIT_SLOTS // slots
        + 1; // bump

    /// Seed prefix for PDA derivation
    pub const SEED_PREFIX: &'static [u8] = b"credit";

    /// A record with no activated slot.
    pub fn empty(pool: Pubkey, account: Pubkey, bump: u8) -> Self {
        Self {
            pool,
            account,
            state: CreditState::default(),
            slots: [ZERO; MAX_CREDIT_SLOTS],
            bump,
        }
    }

    /// Read the record behind a possibly uncreated credit PDA.
    pub fn load(
        info: &AccountInfo,
        program_id: &Pubkey,
        pool: Pubkey,
        account: Pubkey,
        bump: u8,
    ) -> Result<Self> {
        if pda::is_initialized(info, program_id) {
            pda::read(info, program_id)
        } else {
            Ok(Self::empty(pool, account, bump))
        }
    }

    /// Whether `nullifier` already sits in one of the activated slots.
    pub fn occupies(&self, nullifier: &FieldElement) -> bool {
        self.state
            .consumption_order()
            .any(|slot| self.slots[slot] == *nullifier)
    }

    /// Non-empty nullifiers held by this member.
    pub fn nullifiers(&self) -> Vec<FieldElement> {
        self.slots.iter().copied().filter(|n| !is_zero(n)).collect()
    }

    fn is_slot_live(&self, slot: usize, budget: u64, usages: &UsageBook) -> bool {
        slot < self.state.activated as usize
            && !is_zero(&self.slots[slot])
            && !(self.state.has_exhausted && self.state.exhausted_index as usize == slot)
            && usages.usage(&self.slots[slot]) < budget
    }

    /// Remaining credit over activated, non-empty slots.
    pub fn available(&self, budget: u64, usages: &UsageBook) -> u64 {
        self.state
            .consumption_order()
            .map(|slot| &self.slots[slot])
            .filter(|nullifier| !is_zero(nullifier))
            .fold(0u64, |total, nullifier| {
                total.saturating_add(budget.saturating_sub(usages.usage(nullifier)))
            })
    }

    /// Charge `cost` round-robin from the active slot.
    ///
    /// # Returns
    /// The part of `cost` no slot could absorb.
    pub fn consume(&mut self, cost: u64, budget: u64, usages: &mut UsageBook) -> Result<u64> {
        let mut remaining = cost;
        let order: Vec<usize> = self.state.consumption_order().collect();

        for slot in order {
            if remaining == 0 {
                break;
            }
            let nullifier = self.slots[slot];
            if is_zero(&nullifier) {
                continue;
            }

            let usage = usages.usage(&nullifier);
            let taken = remaining.min(budget.saturating_sub(usage));
            if taken > 0 {
                usages.charge(nullifier, taken)?;
                remaining -= taken;
            }
            if usage.saturating_add(taken) >= budget {
                self.state.mark_exhausted(slot as u8);
            }
        }

        Ok(remaining)
    }

    /// Put `nullifier` into the next free slot and charge `cost` to it.
    ///
    /// The full cost is charged even beyond the budget.
    ///
    /// # Returns
    /// The slot index used.
    ///
    /// # Errors
    /// * `NullifierAlreadyActive` - nullifier already held by this member
    /// * `AllSlotsOccupied` - two live nullifiers, none exhausted
    pub fn attach(
        &mut self,
        nullifier: FieldElement,
        cost: u64,
        budget: u64,
        usages: &mut UsageBook,
    ) -> Result<u8> {
        require!(
            !self.occupies(&nullifier),
            PaymasterError::NullifierAlreadyActive
        );

        let previous_active = self.state.active_index as usize;
        let previous_live = self.is_slot_live(previous_active, budget, usages);

        let slot = self
            .state
            .next_slot()
            .ok_or(error!(PaymasterError::AllSlotsOccupied))?;

        if self.state.activated == 0 {
            self.state.initialize_first_slot()?;
        } else if self.state.has_exhausted {
            let other = CreditState::other(slot) as usize;
            let other_exhausted = other < self.state.activated as usize
                && !is_zero(&self.slots[other])
                && usages.usage(&self.slots[other]) >= budget;
            self.state.reuse_exhausted_slot(other_exhausted)?;
        } else {
            self.state.add_second_slot()?;
        }

        self.slots[slot as usize] = nullifier;
        if !previous_live {
            self.state.active_index = slot;
        }

        let usage = usages.charge(nullifier, cost)?;
        if usage >= budget {
            self.state.mark_exhausted(slot);
        }

        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::assert_error;

    const BUDGET: u64 = 1_000;

    fn nullifier(n: u8) -> FieldElement {
        [n; 32]
    }

    fn credit() -> MemberCredit {
        MemberCredit::empty(Pubkey::default(), Pubkey::default(), 255)
    }

    #[test]
    fn test_transitions() {
        let mut state = CreditState::default();
        assert!(state.add_second_slot().is_err());
        state.initialize_first_slot().unwrap();
        assert_eq!((state.activated, state.active_index), (1, 0));
        state.add_second_slot().unwrap();
        assert_eq!(state.activated, 2);
        assert!(!state.has_free_slot());
        assert!(state.reuse_exhausted_slot(false).is_err());
    }

    #[test]
    fn test_encode_decode() {
        for word in 0u8..32 {
            let state = CreditState::decode(word);
            if state.activated <= 2 {
                assert_eq!(state.encode(), word);
            }
        }
        let state = CreditState {
            activated: 2,
            active_index: 1,
            has_exhausted: true,
            exhausted_index: 0,
        };
        assert_eq!(state.encode(), 0b0000_1110);
    }

    #[test]
    fn test_slot_assignment_order() {
        let mut usages = UsageBook::new();
        let mut credit = credit();

        assert_eq!(credit.attach(nullifier(1), 100, BUDGET, &mut usages).unwrap(), 0);
        assert_eq!(credit.attach(nullifier(2), 100, BUDGET, &mut usages).unwrap(), 1);
        assert_error(
            credit.attach(nullifier(3), 100, BUDGET, &mut usages),
            PaymasterError::AllSlotsOccupied,
        );
    }

    #[test]
    fn test_duplicate_nullifier_rejected() {
        let mut usages = UsageBook::new();
        let mut credit = credit();
        credit.attach(nullifier(1), 100, BUDGET, &mut usages).unwrap();
        assert_error(
            credit.attach(nullifier(1), 100, BUDGET, &mut usages),
            PaymasterError::NullifierAlreadyActive,
        );
    }

    #[test]
    fn test_round_robin_starts_at_active_slot() {
        let mut usages = UsageBook::new();
        let mut credit = credit();
        credit.attach(nullifier(1), 0, BUDGET, &mut usages).unwrap();
        credit.attach(nullifier(2), 0, BUDGET, &mut usages).unwrap();
        credit.state.active_index = 1;

        let left = credit.consume(300, BUDGET, &mut usages).unwrap();
        assert_eq!(left, 0);
        assert_eq!(usages.usage(&nullifier(1)), 0);
        assert_eq!(usages.usage(&nullifier(2)), 300);
    }

    #[test]
    fn test_exhaustion_moves_active_index() {
        let mut usages = UsageBook::new();
        let mut credit = credit();
        credit.attach(nullifier(1), 0, BUDGET, &mut usages).unwrap();
        credit.attach(nullifier(2), 0, BUDGET, &mut usages).unwrap();

        let left = credit.consume(1_200, BUDGET, &mut usages).unwrap();
        assert_eq!(left, 0);
        assert_eq!(usages.usage(&nullifier(1)), BUDGET);
        assert_eq!(usages.usage(&nullifier(2)), 200);
        assert!(credit.state.has_exhausted);
        assert_eq!(credit.state.exhausted_index, 0);
        assert_eq!(credit.state.active_index, 1);
        assert_eq!(credit.available(BUDGET, &usages), 800);
    }

    #[test]
    fn test_consume_reports_unabsorbed_cost() {
        let mut usages = UsageBook::new();
        let mut credit = credit();
        credit.attach(nullifier(1), 400, BUDGET, &mut usages).unwrap();
        let left = credit.consume(700, BUDGET, &mut usages).unwrap();
        assert_eq!(left, 100);
        assert_eq!(usages.usage(&nullifier(1)), BUDGET);
    }

    #[test]
    fn test_single_exhausted_slot_is_reused_before_second() {
        let mut usages = UsageBook::new();
        let mut credit = credit();
        credit.attach(nullifier(1), BUDGET, BUDGET, &mut usages).unwrap();
        assert!(credit.state.has_exhausted);

        let slot = credit.attach(nullifier(2), 10, BUDGET, &mut usages).unwrap();
        assert_eq!(slot, 0);
        assert_eq!(credit.state.activated, 1);
        assert!(!credit.state.has_exhausted);
        assert_eq!(credit.available(BUDGET, &usages), BUDGET - 10);
    }

    #[test]
    fn test_reuse_repoints_flag_when_both_exhausted() {
        let mut usages = UsageBook::new();
        let mut credit = credit();
        credit.attach(nullifier(1), 0, BUDGET, &mut usages).unwrap();
        credit.attach(nullifier(2), 0, BUDGET, &mut usages).unwrap();
        credit.consume(2 * BUDGET, BUDGET, &mut usages).unwrap();
        assert_eq!(credit.state.exhausted_index, 0);
        assert_eq!(credit.available(BUDGET, &usages), 0);

        let slot = credit.attach(nullifier(3), 0, BUDGET, &mut usages).unwrap();
        assert_eq!(slot, 0);
        assert!(credit.state.has_exhausted);
        assert_eq!(credit.state.exhausted_index, 1);
        assert_eq!(credit.state.active_index, 0);

        let slot = credit.attach(nullifier(4), 0, BUDGET, &mut usages).unwrap();
        assert_eq!(slot, 1);
        assert!(!credit.state.has_exhausted);
        assert_eq!(credit.state.activated, 2);
        assert_eq!(credit.state.active_index, 0);
    }
}
