//! Settlement phase
//!
//! Runs after the sponsored request has executed, exactly once per
//! validated context. The charge is the actual cost plus a fixed per-route
//! overhead priced at the request's fee rate. It is taken from the
//! member's credit and from the pool and aggregate deposits.
//!
//! The charge never exceeds the ceiling fixed at validation, which was
//! checked against the nullifier budget, the pool deposits and the
//! available credit. Settlement has no user-facing failure: an underflow
//! here means the books are inconsistent and aborts with `InvariantViolation`.

use anchor_lang::prelude::*;

use crate::error::PaymasterError;
use crate::state::{MemberCredit, PaymasterConfig, Pool, UsageBook};

use super::context::SettlementContext;

/// Units charged on top of the actual cost for activation bookkeeping
pub const ACTIVATION_SETTLEMENT_OVERHEAD: u64 = 65_000;

/// Units charged on top of the actual cost for cached bookkeeping
pub const CACHED_SETTLEMENT_OVERHEAD: u64 = 43_000;

/// Mutable state touched by settlement.
pub struct SettlementLedger<'a> {
    pub config: &'a mut PaymasterConfig,
    pub pool: &'a mut Pool,
    pub credit: &'a mut MemberCredit,
    pub usages: &'a mut UsageBook,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementReceipt {
    /// Actual cost plus priced overhead, capped at the context ceiling
    pub total_charged: u64,

    /// Lamports owed to the beneficiary
    pub payout: u64,

    /// Part of the charge no credit slot absorbed (cached route only)
    pub unconsumed: u64,

    /// Slot the nullifier was attached to (activation route only)
    pub slot: Option<u8>,
}

/// Most a request can be charged: `max_cost + overhead × max_fee_per_unit`.
///
/// The request's fee ceiling bounds any fee rate settlement may apply.
pub fn charge_ceiling(overhead: u64, max_cost: u64, max_fee_per_unit: u64) -> u64 {
    overhead
        .saturating_mul(max_fee_per_unit)
        .saturating_add(max_cost)
}

/// `actual_cost + overhead × fee_rate` for the context's route.
pub fn total_charge(context: &SettlementContext, actual_cost: u64, fee_rate: u64) -> u64 {
    let overhead = match context {
        SettlementContext::Activation { .. } => ACTIVATION_SETTLEMENT_OVERHEAD,
        SettlementContext::Cached { .. } => CACHED_SETTLEMENT_OVERHEAD,
    };
    charge_ceiling(overhead, actual_cost, fee_rate)
}

/// Apply the charge for a validated context.
pub fn settle(
    ledger: &mut SettlementLedger,
    context: &SettlementContext,
    actual_cost: u64,
    fee_rate: u64,
) -> Result<SettlementReceipt> {
    require!(
        ledger.pool.pool_id == context.pool_id()
            && ledger.credit.account == context.account(),
        PaymasterError::InvariantViolation
    );

    let total_charged = total_charge(context, actual_cost, fee_rate).min(context.max_charge());
    let payout = actual_cost.min(total_charged);
    let budget = ledger.pool.joining_fee;

    let receipt = match context {
        SettlementContext::Activation { nullifier, .. } => {
            let slot = ledger
                .credit
                .attach(*nullifier, total_charged, budget, ledger.usages)?;
            SettlementReceipt {
                total_charged,
                payout,
                unconsumed: 0,
                slot: Some(slot),
            }
        }
        SettlementContext::Cached { .. } => {
            let unconsumed = ledger.credit.consume(total_charged, budget, ledger.usages)?;
            SettlementReceipt {
                total_charged,
                payout,
                unconsumed,
                slot: None,
            }
        }
    };

    ledger.pool.debit_deposits(total_charged)?;
    ledger.config.release_deposit(total_charged)?;

    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts(max_charge: u64) -> (SettlementContext, SettlementContext) {
        let account = Pubkey::new_unique();
        let activation = SettlementContext::Activation {
            request_id: [0u8; 32],
            pool_id: 0,
            nullifier: [1u8; 32],
            account,
            max_charge,
        };
        let cached = SettlementContext::Cached {
            request_id: [0u8; 32],
            pool_id: 0,
            account,
            max_charge,
        };
        (activation, cached)
    }

    #[test]
    fn test_total_charge_per_route() {
        let (activation, cached) = contexts(u64::MAX);

        assert_eq!(total_charge(&activation, 1_000, 2), 1_000 + 130_000);
        assert_eq!(total_charge(&cached, 1_000, 2), 1_000 + 86_000);
        assert_eq!(total_charge(&cached, 7, 0), 7);
        assert_eq!(total_charge(&cached, 0, u64::MAX), u64::MAX);
    }

    #[test]
    fn test_ceiling_covers_any_allowed_fee_rate() {
        let (activation, _) = contexts(u64::MAX);
        let ceiling = charge_ceiling(ACTIVATION_SETTLEMENT_OVERHEAD, 5_000, 3);
        assert_eq!(ceiling, 5_000 + 195_000);
        for fee_rate in 0..=3 {
            assert!(total_charge(&activation, 5_000, fee_rate) <= ceiling);
        }
        assert!(total_charge(&activation, 5_000, 4) > ceiling);
        assert_eq!(charge_ceiling(u64::MAX, 1, 2), u64::MAX);
    }
}
