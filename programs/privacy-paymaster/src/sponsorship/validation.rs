//! Validation phase
//!
//! Validation is read-only: it never mutates the tree, the ledger or the
//! pool. Cheap checks run first so the verifier CPI, the expensive step,
//! only happens once everything else holds.
//!
//! # Estimation Mode
//! With the estimation flag set, bypassable failures are recorded instead
//! of aborting. All checks still run (including the verifier) so the cost
//! of the call matches a real one, and the result is marked `WouldFail`.

use anchor_lang::prelude::*;

use crate::crypto::verifier::MembershipVerifier;
use crate::error::PaymasterError;
use crate::state::merkle_tree::{MAX_PROOF_DEPTH, MIN_PROOF_DEPTH};
use crate::state::{MemberCredit, MerkleTree, Pool, UsageBook};

use super::context::{SettlementContext, ValidationOutcome, ValidationResult};
use super::request::{ActivationPayload, CachedPayload, SponsoredRequest, SponsorshipRoute};
use super::settlement::{
    charge_ceiling, ACTIVATION_SETTLEMENT_OVERHEAD, CACHED_SETTLEMENT_OVERHEAD,
};

/// Collects suppressed failures under estimation mode.
#[derive(Debug, Default)]
pub struct CheckLedger {
    estimation: bool,
    failures: Vec<PaymasterError>,
}

impl CheckLedger {
    pub fn new(estimation: bool) -> Self {
        Self {
            estimation,
            failures: Vec::new(),
        }
    }

    /// Pass when `condition` holds; otherwise fail or, when allowed, record.
    pub fn check(&mut self, condition: bool, failure: PaymasterError) -> Result<()> {
        if condition {
            return Ok(());
        }
        if self.estimation && failure.is_bypassable() {
            msg!("Estimation: suppressed {}", failure);
            self.failures.push(failure);
            return Ok(());
        }
        Err(failure.into())
    }

    pub fn failures(&self) -> &[PaymasterError] {
        &self.failures
    }

    pub fn outcome(&self) -> ValidationOutcome {
        if self.failures.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::WouldFail
        }
    }
}

/// State visible to validation.
pub struct ValidationState<'a> {
    pub program_id: &'a Pubkey,
    pub chain_id: u64,
    pub pool: &'a Pool,
    pub tree: &'a MerkleTree,
    pub credit: &'a MemberCredit,
    pub usages: &'a UsageBook,
    /// Vault lamports available for sponsorship
    pub funding: u64,
}

/// Validate `request` on its decoded route and build the settlement context.
pub fn validate_request<V: MembershipVerifier>(
    state: &ValidationState,
    verifier: &V,
    request: &SponsoredRequest,
    route: &SponsorshipRoute,
    request_id: [u8; 32],
    max_cost: u64,
) -> Result<ValidationResult> {
    let mut checks = CheckLedger::new(route.is_estimation());

    let context = match route {
        SponsorshipRoute::Activation(payload) => validate_activation(
            state,
            verifier,
            request,
            payload,
            request_id,
            max_cost,
            &mut checks,
        )?,
        SponsorshipRoute::Cached(payload) => {
            validate_cached(state, request, payload, request_id, max_cost, &mut checks)?
        }
    };

    Ok(ValidationResult {
        context,
        outcome: checks.outcome(),
    })
}

fn validate_activation<V: MembershipVerifier>(
    state: &ValidationState,
    verifier: &V,
    request: &SponsoredRequest,
    payload: &ActivationPayload,
    request_id: [u8; 32],
    max_cost: u64,
    checks: &mut CheckLedger,
) -> Result<SettlementContext> {
    let pool = state.pool;
    let proof = &payload.proof;

    checks.check(pool.pool_id == payload.pool_id, PaymasterError::PoolNotFound)?;

    // Slot availability
    checks.check(
        !state.credit.occupies(&proof.nullifier),
        PaymasterError::NullifierAlreadyActive,
    )?;
    checks.check(
        state.credit.state.has_free_slot(),
        PaymasterError::AllSlotsOccupied,
    )?;

    // Funding, with credit and deposits covering the settlement overhead too
    let max_charge = charge_ceiling(
        ACTIVATION_SETTLEMENT_OVERHEAD,
        max_cost,
        request.max_fee_per_unit,
    );
    checks.check(
        state.funding >= max_cost,
        PaymasterError::InsufficientPaymasterFunding,
    )?;
    checks.check(
        pool.total_deposits >= max_charge,
        PaymasterError::InsufficientPoolDeposits,
    )?;
    let remaining = pool
        .joining_fee
        .saturating_sub(state.usages.usage(&proof.nullifier));
    checks.check(remaining >= max_charge, PaymasterError::CreditBudgetExceeded)?;

    // Membership
    checks.check(!state.tree.is_empty(), PaymasterError::EmptyPool)?;
    checks.check(
        (MIN_PROOF_DEPTH..=MAX_PROOF_DEPTH).contains(&proof.depth),
        PaymasterError::InvalidTreeDepth,
    )?;
    let indexed_root = state.tree.root_at(payload.config.root_index);
    checks.check(indexed_root == Some(proof.root), PaymasterError::UnknownRoot)?;

    // Bindings
    checks.check(proof.scope == pool.scope, PaymasterError::ScopeMismatch)?;
    let message = request.message_hash(state.program_id, state.chain_id)?;
    checks.check(proof.message == message, PaymasterError::MessageMismatch)?;

    let signals = proof.public_signals().to_field_elements();
    let valid = verifier.verify(
        &proof.point_a(),
        &proof.point_b(),
        &proof.point_c(),
        &signals,
        proof.depth,
    )?;
    checks.check(valid, PaymasterError::InvalidProof)?;

    Ok(SettlementContext::Activation {
        request_id,
        pool_id: payload.pool_id,
        nullifier: proof.nullifier,
        account: request.sender,
        max_charge,
    })
}

fn validate_cached(
    state: &ValidationState,
    request: &SponsoredRequest,
    payload: &CachedPayload,
    request_id: [u8; 32],
    max_cost: u64,
    checks: &mut CheckLedger,
) -> Result<SettlementContext> {
    let pool = state.pool;

    checks.check(pool.pool_id == payload.pool_id, PaymasterError::PoolNotFound)?;
    checks.check(
        state.credit.state.activated >= 1,
        PaymasterError::NoActiveCredit,
    )?;
    let max_charge = charge_ceiling(
        CACHED_SETTLEMENT_OVERHEAD,
        max_cost,
        request.max_fee_per_unit,
    );
    checks.check(
        state.funding >= max_cost,
        PaymasterError::InsufficientPaymasterFunding,
    )?;
    checks.check(
        pool.total_deposits >= max_charge,
        PaymasterError::InsufficientPoolDeposits,
    )?;
    checks.check(
        state.credit.available(pool.joining_fee, state.usages) >= max_charge,
        PaymasterError::InsufficientCredit,
    )?;

    Ok(SettlementContext::Cached {
        request_id,
        pool_id: payload.pool_id,
        account: request.sender,
        max_charge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enforcement_aborts() {
        let mut checks = CheckLedger::new(false);
        assert!(checks.check(true, PaymasterError::UnknownRoot).is_ok());
        assert!(checks.check(false, PaymasterError::UnknownRoot).is_err());
        assert_eq!(checks.outcome(), ValidationOutcome::Valid);
    }

    #[test]
    fn test_estimation_records_bypassable() {
        let mut checks = CheckLedger::new(true);
        checks.check(false, PaymasterError::InvalidProof).unwrap();
        checks.check(false, PaymasterError::InsufficientCredit).unwrap();
        assert_eq!(checks.failures().len(), 2);
        assert_eq!(checks.outcome(), ValidationOutcome::WouldFail);
    }

    #[test]
    fn test_estimation_keeps_structural_fatal() {
        let mut checks = CheckLedger::new(true);
        assert!(checks
            .check(false, PaymasterError::InvalidPaymasterDataLength)
            .is_err());
        assert!(checks.failures().is_empty());
    }
}
