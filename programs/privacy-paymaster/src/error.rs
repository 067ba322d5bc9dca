//! Unified error types for the privacy paymaster
//!
//! Error codes are stable across versions for client compatibility.
//!
//! Validation errors fall into four groups. Structural errors (malformed
//! paymaster data) always abort. State, funding and cryptographic errors can
//! be suppressed in estimation mode, see [`PaymasterError::is_bypassable`].

use anchor_lang::prelude::*;

#[error_code]
pub enum PaymasterError {
    // ========== Structural Errors (6000-6004) ==========

    /// Paymaster data length matches neither route
    #[msg("Invalid paymaster data length")]
    InvalidPaymasterDataLength, // 6000

    /// Route payload could not be decoded
    #[msg("Malformed paymaster payload")]
    MalformedPayload, // 6001

    /// Paymaster data prefix names a different program
    #[msg("Paymaster data is addressed to a different program")]
    PaymasterMismatch, // 6002

    /// A nullifier usage account required by the route was not supplied
    #[msg("Missing nullifier usage account")]
    MissingUsageAccount, // 6003

    /// A member leaf account required for insertion was not supplied
    #[msg("Missing member leaf account")]
    MissingLeafAccount, // 6004

    // ========== State Errors (6005-6009) ==========

    /// Pool referenced by the request does not match a live pool
    #[msg("Pool not found")]
    PoolNotFound, // 6005

    /// Pool tree has no members yet
    #[msg("Pool has no members")]
    EmptyPool, // 6006

    /// Cached route used before any proof-backed activation
    #[msg("No activated credit for this account")]
    NoActiveCredit, // 6007

    /// Both credit slots hold live nullifiers
    #[msg("All credit slots are occupied")]
    AllSlotsOccupied, // 6008

    /// Nullifier already occupies one of the member's slots
    #[msg("Nullifier already active for this account")]
    NullifierAlreadyActive, // 6009

    // ========== Funding Errors (6010-6013) ==========

    /// Vault balance cannot cover the requested amount
    #[msg("Insufficient paymaster funding")]
    InsufficientPaymasterFunding, // 6010

    /// Pool's tracked deposits cannot cover the requested amount
    #[msg("Insufficient pool deposits")]
    InsufficientPoolDeposits, // 6011

    /// Nullifier's remaining budget is below the requested amount
    #[msg("Nullifier gas budget exceeded")]
    CreditBudgetExceeded, // 6012

    /// Activated slots together cannot cover the requested amount
    #[msg("Insufficient cached credit")]
    InsufficientCredit, // 6013

    // ========== Cryptographic Errors (6014-6018) ==========

    /// Proof depth outside the supported range
    #[msg("Proof tree depth must be between 1 and 32")]
    InvalidTreeDepth, // 6014

    /// Indexed root is empty, stale or does not match the proof
    #[msg("Merkle root not in recent history")]
    UnknownRoot, // 6015

    /// Proof scope is bound to another pool
    #[msg("Proof scope does not match pool")]
    ScopeMismatch, // 6016

    /// Proof message is bound to another request
    #[msg("Proof message does not match request")]
    MessageMismatch, // 6017

    /// External verifier rejected the proof
    #[msg("Invalid proof: verification failed")]
    InvalidProof, // 6018

    // ========== Registry Errors (6019-6025) ==========

    /// Joining fee is zero or above the sanity ceiling
    #[msg("Invalid joining fee")]
    InvalidJoiningFee, // 6019

    /// Payment differs from joining fee times member count
    #[msg("Payment must equal joining fee times member count")]
    IncorrectPayment, // 6020

    /// Commitment already exists in tree
    #[msg("Commitment already exists in tree")]
    DuplicateCommitment, // 6021

    /// Commitment is not a BN254 scalar field element
    #[msg("Commitment must be below the scalar field modulus")]
    CommitmentOutOfField, // 6022

    /// Zero is reserved for empty slots
    #[msg("Invalid commitment: cannot be all zeros")]
    ZeroCommitment, // 6023

    /// Insertion would grow the tree past the circuit limit
    #[msg("Merkle tree depth limit reached")]
    TreeDepthExceeded, // 6024

    /// Batch is empty or larger than allowed
    #[msg("Invalid member batch size")]
    InvalidBatchSize, // 6025

    // ========== Authorization / Admin Errors (6026-6029) ==========

    /// Caller is not allowed to perform this operation
    #[msg("Unauthorized caller")]
    Unauthorized, // 6026

    /// Invalid authority address
    #[msg("Invalid authority address")]
    InvalidAuthority, // 6027

    /// Withdrawal would touch user deposits
    #[msg("Amount exceeds withdrawable revenue")]
    InsufficientRevenue, // 6028

    /// External verifier returned no answer
    #[msg("Verifier returned no result")]
    VerifierNoResult, // 6029

    // ========== Invariant / Computation Errors (6030-6032) ==========

    /// Arithmetic overflow occurred
    #[msg("Arithmetic overflow")]
    ArithmeticOverflow, // 6030

    /// Accounting would go negative during settlement
    #[msg("Settlement invariant violated")]
    InvariantViolation, // 6031

    /// Poseidon rejected its input
    #[msg("Poseidon hashing failed")]
    HashFailure, // 6032
}

impl PaymasterError {
    /// Whether estimation mode may suppress this error.
    pub fn is_bypassable(&self) -> bool {
        matches!(
            self,
            PaymasterError::PoolNotFound
                | PaymasterError::EmptyPool
                | PaymasterError::NoActiveCredit
                | PaymasterError::AllSlotsOccupied
                | PaymasterError::NullifierAlreadyActive
                | PaymasterError::InsufficientPaymasterFunding
                | PaymasterError::InsufficientPoolDeposits
                | PaymasterError::CreditBudgetExceeded
                | PaymasterError::InsufficientCredit
                | PaymasterError::InvalidTreeDepth
                | PaymasterError::UnknownRoot
                | PaymasterError::ScopeMismatch
                | PaymasterError::MessageMismatch
                | PaymasterError::InvalidProof
        )
    }
}

/// Assert that `result` failed with `expected`.
#[cfg(test)]
pub(crate) fn assert_error<T: std::fmt::Debug>(result: Result<T>, expected: PaymasterError) {
    match result {
        Err(Error::AnchorError(err)) => {
            assert_eq!(err.error_code_number, u32::from(expected), "{}", err.error_msg)
        }
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}
