//! Membership proof and its public signals
//!
//! # Membership Circuit Public Signals (4 total)
//! 1. merkle_root - Tree root the prover is a member of
//! 2. nullifier - Unique per prover and scope, unlinkable to the commitment
//! 3. hashed message - `keccak256(message) >> 8`, binds the proof to one request
//! 4. hashed scope - `keccak256(scope) >> 8`, binds the proof to one pool
//!
//! # Field Element Encoding
//! All values are encoded as 32-byte big-endian field elements
//! in the BN254 scalar field.

use anchor_lang::prelude::*;

use super::field::{hash_to_field, FieldElement, G1Point, G2Point};

/// Number of field elements carrying the Groth16 points.
pub const PROOF_POINT_COUNT: usize = 8;

/// Number of public signals for verification.
pub const PUBLIC_SIGNAL_COUNT: usize = 4;

/// Serialized size of [`MembershipProof`].
pub const MEMBERSHIP_PROOF_LEN: usize = 8 + 32 * 4 + 32 * PROOF_POINT_COUNT;

// ============================================================================
// PROOF STRUCTURE
// ============================================================================

/// A membership proof as carried in paymaster data.
///
/// Only the nullifier outlives validation; everything else is consumed once.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct MembershipProof {
    /// Depth of the tree the proof was generated against
    pub depth: u64,

    /// Root the prover claims membership of
    pub root: FieldElement,

    /// Nullifier for this activation
    pub nullifier: FieldElement,

    /// Request binding, must equal the request's message hash
    pub message: FieldElement,

    /// Pool binding, must equal the pool's scope
    pub scope: FieldElement,

    /// Groth16 points: A = (p0, p1), B = ((p2, p3), (p4, p5)), C = (p6, p7)
    pub points: [FieldElement; PROOF_POINT_COUNT],
}

impl MembershipProof {
    /// Point A ∈ G1
    pub fn point_a(&self) -> G1Point {
        [self.points[0], self.points[1]]
    }

    /// Point B ∈ G2
    pub fn point_b(&self) -> G2Point {
        [[self.points[2], self.points[3]], [self.points[4], self.points[5]]]
    }

    /// Point C ∈ G1
    pub fn point_c(&self) -> G1Point {
        [self.points[6], self.points[7]]
    }

    /// Public signals in circuit order.
    pub fn public_signals(&self) -> MembershipPublicSignals {
        MembershipPublicSignals::new(self.root, self.nullifier, &self.message, &self.scope)
    }
}

// ============================================================================
// PUBLIC SIGNALS
// ============================================================================

/// Public signals handed to the external verifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipPublicSignals {
    pub merkle_root: FieldElement,
    pub nullifier: FieldElement,
    pub hashed_message: FieldElement,
    pub hashed_scope: FieldElement,
}

impl MembershipPublicSignals {
    /// Build signals, hashing message and scope into the field.
    pub fn new(
        merkle_root: FieldElement,
        nullifier: FieldElement,
        message: &FieldElement,
        scope: &FieldElement,
    ) -> Self {
        Self {
            merkle_root,
            nullifier,
            hashed_message: hash_to_field(message),
            hashed_scope: hash_to_field(scope),
        }
    }

    /// Field elements in the order expected by the circuit.
    pub fn to_field_elements(&self) -> [FieldElement; PUBLIC_SIGNAL_COUNT] {
        [
            self.merkle_root,
            self.nullifier,
            self.hashed_message,
            self.hashed_scope,
        ]
    }
}

// ============================================================================
// TESTS
// ============================================================================
