//! Cryptographic primitives for the privacy paymaster
//!
//! Proof verification itself is delegated to an external verifier program;
//! this module only prepares and checks the values that go into it.

pub mod field;
pub mod poseidon;
pub mod public_inputs;
pub mod verifier;

pub use field::{hash_to_field, is_valid_field_element, is_zero, FieldElement, ZERO};
pub use poseidon::hash_pair;
pub use public_inputs::{MembershipProof, MembershipPublicSignals};
pub use verifier::{MembershipVerifier, VerifierProgram};
