//! Membership proof verification boundary
//!
//! The paymaster never checks Groth16 pairings itself. It formats the
//! public signals and asks an external verifier program, whose answer is
//! final: no caching, no reinterpretation.
//!
//! # Wire Protocol
//! The verifier is invoked by CPI with no accounts and instruction data
//! `sighash("global:verify_proof") || borsh(VerifyProofArgs)`. It answers
//! through program return data: a single byte, `1` for a valid proof.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::hash::hash;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::program::{get_return_data, invoke};

use crate::error::PaymasterError;

use super::field::{FieldElement, G1Point, G2Point};
use super::public_inputs::PUBLIC_SIGNAL_COUNT;

/// Oracle answering whether a membership proof is valid.
pub trait MembershipVerifier {
    fn verify(
        &self,
        point_a: &G1Point,
        point_b: &G2Point,
        point_c: &G1Point,
        public_signals: &[FieldElement; PUBLIC_SIGNAL_COUNT],
        depth: u64,
    ) -> Result<bool>;
}

/// Arguments of the verifier's `verify_proof` instruction.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct VerifyProofArgs {
    pub point_a: G1Point,
    pub point_b: G2Point,
    pub point_c: G1Point,
    pub public_signals: [FieldElement; PUBLIC_SIGNAL_COUNT],
    pub depth: u64,
}

/// Anchor-style discriminator of the verifier's `verify_proof` instruction.
pub fn verify_proof_discriminator() -> [u8; 8] {
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash(b"global:verify_proof").to_bytes()[..8]);
    discriminator
}

/// External verifier program reached through CPI.
pub struct VerifierProgram<'a, 'info> {
    program: &'a AccountInfo<'info>,
}

impl<'a, 'info> VerifierProgram<'a, 'info> {
    pub fn new(program: &'a AccountInfo<'info>) -> Self {
        Self { program }
    }
}

impl<'a, 'info> MembershipVerifier for VerifierProgram<'a, 'info> {
    fn verify(
        &self,
        point_a: &G1Point,
        point_b: &G2Point,
        point_c: &G1Point,
        public_signals: &[FieldElement; PUBLIC_SIGNAL_COUNT],
        depth: u64,
    ) -> Result<bool> {
        let args = VerifyProofArgs {
            point_a: *point_a,
            point_b: *point_b,
            point_c: *point_c,
            public_signals: *public_signals,
            depth,
        };

        let mut data = verify_proof_discriminator().to_vec();
        args.serialize(&mut data)
            .map_err(|_| ProgramError::InvalidInstructionData)?;

        let instruction = Instruction {
            program_id: *self.program.key,
            accounts: vec![],
            data,
        };
        invoke(&instruction, &[self.program.clone()])?;

        match get_return_data() {
            Some((program_id, answer)) if program_id == *self.program.key => {
                Ok(answer.first() == Some(&1))
            }
            _ => err!(PaymasterError::VerifierNoResult),
        }
    }
}

/// Configurable verifier for tests; records how often it was asked.
#[cfg(test)]
pub struct StubVerifier {
    pub accept: bool,
    pub calls: std::cell::Cell<u32>,
}

#[cfg(test)]
impl StubVerifier {
    pub fn accepting() -> Self {
        Self { accept: true, calls: std::cell::Cell::new(0) }
    }

    pub fn rejecting() -> Self {
        Self { accept: false, calls: std::cell::Cell::new(0) }
    }
}

#[cfg(test)]
impl MembershipVerifier for StubVerifier {
    fn verify(
        &self,
        _point_a: &G1Point,
        _point_b: &G2Point,
        _point_c: &G1Point,
        _public_signals: &[FieldElement; PUBLIC_SIGNAL_COUNT],
        _depth: u64,
    ) -> Result<bool> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.accept)
    }
}
