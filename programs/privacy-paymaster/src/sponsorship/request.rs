//! Sponsored request and paymaster data decoding
//!
//! # Paymaster Data Layout
//! ```text
//! [0..32]   paymaster program id
//! [32..40]  paymaster verification units (LE)
//! [40..48]  post-settlement units (LE)
//! [48..]    route payload
//! ```
//! The payload length alone selects the route: 9 bytes for the cached
//! route, 405 bytes for the activation route. Anything else is rejected
//! before any state is read.

use anchor_lang::prelude::*;
use solana_program::keccak;

use crate::crypto::field::FieldElement;
use crate::crypto::public_inputs::{MembershipProof, MEMBERSHIP_PROOF_LEN};
use crate::error::PaymasterError;

/// Length of the non-proof prefix of paymaster data
pub const PAYMASTER_DATA_PREFIX_LEN: usize = 32 + 8 + 8;

/// Cached payload: estimation flag + pool id
pub const CACHED_PAYLOAD_LEN: usize = 1 + 8;

/// Activation payload: config + pool id + proof
pub const ACTIVATION_PAYLOAD_LEN: usize = ActivationConfig::LEN + 8 + MEMBERSHIP_PROOF_LEN;

pub const CACHED_DATA_LEN: usize = PAYMASTER_DATA_PREFIX_LEN + CACHED_PAYLOAD_LEN;

pub const ACTIVATION_DATA_LEN: usize = PAYMASTER_DATA_PREFIX_LEN + ACTIVATION_PAYLOAD_LEN;

/// A request whose fee the paymaster is asked to cover.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct SponsoredRequest {
    pub sender: Pubkey,
    pub nonce: u64,
    pub call_data: Vec<u8>,
    pub call_units: u64,
    pub verification_units: u64,
    pub pre_verification_units: u64,
    pub max_fee_per_unit: u64,
    pub max_priority_fee_per_unit: u64,
    pub paymaster_data: Vec<u8>,
}

impl SponsoredRequest {
    /// Hash binding a membership proof to exactly this request.
    ///
    /// Covers every immutable request field and the non-proof prefix of the
    /// paymaster data, so the proof cannot be moved to another request.
    pub fn message_hash(&self, program_id: &Pubkey, chain_id: u64) -> Result<FieldElement> {
        let prefix = self
            .paymaster_data
            .get(..PAYMASTER_DATA_PREFIX_LEN)
            .ok_or(error!(PaymasterError::InvalidPaymasterDataLength))?;

        let call_data_hash = keccak::hash(&self.call_data);
        let prefix_hash = keccak::hash(prefix);

        Ok(keccak::hashv(&[
            self.sender.as_ref(),
            &self.nonce.to_be_bytes(),
            call_data_hash.as_ref(),
            &self.call_units.to_be_bytes(),
            &self.verification_units.to_be_bytes(),
            &self.pre_verification_units.to_be_bytes(),
            &self.max_fee_per_unit.to_be_bytes(),
            &self.max_priority_fee_per_unit.to_be_bytes(),
            prefix_hash.as_ref(),
            program_id.as_ref(),
            &chain_id.to_be_bytes(),
        ])
        .to_bytes())
    }
}

/// Non-proof prefix of paymaster data.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PaymasterDataPrefix {
    pub paymaster: Pubkey,
    pub verification_units: u64,
    pub post_units: u64,
}

/// Activation settings chosen by the prover.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivationConfig {
    /// Root history slot the proof was generated against
    pub root_index: u32,

    /// Suppress bypassable failures for cost estimation
    pub estimation: bool,
}

impl ActivationConfig {
    pub const LEN: usize = 4 + 1;
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ActivationPayload {
    pub config: ActivationConfig,
    pub pool_id: u64,
    pub proof: MembershipProof,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachedPayload {
    pub estimation: bool,
    pub pool_id: u64,
}

/// Validation route selected by paymaster data length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SponsorshipRoute {
    /// Proof-backed, establishes a new credit
    Activation(ActivationPayload),
    /// Ledger-backed, spends an existing credit
    Cached(CachedPayload),
}

impl SponsorshipRoute {
    /// Decode paymaster data addressed to `program_id`.
    ///
    /// # Errors
    /// * `InvalidPaymasterDataLength` - length matches neither route
    /// * `PaymasterMismatch` - prefix names another program
    /// * `MalformedPayload` - payload is not valid borsh
    pub fn decode(paymaster_data: &[u8], program_id: &Pubkey) -> Result<Self> {
        let len = paymaster_data.len();
        require!(
            len == CACHED_DATA_LEN || len == ACTIVATION_DATA_LEN,
            PaymasterError::InvalidPaymasterDataLength
        );

        let (prefix, payload) = paymaster_data.split_at(PAYMASTER_DATA_PREFIX_LEN);
        let prefix = PaymasterDataPrefix::try_from_slice(prefix)
            .map_err(|_| error!(PaymasterError::MalformedPayload))?;
        require_keys_eq!(
            prefix.paymaster,
            *program_id,
            PaymasterError::PaymasterMismatch
        );

        let route = if len == CACHED_DATA_LEN {
            Self::Cached(
                CachedPayload::try_from_slice(payload)
                    .map_err(|_| error!(PaymasterError::MalformedPayload))?,
            )
        } else {
            Self::Activation(
                ActivationPayload::try_from_slice(payload)
                    .map_err(|_| error!(PaymasterError::MalformedPayload))?,
            )
        };
        Ok(route)
    }

    pub fn pool_id(&self) -> u64 {
        match self {
            Self::Activation(payload) => payload.pool_id,
            Self::Cached(payload) => payload.pool_id,
        }
    }

    pub fn is_estimation(&self) -> bool {
        match self {
            Self::Activation(payload) => payload.config.estimation,
            Self::Cached(payload) => payload.estimation,
        }
    }
}

/// Encode paymaster data for the cached route.
pub fn encode_cached(program_id: &Pubkey, units: (u64, u64), payload: &CachedPayload) -> Vec<u8> {
    let mut data = Vec::with_capacity(CACHED_DATA_LEN);
    encode_prefix(&mut data, program_id, units);
    data.push(u8::from(payload.estimation));
    data.extend_from_slice(&payload.pool_id.to_le_bytes());
    data
}

/// Encode paymaster data for the activation route.
pub fn encode_activation(
    program_id: &Pubkey,
    units: (u64, u64),
    payload: &ActivationPayload,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(ACTIVATION_DATA_LEN);
    encode_prefix(&mut data, program_id, units);
    data.extend_from_slice(&payload.config.root_index.to_le_bytes());
    data.push(u8::from(payload.config.estimation));
    data.extend_from_slice(&payload.pool_id.to_le_bytes());

    let proof = &payload.proof;
    data.extend_from_slice(&proof.depth.to_le_bytes());
    for value in [&proof.root, &proof.nullifier, &proof.message, &proof.scope] {
        data.extend_from_slice(value);
    }
    for point in &proof.points {
        data.extend_from_slice(point);
    }
    data
}

fn encode_prefix(data: &mut Vec<u8>, program_id: &Pubkey, (verification, post): (u64, u64)) {
    data.extend_from_slice(program_id.as_ref());
    data.extend_from_slice(&verification.to_le_bytes());
    data.extend_from_slice(&post.to_le_bytes());
}
