//! Values passed from validation to settlement
//!
//! The context is the only channel between the two phases. It is tagged by
//! route and carries everything settlement needs, so settlement never
//! re-derives anything from state that may have moved in between.

use anchor_lang::prelude::*;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum SettlementContext {
    Activation {
        request_id: [u8; 32],
        pool_id: u64,
        nullifier: [u8; 32],
        account: Pubkey,
        /// Validated ceiling on the settlement charge
        max_charge: u64,
    },
    Cached {
        request_id: [u8; 32],
        pool_id: u64,
        account: Pubkey,
        max_charge: u64,
    },
}

impl SettlementContext {
    pub fn request_id(&self) -> [u8; 32] {
        match self {
            Self::Activation { request_id, .. } | Self::Cached { request_id, .. } => *request_id,
        }
    }

    pub fn pool_id(&self) -> u64 {
        match self {
            Self::Activation { pool_id, .. } | Self::Cached { pool_id, .. } => *pool_id,
        }
    }

    pub fn account(&self) -> Pubkey {
        match self {
            Self::Activation { account, .. } | Self::Cached { account, .. } => *account,
        }
    }

    /// Most settlement may take from credit and deposits.
    pub fn max_charge(&self) -> u64 {
        match self {
            Self::Activation { max_charge, .. } | Self::Cached { max_charge, .. } => *max_charge,
        }
    }

    /// Nullifier activated by the request, if any.
    pub fn nullifier(&self) -> Option<[u8; 32]> {
        match self {
            Self::Activation { nullifier, .. } => Some(*nullifier),
            Self::Cached { .. } => None,
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// All checks passed
    Valid,
    /// Estimation mode suppressed at least one failure
    WouldFail,
}

/// Returned by `validate_sponsorship` through return data.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    pub context: SettlementContext,
    pub outcome: ValidationOutcome,
}

/// How the sponsored request ended; accounting is the same for both.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettlementMode {
    Succeeded,
    Reverted,
}
