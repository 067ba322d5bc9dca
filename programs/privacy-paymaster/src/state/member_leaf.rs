//! Member leaf markers using per-commitment PDA pattern
//!
//! Each admitted commitment gets its own account, so "is this commitment
//! already in the pool" is an account existence check instead of a tree
//! scan.

use anchor_lang::prelude::*;

use crate::crypto::field::FieldElement;
use crate::error::PaymasterError;

use super::pda;
use super::pool::LeafRegistry;

/// Marker for a commitment admitted to a pool.
///
/// PDA Seeds: `[b"member", pool.key().as_ref(), commitment.as_ref()]`
#[account]
pub struct MemberLeaf {
    /// Reference to parent pool
    pub pool: Pubkey,

    /// The admitted commitment
    pub commitment: [u8; 32],

    /// Position in the pool's tree
    pub leaf_index: u64,

    /// PDA bump seed
    pub bump: u8,
}

impl MemberLeaf {
    /// Account space
    pub const LEN: usize = 8  // discriminator
        + 32                  // pool
        + 32                  // commitment
        + 8                   // leaf_index
        + 1;                  // bump

    pub const SEED_PREFIX: &'static [u8] = b"member";

    /// Derive the PDA address for a commitment
    pub fn find_pda(program_id: &Pubkey, pool: &Pubkey, commitment: &FieldElement) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[Self::SEED_PREFIX, pool.as_ref(), commitment.as_ref()],
            program_id,
        )
    }
}

/// [`LeafRegistry`] backed by `MemberLeaf` accounts passed as remaining accounts.
pub struct PdaLeafRegistry<'a, 'info> {
    program_id: &'a Pubkey,
    pool: Pubkey,
    accounts: &'a [AccountInfo<'info>],
    payer: &'a AccountInfo<'info>,
    system_program: &'a AccountInfo<'info>,
}

impl<'a, 'info> PdaLeafRegistry<'a, 'info> {
    pub fn new(
        program_id: &'a Pubkey,
        pool: Pubkey,
        accounts: &'a [AccountInfo<'info>],
        payer: &'a AccountInfo<'info>,
        system_program: &'a AccountInfo<'info>,
    ) -> Self {
        Self {
            program_id,
            pool,
            accounts,
            payer,
            system_program,
        }
    }

    fn leaf_account(&self, commitment: &FieldElement) -> Result<(&'a AccountInfo<'info>, u8)> {
        let (address, bump) = MemberLeaf::find_pda(self.program_id, &self.pool, commitment);
        let info = pda::find_supplied(self.accounts, &address)
            .ok_or(error!(PaymasterError::MissingLeafAccount))?;
        Ok((info, bump))
    }
}

impl<'a, 'info> LeafRegistry for PdaLeafRegistry<'a, 'info> {
    fn contains(&self, commitment: &FieldElement) -> Result<bool> {
        let (info, _) = self.leaf_account(commitment)?;
        Ok(pda::is_initialized(info, self.program_id))
    }

    fn record(&mut self, commitment: &FieldElement, leaf_index: u64) -> Result<()> {
        let (info, bump) = self.leaf_account(commitment)?;
        let leaf = MemberLeaf {
            pool: self.pool,
            commitment: *commitment,
            leaf_index,
            bump,
        };
        let bump_seed = [bump];
        pda::create_and_write(
            self.payer,
            info,
            self.system_program,
            &[
                MemberLeaf::SEED_PREFIX,
                self.pool.as_ref(),
                commitment.as_ref(),
                &bump_seed,
            ],
            MemberLeaf::LEN,
            self.program_id,
            &leaf,
        )
    }
}
