//! Program-derived accounts created outside `#[derive(Accounts)]`
//!
//! Member leaves (batch joins) and nullifier usage records arrive through
//! `remaining_accounts`, so their creation cannot use the `init` constraint.
//! Creation follows what `init` generates, including for an address that
//! already holds lamports.

use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Allocate, Assign, CreateAccount, Transfer};

use crate::error::PaymasterError;

/// Find the supplied account at `address`.
pub fn find_supplied<'a, 'info>(
    accounts: &'a [AccountInfo<'info>],
    address: &Pubkey,
) -> Option<&'a AccountInfo<'info>> {
    accounts.iter().find(|info| info.key == address)
}

/// Whether the account has been created and is owned by this program.
pub fn is_initialized(info: &AccountInfo, program_id: &Pubkey) -> bool {
    info.owner == program_id && !info.data_is_empty()
}

/// How a rent-exempt account is brought into existence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreationPlan {
    /// Empty address: a single `create_account` funding the full rent
    Create { lamports: u64 },
    /// Address already holds lamports: top up the rent, then allocate and assign
    Adopt { shortfall: u64 },
}

pub fn plan_creation(current_lamports: u64, required_lamports: u64) -> CreationPlan {
    if current_lamports == 0 {
        CreationPlan::Create {
            lamports: required_lamports,
        }
    } else {
        CreationPlan::Adopt {
            shortfall: required_lamports.saturating_sub(current_lamports),
        }
    }
}

/// Create a rent-exempt PDA owned by this program and write `value` into it.
pub fn create_and_write<'info, T: AccountSerialize>(
    payer: &AccountInfo<'info>,
    target: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    signer_seeds: &[&[u8]],
    space: usize,
    program_id: &Pubkey,
    value: &T,
) -> Result<()> {
    let required = Rent::get()?.minimum_balance(space);
    let signer = [signer_seeds];

    match plan_creation(target.lamports(), required) {
        CreationPlan::Create { lamports } => {
            system_program::create_account(
                CpiContext::new_with_signer(
                    system_program.clone(),
                    CreateAccount {
                        from: payer.clone(),
                        to: target.clone(),
                    },
                    &signer,
                ),
                lamports,
                space as u64,
                program_id,
            )?;
        }
        CreationPlan::Adopt { shortfall } => {
            if shortfall > 0 {
                system_program::transfer(
                    CpiContext::new(
                        system_program.clone(),
                        Transfer {
                            from: payer.clone(),
                            to: target.clone(),
                        },
                    ),
                    shortfall,
                )?;
            }
            system_program::allocate(
                CpiContext::new_with_signer(
                    system_program.clone(),
                    Allocate {
                        account_to_allocate: target.clone(),
                    },
                    &signer,
                ),
                space as u64,
            )?;
            system_program::assign(
                CpiContext::new_with_signer(
                    system_program.clone(),
                    Assign {
                        account_to_assign: target.clone(),
                    },
                    &signer,
                ),
                program_id,
            )?;
        }
    }

    write(target, value)
}

/// Overwrite the data of an existing program account.
pub fn write<T: AccountSerialize>(target: &AccountInfo, value: &T) -> Result<()> {
    let mut data = target.try_borrow_mut_data()?;
    let mut cursor: &mut [u8] = &mut data;
    value.try_serialize(&mut cursor)
}

/// Read a program account, checking owner and discriminator.
pub fn read<T: AccountDeserialize>(info: &AccountInfo, program_id: &Pubkey) -> Result<T> {
    require_keys_eq!(*info.owner, *program_id, PaymasterError::Unauthorized);
    let data = info.try_borrow_data()?;
    let mut slice: &[u8] = &data;
    T::try_deserialize(&mut slice)
}
