//! Poseidon hashing for the commitment tree
//!
//! Tree nodes are `Poseidon(left, right)` over the BN254 scalar field with
//! circom-compatible parameters (t = 3, RF = 8, RP = 57), matching the
//! membership circuit. Inputs and outputs are 32-byte big-endian.

use anchor_lang::prelude::*;
use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonBytesHasher};

use crate::error::PaymasterError;

use super::field::FieldElement;

/// Hash two child nodes into their parent.
///
/// # Errors
/// * `HashFailure` if either input is not a canonical field element
pub fn hash_pair(left: &FieldElement, right: &FieldElement) -> Result<FieldElement> {
    let mut hasher =
        Poseidon::<Fr>::new_circom(2).map_err(|_| error!(PaymasterError::HashFailure))?;
    hasher
        .hash_bytes_be(&[left.as_slice(), right.as_slice()])
        .map_err(|_| error!(PaymasterError::HashFailure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::field::{is_valid_field_element, u64_to_field};

    #[test]
    fn test_hash_pair_deterministic() {
        let a = u64_to_field(1);
        let b = u64_to_field(2);
        assert_eq!(hash_pair(&a, &b).unwrap(), hash_pair(&a, &b).unwrap());
    }

    #[test]
    fn test_hash_pair_non_commutative() {
        let a = u64_to_field(1);
        let b = u64_to_field(2);
        assert_ne!(hash_pair(&a, &b).unwrap(), hash_pair(&b, &a).unwrap());
    }

    #[test]
    fn test_hash_output_is_field_element() {
        let h = hash_pair(&u64_to_field(42), &u64_to_field(43)).unwrap();
        assert!(is_valid_field_element(&h));
    }
}
