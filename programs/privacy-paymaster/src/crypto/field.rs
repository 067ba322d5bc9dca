//! BN254 scalar field helpers
//!
//! Every value that crosses into the membership circuit (tree leaves, roots,
//! nullifiers, hashed message and scope) is a 32-byte big-endian element of
//! the BN254 scalar field.

use num_bigint::BigUint;
use num_traits::Zero;
use solana_program::keccak;

// ============================================================================
// BN254 CURVE PARAMETERS
// ============================================================================

/// BN254 scalar field modulus (r), big-endian.
/// r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
pub const BN254_SCALAR_MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29,
    0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91,
    0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

/// Scalar field element (32 bytes, big-endian).
pub type FieldElement = [u8; 32];

/// G1 point as two big-endian coordinates.
pub type G1Point = [FieldElement; 2];

/// G2 point as two Fp2 coordinates.
pub type G2Point = [[FieldElement; 2]; 2];

/// The all-zero element, used as the "empty" marker everywhere.
pub const ZERO: FieldElement = [0u8; 32];

// ============================================================================
// SCALAR FIELD OPERATIONS
// ============================================================================

/// Check if a value is the zero element.
#[inline]
pub fn is_zero(value: &FieldElement) -> bool {
    value.iter().all(|&b| b == 0)
}

/// Check if a big-endian value is strictly below the field modulus.
#[inline]
pub fn is_valid_field_element(value: &FieldElement) -> bool {
    value.as_slice() < BN254_SCALAR_MODULUS.as_slice()
}

/// Hash arbitrary 32 bytes into the field: `keccak256(value) >> 8`.
///
/// Dropping the low byte keeps the result below 2^248 < r, which is how
/// the circuit expects message and scope to be committed.
pub fn hash_to_field(value: &FieldElement) -> FieldElement {
    let digest = keccak::hash(value).to_bytes();
    let mut out = [0u8; 32];
    out[1..].copy_from_slice(&digest[..31]);
    out
}

/// Reduce a 32-byte big-endian value modulo r.
pub fn reduce_to_field(value: &[u8; 32]) -> FieldElement {
    let modulus = BigUint::from_bytes_be(&BN254_SCALAR_MODULUS);
    let reduced = BigUint::from_bytes_be(value) % modulus;
    if reduced.is_zero() {
        return ZERO;
    }

    let bytes = reduced.to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Convert u64 to a field element (big-endian, last 8 bytes).
#[inline]
pub fn u64_to_field(value: u64) -> FieldElement {
    let mut bytes = [0u8; 32];
    bytes[24..32].copy_from_slice(&value.to_be_bytes());
    bytes
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn modulus_minus_one() -> FieldElement {
        let mut value = BN254_SCALAR_MODULUS;
        value[31] -= 1;
        value
    }

    #[test]
    fn test_field_bounds() {
        assert!(is_valid_field_element(&ZERO));
        assert!(is_valid_field_element(&u64_to_field(12345)));
        assert!(is_valid_field_element(&modulus_minus_one()));
        assert!(!is_valid_field_element(&BN254_SCALAR_MODULUS));
        assert!(!is_valid_field_element(&[0xffu8; 32]));
    }

    #[test]
    fn test_hash_to_field_top_byte_cleared() {
        let hashed = hash_to_field(&[0xabu8; 32]);
        assert_eq!(hashed[0], 0);
        assert!(is_valid_field_element(&hashed));
        assert_eq!(hashed, hash_to_field(&[0xabu8; 32]));
    }

    #[test]
    fn test_reduce_to_field() {
        assert_eq!(reduce_to_field(&BN254_SCALAR_MODULUS), ZERO);
        assert_eq!(reduce_to_field(&u64_to_field(7)), u64_to_field(7));

        let mut above = BN254_SCALAR_MODULUS;
        above[31] += 5;
        assert_eq!(reduce_to_field(&above), u64_to_field(5));

        assert!(is_valid_field_element(&reduce_to_field(&[0xffu8; 32])));
    }

    #[test]
    fn test_u64_to_field() {
        let value = 0x0102030405060708u64;
        let field = u64_to_field(value);
        assert!(field[..24].iter().all(|&b| b == 0));
        assert_eq!(&field[24..], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    }
}
