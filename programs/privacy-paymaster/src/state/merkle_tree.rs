//! Lean incremental Merkle tree for member commitments
//!
//! Append-only LeanIMT: the tree grows one level only when the next leaf no
//! longer fits, and a node without a right sibling is carried up unchanged
//! instead of being hashed with a zero value. Only the rightmost node of
//! every level (`side_nodes`) is stored, giving O(depth) insertion with a
//! fixed-size account.
//!
//! # Root History
//! Every insertion writes the new root into a circular buffer of
//! [`ROOT_HISTORY_SIZE`] slots. Proofs name a slot by index; the slot must
//! still hold the proven root when the proof is checked, so a root stays
//! usable for the next 63 insertions.
//!
//! # Hash Function
//! Poseidon(left, right) over BN254 with circom parameters, see
//! `crypto/poseidon.rs`.

use anchor_lang::prelude::*;

use crate::crypto::field::{is_valid_field_element, is_zero, FieldElement, ZERO};
use crate::crypto::poseidon;
use crate::error::PaymasterError;

/// Maximum tree depth accepted by the membership circuit
pub const MAX_TREE_DEPTH: usize = 32;

/// Minimum depth a proof may claim
pub const MIN_PROOF_DEPTH: u64 = 1;

/// Maximum depth a proof may claim
pub const MAX_PROOF_DEPTH: u64 = MAX_TREE_DEPTH as u64;

/// Number of recent roots kept for proof verification
pub const ROOT_HISTORY_SIZE: usize = 64;

/// Commitment tree and root history of one pool.
///
/// PDA Seeds: `[b"merkle_tree", pool.key().as_ref()]`
#[account]
pub struct MerkleTree {
    /// Reference to parent pool
    pub pool: Pubkey,

    /// Number of leaves inserted
    pub size: u64,

    /// Current depth (0 while the tree holds at most one leaf)
    pub depth: u8,

    /// Rightmost node per level; `side_nodes[depth]` is the root
    pub side_nodes: [[u8; 32]; 33],

    /// Circular buffer of recent roots, zero = never written
    pub root_history: [[u8; 32]; 64],

    /// Slot holding the most recent root
    pub root_history_cursor: u32,
}

impl MerkleTree {
    /// Account space calculation
    pub const LEN: usize = 8 // discriminator
        + 32 // pool
        + 8  // size
        + 1  // depth
        + 32 * (MAX_TREE_DEPTH + 1) // side_nodes
        + 32 * ROOT_HISTORY_SIZE // root_history
        + 4; // root_history_cursor

    pub const SEED_PREFIX: &'static [u8] = b"merkle_tree";

    pub fn find_pda(program_id: &Pubkey, pool: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[Self::SEED_PREFIX, pool.as_ref()], program_id)
    }

    /// Empty tree owned by `pool`.
    pub fn new(pool: Pubkey) -> Self {
        Self {
            pool,
            size: 0,
            depth: 0,
            side_nodes: [ZERO; MAX_TREE_DEPTH + 1],
            root_history: [ZERO; ROOT_HISTORY_SIZE],
            root_history_cursor: 0,
        }
    }

    /// Reset in place, used right after account creation.
    pub fn initialize(&mut self, pool: Pubkey) {
        self.pool = pool;
        self.size = 0;
        self.depth = 0;
        self.side_nodes.fill(ZERO);
        self.root_history.fill(ZERO);
        self.root_history_cursor = 0;
    }

    /// Append a leaf and record the new root in history.
    ///
    /// # Returns
    /// `(new_root, leaf_index)`
    ///
    /// # Errors
    /// * `ZeroCommitment` - zero marks empty nodes
    /// * `CommitmentOutOfField` - leaf is not below the scalar modulus
    /// * `TreeDepthExceeded` - tree would outgrow the circuit
    pub fn insert(&mut self, leaf: FieldElement) -> Result<(FieldElement, u64)> {
        require!(!is_zero(&leaf), PaymasterError::ZeroCommitment);
        require!(
            is_valid_field_element(&leaf),
            PaymasterError::CommitmentOutOfField
        );

        let index = self.size;
        let new_size = index
            .checked_add(1)
            .ok_or(error!(PaymasterError::ArithmeticOverflow))?;

        let mut depth = self.depth as usize;
        if Self::capacity_at(depth) < new_size {
            depth += 1;
        }
        require!(depth <= MAX_TREE_DEPTH, PaymasterError::TreeDepthExceeded);

        let mut node = leaf;
        for level in 0..depth {
            if (index >> level) & 1 == 1 {
                node = poseidon::hash_pair(&self.side_nodes[level], &node)?;
            } else {
                self.side_nodes[level] = node;
            }
        }
        self.side_nodes[depth] = node;

        self.depth = depth as u8;
        self.size = new_size;
        self.push_root(node);

        Ok((node, index))
    }

    /// Leaves a tree of `depth` levels can hold.
    fn capacity_at(depth: usize) -> u64 {
        1u64.checked_shl(depth as u32).unwrap_or(u64::MAX)
    }

    fn push_root(&mut self, root: FieldElement) {
        let next = (self.root_history_cursor as usize + 1) % ROOT_HISTORY_SIZE;
        self.root_history[next] = root;
        self.root_history_cursor = next as u32;
    }

    /// Current root, zero for an empty tree.
    pub fn root(&self) -> FieldElement {
        if self.size == 0 {
            return ZERO;
        }
        self.side_nodes[self.depth as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Most recent root and its history slot.
    pub fn latest_root_info(&self) -> (FieldElement, u32) {
        let cursor = self.root_history_cursor;
        (self.root_history[cursor as usize], cursor)
    }

    /// Root stored at a history slot; `None` when out of range or never written.
    pub fn root_at(&self, index: u32) -> Option<FieldElement> {
        self.root_history
            .get(index as usize)
            .copied()
            .filter(|root| !is_zero(root))
    }

    /// Slot indices walked from the most recent backwards.
    fn history_indices(&self) -> impl Iterator<Item = usize> {
        let cursor = self.root_history_cursor as usize;
        (0..ROOT_HISTORY_SIZE).map(move |i| (cursor + ROOT_HISTORY_SIZE - i) % ROOT_HISTORY_SIZE)
    }

    /// All written roots, most recent first.
    pub fn valid_roots(&self) -> Vec<FieldElement> {
        self.history_indices()
            .map(|i| self.root_history[i])
            .filter(|root| !is_zero(root))
            .collect()
    }

    /// History slot of `root`, searching from the most recent.
    pub fn find_root_index(&self, root: &FieldElement) -> Option<u32> {
        if is_zero(root) {
            return None;
        }
        self.history_indices()
            .find(|&i| self.root_history[i] == *root)
            .map(|i| i as u32)
    }

    /// Whether `root` is still within the history window.
    pub fn is_known_root(&self, root: &FieldElement) -> bool {
        self.find_root_index(root).is_some()
    }
}
