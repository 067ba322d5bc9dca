//! State account definitions for the privacy paymaster

pub mod credit;
pub mod member_leaf;
pub mod merkle_tree;
pub mod nullifier_usage;
pub mod paymaster_config;
pub mod pda;
pub mod pool;

pub use credit::{CreditState, MemberCredit, MAX_CREDIT_SLOTS};
pub use member_leaf::{MemberLeaf, PdaLeafRegistry};
pub use merkle_tree::MerkleTree;
pub use nullifier_usage::{NullifierUsage, UsageBook};
pub use paymaster_config::{PaymasterConfig, Vault};
pub use pool::{LeafRegistry, Pool, MAX_BATCH_SIZE, MAX_JOINING_FEE};
