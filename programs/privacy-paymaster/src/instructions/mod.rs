//! Instruction handlers for the privacy paymaster

pub mod add_member;
pub mod admin;
pub mod create_pool;
pub mod initialize_paymaster;
pub mod settle_sponsorship;
pub mod validate_sponsorship;
pub mod views;

pub use add_member::*;
pub use admin::*;
pub use create_pool::*;
pub use initialize_paymaster::*;
pub use settle_sponsorship::*;
pub use validate_sponsorship::*;
pub use views::*;
