//! Admin Instructions for the privacy paymaster

pub mod update_authority;
pub mod withdraw_revenue;

pub use update_authority::*;
pub use withdraw_revenue::*;
