//! Two-phase sponsorship engine
//!
//! `validate` authorizes spending up to a bound and produces a
//! [`SettlementContext`]; `settle` charges the actual cost. The engine works
//! on plain values and an injected [`MembershipVerifier`]; instruction
//! handlers load those values from accounts and write them back.
//!
//! [`MembershipVerifier`]: crate::crypto::verifier::MembershipVerifier

pub mod context;
pub mod request;
pub mod settlement;
pub mod validation;

pub use context::{SettlementContext, SettlementMode, ValidationOutcome, ValidationResult};
pub use request::{SponsoredRequest, SponsorshipRoute};
pub use settlement::{settle, SettlementLedger, SettlementReceipt};
pub use validation::{validate_request, CheckLedger, ValidationState};
