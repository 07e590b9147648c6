//! Claim data structures and JSON claim loading

mod data;
pub mod loader;

pub use data::{validate_periods, Claim, ClaimContext, LateDeclaration, Status, StoppagePeriod};
pub use loader::{load_claim, load_claim_from_reader, parse_claim_json, parse_claims_json};
