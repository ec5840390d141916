//! Gasless authorizations: EIP-2612 permits and Permit2 allowances.

pub mod abi;
pub mod authorizer;

pub use authorizer::{permit2_domain, permit_domain, AuthorizerSettings, GaslessAuthorizer};
