//! Shared types for the cross-chain routes client.
//!
//! Everything that crosses a crate boundary lives here: the intent value
//! types, solver quotes, gasless authorizations, publish execution state,
//! chain-level transaction types and the error taxonomy.

pub mod chain;
pub mod errors;
pub mod execution;
pub mod intent;
pub mod permit;
pub mod quote;
pub mod registry;

pub use chain::*;
pub use errors::*;
pub use execution::*;
pub use intent::*;
pub use permit::*;
pub use quote::*;
pub use registry::*;

/// Re-exported primitives so downstream crates agree on one set of types.
pub use alloy::primitives::{Address, Bytes, B256, U256};
