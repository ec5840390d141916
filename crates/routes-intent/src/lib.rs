//! Intent construction and canonical hashing.

pub mod abi;
pub mod builder;
pub mod codec;

pub use builder::{
	CallParams, IntentBuilder, IntentParams, ResolvedProver, SimpleIntentParams, TokenParams,
};
pub use codec::{hash_intent, intent_hash, IntentHashes};
