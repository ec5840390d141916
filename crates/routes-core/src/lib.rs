//! End-to-end publishing of cross-chain intents.
//!
//! The [`PublishOrchestrator`] takes a built and quoted intent through
//! approval or permit signing, submission, source-chain confirmation and
//! destination-chain fulfillment.

pub mod lifecycle;
pub mod orchestrator;
pub mod watch;

#[cfg(test)]
mod test_utils;

pub use orchestrator::{
	intent_created_hash, intent_funded_hash, PublishError, PublishOrchestrator, PublishRequest,
	PublishResult, QuoteReference,
};
pub use watch::{Fulfillment, FulfillmentWatch};
