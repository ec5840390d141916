//! Intent assembly and validation.
//!
//! Builders take user input as entered (address and amount strings) and
//! report the first violated rule with a specific reason, before anything
//! touches the network.

use crate::codec::encode_transfer;
use alloy::primitives::{Address, Bytes, B256, U256};
use routes_types::{
	AddressRegistry, Call, ChainId, Intent, Prover, ProverKind, QuoteEntry, Result, Reward,
	Route, RoutesError, TokenAmount,
};
use std::sync::Arc;
use tracing::debug;

/// Minimum distance between construction time and the intent deadline.
pub const MIN_DEADLINE_SECS: u64 = 60;
/// Default lifetime for intents proven by the hyper prover.
pub const HYPER_PROVER_TTL_SECS: u64 = 90 * 60;
/// Meta prover attestations land later, so intents live longer.
pub const META_PROVER_TTL_SECS: u64 = 150 * 60;

/// Input for a single-token transfer intent.
#[derive(Debug, Clone)]
pub struct SimpleIntentParams {
	pub creator: String,
	/// Defaults to the creator.
	pub recipient: Option<String>,
	pub origin_chain: ChainId,
	pub destination_chain: ChainId,
	/// Token delivered on the destination chain.
	pub route_token: String,
	/// Token paid on the origin chain.
	pub reward_token: String,
	/// Destination amount, decimal.
	pub amount: String,
	/// Most the creator is willing to spend on the origin chain, decimal.
	pub spending_token_limit: String,
	pub prover: Option<Prover>,
	/// Absolute deadline in Unix seconds.
	pub expiry_time: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenParams {
	pub token: String,
	pub amount: String,
}

#[derive(Debug, Clone, Default)]
pub struct CallParams {
	pub target: String,
	pub data: Bytes,
	/// Native value, decimal. Empty means zero.
	pub value: String,
}

/// Input for an intent with arbitrary destination calls.
#[derive(Debug, Clone)]
pub struct IntentParams {
	pub creator: String,
	pub origin_chain: ChainId,
	pub destination_chain: ChainId,
	pub calls: Vec<CallParams>,
	/// Tokens the solver must deliver on the destination chain.
	pub call_tokens: Vec<TokenParams>,
	/// Tokens offered as reward on the origin chain.
	pub tokens: Vec<TokenParams>,
	/// Native reward, decimal. Empty means zero.
	pub native_value: String,
	pub prover: Option<Prover>,
	pub expiry_time: Option<u64>,
}

/// A prover address together with how it was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedProver {
	pub address: Address,
	/// `None` for an explicit address.
	pub kind: Option<ProverKind>,
}

impl ResolvedProver {
	fn default_ttl(&self) -> u64 {
		match self.kind {
			Some(ProverKind::MetaProver) => META_PROVER_TTL_SECS,
			_ => HYPER_PROVER_TTL_SECS,
		}
	}
}

pub struct IntentBuilder {
	registry: Arc<dyn AddressRegistry>,
}

impl IntentBuilder {
	pub fn new(registry: Arc<dyn AddressRegistry>) -> Self {
		Self { registry }
	}

	pub fn build_simple_intent(&self, params: &SimpleIntentParams) -> Result<Intent> {
		self.build_simple_intent_at(params, unix_now())
	}

	/// As [`Self::build_simple_intent`], with an explicit clock.
	pub fn build_simple_intent_at(&self, params: &SimpleIntentParams, now: u64) -> Result<Intent> {
		let creator = parse_address("creator", &params.creator)?;
		let recipient = match &params.recipient {
			Some(recipient) => parse_address("recipient", recipient)?,
			None => creator,
		};

		ensure_distinct_chains(params.origin_chain, params.destination_chain)?;

		let amount = parse_amount("amount", &params.amount)?;
		let limit = parse_amount("spendingTokenLimit", &params.spending_token_limit)?;
		if limit < amount {
			return Err(RoutesError::validation(format!(
				"Insufficient spendingTokenLimit: {} is less than amount {}",
				limit, amount
			)));
		}

		let deadline = match params.expiry_time {
			Some(expiry) => check_deadline(expiry, now)?,
			None => now + HYPER_PROVER_TTL_SECS,
		};

		let route_token = parse_address("routeToken", &params.route_token)?;
		let reward_token = parse_address("rewardToken", &params.reward_token)?;

		let prover = self.resolve_prover(params.origin_chain, params.prover)?;
		let inbox = self.inbox(params.destination_chain)?;

		let route = Route {
			salt: random_salt(),
			source: params.origin_chain,
			destination: params.destination_chain,
			inbox,
			tokens: vec![TokenAmount::new(route_token, amount)],
			calls: vec![Call {
				target: route_token,
				data: encode_transfer(recipient, amount),
				value: U256::ZERO,
			}],
		};

		let reward = Reward {
			creator,
			prover: prover.address,
			deadline,
			native_value: U256::ZERO,
			tokens: vec![TokenAmount::new(reward_token, limit)],
		};

		debug!(
			source = %route.source,
			destination = %route.destination,
			amount = %amount,
			deadline,
			"Built simple intent"
		);

		Ok(Intent::new(route, reward))
	}

	pub fn build_intent(&self, params: &IntentParams) -> Result<Intent> {
		self.build_intent_at(params, unix_now())
	}

	pub fn build_intent_at(&self, params: &IntentParams, now: u64) -> Result<Intent> {
		let creator = parse_address("creator", &params.creator)?;
		ensure_distinct_chains(params.origin_chain, params.destination_chain)?;

		if params.calls.is_empty() {
			return Err(RoutesError::validation("calls must not be empty"));
		}
		if params.call_tokens.is_empty() {
			return Err(RoutesError::validation("callTokens must not be empty"));
		}
		if params.tokens.is_empty() {
			return Err(RoutesError::validation("tokens must not be empty"));
		}

		let calls = params
			.calls
			.iter()
			.enumerate()
			.map(|(i, call)| {
				Ok(Call {
					target: parse_address(&format!("calls[{}].target", i), &call.target)?,
					data: call.data.clone(),
					value: parse_optional_amount(&format!("calls[{}].value", i), &call.value)?,
				})
			})
			.collect::<Result<Vec<_>>>()?;
		let route_tokens = parse_tokens("callTokens", &params.call_tokens)?;
		let reward_tokens = parse_tokens("tokens", &params.tokens)?;
		let native_value = parse_optional_amount("nativeValue", &params.native_value)?;

		// The deadline default depends on the prover, so resolve it first.
		let prover = self.resolve_prover(params.origin_chain, params.prover)?;
		let deadline = match params.expiry_time {
			Some(expiry) => check_deadline(expiry, now)?,
			None => now + prover.default_ttl(),
		};
		let inbox = self.inbox(params.destination_chain)?;

		let route = Route {
			salt: random_salt(),
			source: params.origin_chain,
			destination: params.destination_chain,
			inbox,
			tokens: route_tokens,
			calls,
		};

		let reward = Reward {
			creator,
			prover: prover.address,
			deadline,
			native_value,
			tokens: reward_tokens,
		};

		debug!(
			source = %route.source,
			destination = %route.destination,
			calls = route.calls.len(),
			deadline,
			"Built intent"
		);

		Ok(Intent::new(route, reward))
	}

	/// Replaces the reward tokens with a solver's counter-proposal.
	///
	/// The returned intent has new hashes; the input is left untouched.
	pub fn apply_quote(intent: &Intent, entry: &QuoteEntry) -> Result<Intent> {
		if entry.reward_tokens.is_empty() {
			return Err(RoutesError::InvalidQuote(
				"quote entry carries no reward tokens".to_string(),
			));
		}
		Ok(intent.with_reward_tokens(entry.reward_tokens.clone()))
	}

	/// Resolves the prover for `chain`.
	///
	/// Without an explicit choice the hyper prover is preferred and the meta
	/// prover used as a fallback.
	pub fn resolve_prover(&self, chain: ChainId, prover: Option<Prover>) -> Result<ResolvedProver> {
		match prover {
			Some(Prover::Explicit(address)) => Ok(ResolvedProver {
				address,
				kind: None,
			}),
			Some(Prover::HyperProver) => self.lookup_prover(chain, ProverKind::HyperProver),
			Some(Prover::MetaProver) => self.lookup_prover(chain, ProverKind::MetaProver),
			None => self
				.lookup_prover(chain, ProverKind::HyperProver)
				.or_else(|_| self.lookup_prover(chain, ProverKind::MetaProver))
				.map_err(|_| RoutesError::NoProver {
					chain,
					prover_kind: ProverKind::HyperProver,
				}),
		}
	}

	fn lookup_prover(&self, chain: ChainId, kind: ProverKind) -> Result<ResolvedProver> {
		match self.registry.prover(chain, kind) {
			Some(address) if !address.is_zero() => Ok(ResolvedProver {
				address,
				kind: Some(kind),
			}),
			_ => Err(RoutesError::NoProver {
				chain,
				prover_kind: kind,
			}),
		}
	}

	fn inbox(&self, chain: ChainId) -> Result<Address> {
		self.registry
			.inbox(chain)
			.filter(|a| !a.is_zero())
			.ok_or_else(|| RoutesError::NoContract {
				chain,
				contract: "inbox".to_string(),
			})
	}
}

fn ensure_distinct_chains(origin: ChainId, destination: ChainId) -> Result<()> {
	if origin == destination {
		return Err(RoutesError::validation(format!(
			"originChainID and destinationChainID must differ (both {})",
			origin
		)));
	}
	Ok(())
}

fn check_deadline(expiry: u64, now: u64) -> Result<u64> {
	if expiry < now + MIN_DEADLINE_SECS {
		return Err(RoutesError::validation(format!(
			"expiryTime must be at least {} seconds in the future",
			MIN_DEADLINE_SECS
		)));
	}
	Ok(expiry)
}

/// Parses a 0x-prefixed 20-byte hex address.
pub fn parse_address(field: &str, value: &str) -> Result<Address> {
	let value = value.trim();
	let valid_shape = value.len() == 42 && value.starts_with("0x");
	if !valid_shape {
		return Err(RoutesError::validation(format!(
			"Invalid {} address: '{}'",
			field, value
		)));
	}
	value
		.parse::<Address>()
		.map_err(|_| RoutesError::validation(format!("Invalid {} address: '{}'", field, value)))
}

/// Parses a non-negative decimal integer of up to 256 bits.
pub fn parse_amount(field: &str, value: &str) -> Result<U256> {
	let value = value.trim();
	if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
		return Err(RoutesError::validation(format!(
			"Invalid {}: '{}' is not a non-negative integer",
			field, value
		)));
	}
	U256::from_str_radix(value, 10)
		.map_err(|_| RoutesError::validation(format!("Invalid {}: '{}' is out of range", field, value)))
}

fn parse_optional_amount(field: &str, value: &str) -> Result<U256> {
	if value.trim().is_empty() {
		Ok(U256::ZERO)
	} else {
		parse_amount(field, value)
	}
}

fn parse_tokens(field: &str, tokens: &[TokenParams]) -> Result<Vec<TokenAmount>> {
	tokens
		.iter()
		.enumerate()
		.map(|(i, t)| {
			Ok(TokenAmount::new(
				parse_address(&format!("{}[{}].token", field, i), &t.token)?,
				parse_amount(&format!("{}[{}].amount", field, i), &t.amount)?,
			))
		})
		.collect()
}

/// 128 random bits, right-aligned in a word.
fn random_salt() -> B256 {
	B256::from(U256::from(rand::random::<u128>()))
}

fn unix_now() -> u64 {
	chrono::Utc::now().timestamp().max(0) as u64
}
