//! Canonical intent encoding and hashing.
//!
//! `routeHash = keccak256(abi.encode(route))`, likewise for the reward, and
//! `intentHash = keccak256(routeHash ++ rewardHash)`. The same bytes are
//! produced on-chain by the intent source, so any divergence here makes the
//! client track an intent that does not exist.

use crate::abi;
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::{SolCall, SolValue};
use routes_types::{Call, Intent, Reward, Route, TokenAmount};

/// All three hashes of one intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentHashes {
	pub route_hash: B256,
	pub reward_hash: B256,
	pub intent_hash: B256,
}

pub fn encode_route(route: &Route) -> Bytes {
	sol_route(route).abi_encode().into()
}

pub fn encode_reward(reward: &Reward) -> Bytes {
	sol_reward(reward).abi_encode().into()
}

pub fn route_hash(route: &Route) -> B256 {
	keccak256(encode_route(route))
}

pub fn reward_hash(reward: &Reward) -> B256 {
	keccak256(encode_reward(reward))
}

pub fn hash_intent(intent: &Intent) -> IntentHashes {
	let route_hash = route_hash(&intent.route);
	let reward_hash = reward_hash(&intent.reward);

	let mut preimage = [0u8; 64];
	preimage[..32].copy_from_slice(route_hash.as_slice());
	preimage[32..].copy_from_slice(reward_hash.as_slice());

	IntentHashes {
		route_hash,
		reward_hash,
		intent_hash: keccak256(preimage),
	}
}

pub fn intent_hash(intent: &Intent) -> B256 {
	hash_intent(intent).intent_hash
}

/// Calldata for `transfer(to, amount)` on an ERC-20 token.
pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
	abi::IERC20Transfer::transferCall { to, amount }
		.abi_encode()
		.into()
}

/// Recipient and amount of an ERC-20 `transfer` call, or `None` for any
/// other calldata.
pub fn decode_transfer(data: &[u8]) -> Option<(Address, U256)> {
	if data.len() < 4 || data[..4] != abi::IERC20Transfer::transferCall::SELECTOR {
		return None;
	}
	abi::IERC20Transfer::transferCall::abi_decode(data)
		.ok()
		.map(|call| (call.to, call.amount))
}

pub fn is_transfer_call(call: &Call) -> bool {
	decode_transfer(&call.data).is_some()
}

/// The intent as the intent source contract expects it in calldata.
pub fn sol_intent(intent: &Intent) -> abi::Intent {
	abi::Intent {
		route: sol_route(&intent.route),
		reward: sol_reward(&intent.reward),
	}
}

fn sol_route(route: &Route) -> abi::Route {
	abi::Route {
		salt: route.salt,
		source: U256::from(route.source.0),
		destination: U256::from(route.destination.0),
		inbox: route.inbox,
		tokens: route.tokens.iter().map(sol_token).collect(),
		calls: route
			.calls
			.iter()
			.map(|c| abi::Call {
				target: c.target,
				data: c.data.clone(),
				value: c.value,
			})
			.collect(),
	}
}

fn sol_reward(reward: &Reward) -> abi::Reward {
	abi::Reward {
		creator: reward.creator,
		prover: reward.prover,
		deadline: U256::from(reward.deadline),
		nativeValue: reward.native_value,
		tokens: reward.tokens.iter().map(sol_token).collect(),
	}
}

fn sol_token(token: &TokenAmount) -> abi::TokenAmount {
	abi::TokenAmount {
		token: token.token,
		amount: token.amount,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use routes_types::ChainId;

	fn sample_intent() -> Intent {
		let usdc = Address::repeat_byte(0xaa);
		let recipient = Address::repeat_byte(0x05);
		Intent::new(
			Route {
				salt: B256::from(U256::from(0x1234_u64)),
				source: ChainId::OPTIMISM,
				destination: ChainId::BASE,
				inbox: Address::repeat_byte(0x01),
				tokens: vec![TokenAmount::new(usdc, U256::from(1_000_000))],
				calls: vec![Call {
					target: usdc,
					data: encode_transfer(recipient, U256::from(1_000_000)),
					value: U256::ZERO,
				}],
			},
			Reward {
				creator: Address::repeat_byte(0x02),
				prover: Address::repeat_byte(0x03),
				deadline: 1_700_000_000,
				native_value: U256::ZERO,
				tokens: vec![TokenAmount::new(
					Address::repeat_byte(0xbb),
					U256::from(1_010_000),
				)],
			},
		)
	}

	#[test]
	fn test_intent_hash_is_hash_of_sub_hashes() {
		let intent = sample_intent();
		let hashes = hash_intent(&intent);

		let mut concatenated = hashes.route_hash.to_vec();
		concatenated.extend_from_slice(hashes.reward_hash.as_slice());
		assert_eq!(hashes.intent_hash, keccak256(&concatenated));
		assert_eq!(hashes.route_hash, keccak256(encode_route(&intent.route)));
	}

	#[test]
	fn test_hash_is_deterministic() {
		let a = sample_intent();
		let b = sample_intent();
		assert_eq!(hash_intent(&a), hash_intent(&b));
	}

	#[test]
	fn test_reward_change_only_moves_reward_hash() {
		let intent = sample_intent();
		let original = hash_intent(&intent);

		let same = intent.with_reward_tokens(intent.reward.tokens.clone());
		assert_eq!(hash_intent(&same), original);

		let adjusted = intent.with_reward_tokens(vec![TokenAmount::new(
			Address::repeat_byte(0xbb),
			U256::from(1_020_000),
		)]);
		let changed = hash_intent(&adjusted);
		assert_eq!(changed.route_hash, original.route_hash);
		assert_ne!(changed.reward_hash, original.reward_hash);
		assert_ne!(changed.intent_hash, original.intent_hash);
	}

	#[test]
	fn test_route_encoding_is_dynamic_tuple() {
		let encoded = encode_route(&sample_intent().route);
		// abi.encode of a dynamic struct starts with the offset to its head.
		assert_eq!(&encoded[..32], U256::from(32).to_be_bytes::<32>().as_slice());
		// Salt is the first head word.
		assert_eq!(
			&encoded[32..64],
			B256::from(U256::from(0x1234_u64)).as_slice()
		);
	}

	#[test]
	fn test_transfer_round_trip() {
		let to = Address::repeat_byte(0x42);
		let data = encode_transfer(to, U256::from(7));
		assert_eq!(hex::encode(&data[..4]), "a9059cbb");
		assert_eq!(decode_transfer(&data), Some((to, U256::from(7))));
	}

	#[test]
	fn test_decode_transfer_rejects_other_calls() {
		assert_eq!(decode_transfer(&[]), None);
		assert_eq!(decode_transfer(&[0x09, 0x5e, 0xa7, 0xb3]), None);

		// approve(address,uint256) has the same argument layout.
		let mut approve = encode_transfer(Address::ZERO, U256::from(1)).to_vec();
		approve[..4].copy_from_slice(&[0x09, 0x5e, 0xa7, 0xb3]);
		assert_eq!(decode_transfer(&approve), None);
	}
}
