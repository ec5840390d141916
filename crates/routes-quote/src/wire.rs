//! JSON shapes exchanged with the quoting service.
//!
//! Every integer travels as a decimal string. Inbound integers are also
//! accepted as JSON numbers or `0x` hex strings, since solvers differ.

use alloy::primitives::{Address, Bytes, U256};
use routes_types::{
	Call, ChainId, GaslessAuthorization, Intent, IntentExecutionType, Permit2Message,
	PermitDetails, QuoteEntry, RoutesError, SolverQuote, TokenAmount,
};
use serde::{Deserialize, Serialize};

/// Serde adapters for integers carried as decimal strings.
pub mod decimal {
	use alloy::primitives::U256;
	use serde::{Deserialize, Deserializer, Serializer};

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Text(String),
		Number(u64),
	}

	pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
		match Raw::deserialize(deserializer)? {
			Raw::Number(n) => Ok(U256::from(n)),
			Raw::Text(s) => s
				.trim()
				.parse::<U256>()
				.map_err(|_| serde::de::Error::custom(format!("Invalid integer: {}", s))),
		}
	}

	pub mod int {
		use super::Raw;
		use serde::{Deserialize, Deserializer, Serializer};

		pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
			serializer.serialize_str(&value.to_string())
		}

		pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
			match Raw::deserialize(deserializer)? {
				Raw::Number(n) => Ok(n),
				Raw::Text(s) => parse_u64(s.trim())
					.ok_or_else(|| serde::de::Error::custom(format!("Invalid integer: {}", s))),
			}
		}

		fn parse_u64(s: &str) -> Option<u64> {
			match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
				Some(hex) => u64::from_str_radix(hex, 16).ok(),
				None => s.parse().ok(),
			}
		}
	}

	pub mod chain_id {
		use routes_types::ChainId;
		use serde::{Deserializer, Serializer};

		pub fn serialize<S: Serializer>(value: &ChainId, serializer: S) -> Result<S::Ok, S::Error> {
			super::int::serialize(&value.0, serializer)
		}

		pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ChainId, D::Error> {
			super::int::deserialize(deserializer).map(ChainId)
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmountData {
	pub token: Address,
	#[serde(with = "decimal")]
	pub amount: U256,
}

impl From<&TokenAmount> for TokenAmountData {
	fn from(t: &TokenAmount) -> Self {
		Self {
			token: t.token,
			amount: t.amount,
		}
	}
}

impl From<TokenAmountData> for TokenAmount {
	fn from(t: TokenAmountData) -> Self {
		TokenAmount::new(t.token, t.amount)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallData {
	pub target: Address,
	pub data: Bytes,
	#[serde(with = "decimal")]
	pub value: U256,
}

impl From<&Call> for CallData {
	fn from(c: &Call) -> Self {
		Self {
			target: c.target,
			data: c.data.clone(),
			value: c.value,
		}
	}
}

impl From<CallData> for Call {
	fn from(c: CallData) -> Self {
		Call {
			target: c.target,
			data: c.data,
			value: c.value,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteData {
	#[serde(rename = "originChainID", with = "decimal::chain_id")]
	pub origin_chain_id: ChainId,
	#[serde(rename = "destinationChainID", with = "decimal::chain_id")]
	pub destination_chain_id: ChainId,
	pub inbox_contract: Address,
	pub tokens: Vec<TokenAmountData>,
	pub calls: Vec<CallData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardData {
	pub creator: Address,
	pub prover_contract: Address,
	#[serde(with = "decimal::int")]
	pub deadline: u64,
	#[serde(with = "decimal")]
	pub native_value: U256,
	pub tokens: Vec<TokenAmountData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentData {
	pub route_data: RouteData,
	pub reward_data: RewardData,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gasless_intent_data: Option<GaslessIntentData>,
}

impl IntentData {
	pub fn from_intent(intent: &Intent) -> Self {
		Self {
			route_data: RouteData {
				origin_chain_id: intent.route.source,
				destination_chain_id: intent.route.destination,
				inbox_contract: intent.route.inbox,
				tokens: intent.route.tokens.iter().map(Into::into).collect(),
				calls: intent.route.calls.iter().map(Into::into).collect(),
			},
			reward_data: RewardData {
				creator: intent.reward.creator,
				prover_contract: intent.reward.prover,
				deadline: intent.reward.deadline,
				native_value: intent.reward.native_value,
				tokens: intent.reward.tokens.iter().map(Into::into).collect(),
			},
			gasless_intent_data: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
	#[serde(rename = "dAppID")]
	pub dapp_id: String,
	#[serde(rename = "intentExecutionTypes")]
	pub intent_execution_types: Vec<IntentExecutionType>,
	#[serde(rename = "intentData")]
	pub intent_data: IntentData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEntryData {
	pub intent_execution_type: IntentExecutionType,
	#[serde(default)]
	pub route_tokens: Vec<TokenAmountData>,
	#[serde(default)]
	pub route_calls: Vec<CallData>,
	#[serde(default)]
	pub reward_tokens: Vec<TokenAmountData>,
	#[serde(default, with = "decimal")]
	pub reward_native: U256,
	#[serde(with = "decimal::int")]
	pub expiry_time: u64,
	#[serde(default, with = "decimal::int")]
	pub estimated_fulfill_time_sec: u64,
}

impl From<QuoteEntryData> for QuoteEntry {
	fn from(e: QuoteEntryData) -> Self {
		QuoteEntry {
			intent_execution_type: e.intent_execution_type,
			route_tokens: e.route_tokens.into_iter().map(Into::into).collect(),
			route_calls: e.route_calls.into_iter().map(Into::into).collect(),
			reward_tokens: e.reward_tokens.into_iter().map(Into::into).collect(),
			reward_native: e.reward_native,
			expiry_time: e.expiry_time,
			estimated_fulfill_time_sec: e.estimated_fulfill_time_sec,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
	pub quote_entries: Vec<QuoteEntryData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResponseItem {
	#[serde(rename = "quoteID")]
	pub quote_id: String,
	#[serde(rename = "solverID")]
	pub solver_id: String,
	#[serde(rename = "quoteData")]
	pub quote_data: QuoteData,
}

impl From<QuoteResponseItem> for SolverQuote {
	fn from(item: QuoteResponseItem) -> Self {
		SolverQuote {
			quote_id: item.quote_id,
			solver_id: item.solver_id,
			entries: item
				.quote_data
				.quote_entries
				.into_iter()
				.map(Into::into)
				.collect(),
		}
	}
}

/// Bodies arrive either bare or wrapped in `{"data": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
	Wrapped { data: T },
	Bare(T),
}

impl<T> Envelope<T> {
	pub fn into_inner(self) -> T {
		match self {
			Self::Wrapped { data } => data,
			Self::Bare(inner) => inner,
		}
	}
}

/// Decodes a quote response body into solver quotes.
pub fn parse_quotes(body: serde_json::Value) -> Result<Vec<SolverQuote>, RoutesError> {
	let items: Envelope<Vec<QuoteResponseItem>> = serde_json::from_value(body)
		.map_err(|e| RoutesError::InvalidQuote(format!("Malformed quote response: {}", e)))?;

	Ok(items.into_inner().into_iter().map(Into::into).collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitSignatureData {
	pub signature: Bytes,
	#[serde(with = "decimal")]
	pub deadline: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitEntryData {
	pub token: Address,
	pub data: PermitSignatureData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitDetailsData {
	pub token: Address,
	#[serde(with = "decimal")]
	pub amount: U256,
	#[serde(with = "decimal")]
	pub expiration: U256,
	#[serde(with = "decimal")]
	pub nonce: U256,
}

impl From<&PermitDetails> for PermitDetailsData {
	fn from(d: &PermitDetails) -> Self {
		Self {
			token: d.token,
			amount: d.amount,
			expiration: d.expiration,
			nonce: d.nonce,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData<D> {
	pub details: D,
	pub spender: Address,
	#[serde(with = "decimal")]
	pub sig_deadline: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wrapped<D> {
	pub typed_data: TypedData<D>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permit2PermitData {
	SinglePermitData(Wrapped<PermitDetailsData>),
	BatchPermitData(Wrapped<Vec<PermitDetailsData>>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permit2Data {
	pub permit_contract: Address,
	pub permit_data: Permit2PermitData,
	pub signature: Bytes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitData {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub permit: Option<Vec<PermitEntryData>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub permit2: Option<Permit2Data>,
}

impl From<&GaslessAuthorization> for PermitData {
	fn from(auth: &GaslessAuthorization) -> Self {
		let permit = (!auth.permit.is_empty()).then(|| {
			auth.permit
				.iter()
				.map(|p| PermitEntryData {
					token: p.token,
					data: PermitSignatureData {
						signature: p.signature.clone(),
						deadline: p.deadline,
					},
				})
				.collect()
		});

		let permit2 = auth.permit2.as_ref().map(|bundle| Permit2Data {
			permit_contract: bundle.permit_contract,
			permit_data: match &bundle.message {
				Permit2Message::Single {
					details,
					spender,
					sig_deadline,
				} => Permit2PermitData::SinglePermitData(Wrapped {
					typed_data: TypedData {
						details: details.into(),
						spender: *spender,
						sig_deadline: *sig_deadline,
					},
				}),
				Permit2Message::Batch {
					details,
					spender,
					sig_deadline,
				} => Permit2PermitData::BatchPermitData(Wrapped {
					typed_data: TypedData {
						details: details.iter().map(Into::into).collect(),
						spender: *spender,
						sig_deadline: *sig_deadline,
					},
				}),
			},
			signature: bundle.signature.clone(),
		});

		Self { permit, permit2 }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaslessIntentData {
	pub funder: Address,
	pub vault_address: Address,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub allow_partial: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub permit_data: Option<PermitData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaslessIntentRequest {
	#[serde(rename = "quoteID")]
	pub quote_id: String,
	#[serde(rename = "dAppID")]
	pub dapp_id: String,
	#[serde(rename = "solverID")]
	pub solver_id: String,
	#[serde(rename = "intentData")]
	pub intent_data: IntentData,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaslessIntentResponse {
	pub transaction_hash: String,
}

#[cfg(test)]
mod tests {
	use super::*;
	use routes_types::{Permit1Entry, Permit2Bundle, Reward, Route};
	use serde_json::json;

	fn intent() -> Intent {
		Intent::new(
			Route {
				salt: Default::default(),
				source: ChainId::OPTIMISM,
				destination: ChainId::BASE,
				inbox: Address::repeat_byte(0x01),
				tokens: vec![TokenAmount::new(
					Address::repeat_byte(0xaa),
					U256::from(10).pow(U256::from(30)),
				)],
				calls: vec![],
			},
			Reward {
				creator: Address::repeat_byte(0x02),
				prover: Address::repeat_byte(0x03),
				deadline: 1_700_000_000,
				native_value: U256::ZERO,
				tokens: vec![],
			},
		)
	}

	#[test]
	fn test_quote_request_shape() {
		let request = QuoteRequest {
			dapp_id: "test-dapp".to_string(),
			intent_execution_types: vec![IntentExecutionType::SelfPublish],
			intent_data: IntentData::from_intent(&intent()),
		};
		let value = serde_json::to_value(&request).unwrap();

		assert_eq!(value["dAppID"], "test-dapp");
		assert_eq!(value["intentExecutionTypes"], json!(["SELF_PUBLISH"]));
		let route = &value["intentData"]["routeData"];
		assert_eq!(route["originChainID"], "10");
		assert_eq!(route["destinationChainID"], "8453");
		// Amounts beyond 64 bits survive as decimal strings.
		assert_eq!(
			route["tokens"][0]["amount"],
			"1000000000000000000000000000000"
		);
		assert_eq!(value["intentData"]["rewardData"]["deadline"], "1700000000");
		assert_eq!(value["intentData"]["rewardData"]["nativeValue"], "0");
		assert!(value["intentData"].get("gaslessIntentData").is_none());
	}

	#[test]
	fn test_parse_bare_and_wrapped_quotes() {
		let item = json!({
			"quoteID": "q-1",
			"solverID": "solver-a",
			"quoteData": {
				"quoteEntries": [{
					"intentExecutionType": "GASLESS",
					"routeTokens": [],
					"routeCalls": [],
					"rewardTokens": [{
						"token": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
						"amount": "1005"
					}],
					"expiryTime": 1700000600,
					"estimatedFulfillTimeSec": "12"
				}]
			}
		});

		let bare = parse_quotes(json!([item.clone()])).unwrap();
		let wrapped = parse_quotes(json!({ "data": [item] })).unwrap();
		assert_eq!(bare, wrapped);

		let entry = &bare[0].entries[0];
		assert_eq!(entry.intent_execution_type, IntentExecutionType::Gasless);
		assert_eq!(entry.reward_tokens[0].amount, U256::from(1005));
		assert_eq!(entry.reward_native, U256::ZERO);
		assert_eq!(entry.expiry_time, 1_700_000_600);
		assert_eq!(entry.estimated_fulfill_time_sec, 12);
	}

	#[test]
	fn test_integers_accept_hex_strings() {
		#[derive(Deserialize)]
		struct Sample {
			#[serde(with = "decimal")]
			amount: U256,
			#[serde(with = "decimal::int")]
			expiry: u64,
		}

		let sample: Sample =
			serde_json::from_value(json!({ "amount": "0x64", "expiry": "0x6553f100" })).unwrap();
		assert_eq!(sample.amount, U256::from(100));
		assert_eq!(sample.expiry, 1_700_000_000);

		let sample: Sample =
			serde_json::from_value(json!({ "amount": 7, "expiry": " 42 " })).unwrap();
		assert_eq!(sample.amount, U256::from(7));
		assert_eq!(sample.expiry, 42);

		let bad = json!({ "amount": "1", "expiry": "0xzz" });
		assert!(serde_json::from_value::<Sample>(bad).is_err());
	}

	#[test]
	fn test_malformed_quotes() {
		let result = parse_quotes(json!({ "unexpected": true }));
		assert!(matches!(result, Err(RoutesError::InvalidQuote(_))));
	}

	#[test]
	fn test_permit_data_carries_both_artifacts() {
		let details = PermitDetails {
			token: Address::repeat_byte(0xbb),
			amount: U256::from(5),
			expiration: U256::from(100),
			nonce: U256::ZERO,
		};
		let auth = GaslessAuthorization {
			permit: vec![Permit1Entry {
				token: Address::repeat_byte(0xaa),
				signature: Bytes::from(vec![1; 65]),
				deadline: U256::from(100),
			}],
			permit2: Some(Permit2Bundle {
				permit_contract: Address::repeat_byte(0x22),
				message: Permit2Message::Single {
					details,
					spender: Address::repeat_byte(0x33),
					sig_deadline: U256::from(100),
				},
				signature: Bytes::from(vec![2; 65]),
			}),
		};

		let value = serde_json::to_value(PermitData::from(&auth)).unwrap();
		assert_eq!(value["permit"][0]["data"]["deadline"], "100");
		let typed = &value["permit2"]["permitData"]["singlePermitData"]["typedData"];
		assert_eq!(typed["details"]["amount"], "5");
		assert_eq!(typed["sigDeadline"], "100");
	}

	#[test]
	fn test_empty_permit_list_is_omitted() {
		let value = serde_json::to_value(PermitData::from(&GaslessAuthorization::default())).unwrap();
		assert_eq!(value, json!({}));
	}
}
