//! Solidity bindings for the intent protocol contracts.
//!
//! Field order of every struct here is load-bearing: route, reward and intent
//! hashes are taken over their ABI encoding.

use alloy::sol;

sol! {
	#[derive(Debug, PartialEq, Eq)]
	struct TokenAmount {
		address token;
		uint256 amount;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct Call {
		address target;
		bytes data;
		uint256 value;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct Route {
		bytes32 salt;
		uint256 source;
		uint256 destination;
		address inbox;
		TokenAmount[] tokens;
		Call[] calls;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct Reward {
		address creator;
		address prover;
		uint256 deadline;
		uint256 nativeValue;
		TokenAmount[] tokens;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct Intent {
		Route route;
		Reward reward;
	}

	interface IIntentSource {
		event IntentCreated(
			bytes32 indexed hash,
			bytes32 salt,
			uint256 source,
			uint256 destination,
			address inbox,
			TokenAmount[] routeTokens,
			Call[] calls,
			address indexed creator,
			address indexed prover,
			uint256 deadline,
			uint256 nativeValue,
			TokenAmount[] rewardTokens
		);

		event IntentFunded(bytes32 intentHash, address funder);

		function publishAndFund(Intent calldata intent, bool allowPartial)
			external
			payable
			returns (bytes32 intentHash, address vault);

		function intentVaultAddress(Intent calldata intent) external view returns (address);
	}

	interface IInbox {
		event Fulfillment(
			bytes32 indexed _hash,
			uint256 indexed _sourceChainID,
			address indexed _prover,
			address _claimant
		);
	}

	interface IERC20Transfer {
		function transfer(address to, uint256 amount) external returns (bool);
	}
}
