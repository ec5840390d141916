//! Token and Permit2 bindings used to build gasless authorizations.

use alloy::sol;

sol! {
	interface IERC20 {
		function allowance(address owner, address spender) external view returns (uint256);
		function approve(address spender, uint256 amount) external returns (bool);
	}

	interface IERC20Permit {
		function name() external view returns (string);
		function version() external view returns (string);
		function nonces(address owner) external view returns (uint256);
	}

	interface IPermit2 {
		function allowance(address user, address token, address spender)
			external
			view
			returns (uint160 amount, uint48 expiration, uint48 nonce);
	}

	/// EIP-2612 permit message.
	#[derive(Debug)]
	struct Permit {
		address owner;
		address spender;
		uint256 value;
		uint256 nonce;
		uint256 deadline;
	}

	#[derive(Debug)]
	struct PermitDetails {
		address token;
		uint160 amount;
		uint48 expiration;
		uint48 nonce;
	}

	#[derive(Debug)]
	struct PermitSingle {
		PermitDetails details;
		address spender;
		uint256 sigDeadline;
	}

	#[derive(Debug)]
	struct PermitBatch {
		PermitDetails[] details;
		address spender;
		uint256 sigDeadline;
	}
}
