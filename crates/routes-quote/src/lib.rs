//! Solver quotes: requesting them from the quoting service and picking one.

pub mod client;
pub mod selector;
pub mod transport;
pub mod wire;

pub use client::{GaslessInitiation, QuotingClient};
pub use selector::{
	select_cheapest, select_cheapest_for, select_cheapest_native_send,
	select_cheapest_native_send_for,
};
pub use transport::{HttpTransport, QuoteTransport};
