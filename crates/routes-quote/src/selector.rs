//! Cheapest-quote selection.
//!
//! A quote replaces the current best only when strictly cheaper, so ties keep
//! the earliest quote.
//!
//! [`select_cheapest`] and [`select_cheapest_native_send`] compare each
//! quote's primary (first) entry. When solvers answer for several execution
//! types those entries may price different flows; the `_for` variants compare
//! the entry for one execution type instead.

use alloy::primitives::U256;
use routes_types::{IntentExecutionType, QuoteEntry, Result, RoutesError, SolverQuote};

/// The quote asking for the smallest total of reward tokens.
pub fn select_cheapest(quotes: &[SolverQuote]) -> Result<&SolverQuote> {
	select_by(quotes, None, QuoteEntry::reward_token_total)
}

/// The quote asking for the smallest native reward, for native-value sends.
pub fn select_cheapest_native_send(quotes: &[SolverQuote]) -> Result<&SolverQuote> {
	select_by(quotes, None, |entry| entry.reward_native)
}

/// As [`select_cheapest`], comparing only entries for `execution_type`.
/// Quotes without such an entry are skipped.
pub fn select_cheapest_for<'a>(
	quotes: &'a [SolverQuote],
	execution_type: &IntentExecutionType,
) -> Result<&'a SolverQuote> {
	select_by(quotes, Some(execution_type), QuoteEntry::reward_token_total)
}

/// As [`select_cheapest_native_send`], comparing only entries for
/// `execution_type`.
pub fn select_cheapest_native_send_for<'a>(
	quotes: &'a [SolverQuote],
	execution_type: &IntentExecutionType,
) -> Result<&'a SolverQuote> {
	select_by(quotes, Some(execution_type), |entry| entry.reward_native)
}

fn select_by<'a, F>(
	quotes: &'a [SolverQuote],
	execution_type: Option<&IntentExecutionType>,
	cost: F,
) -> Result<&'a SolverQuote>
where
	F: Fn(&QuoteEntry) -> U256,
{
	if quotes.is_empty() {
		return Err(RoutesError::EmptyQuoteSet);
	}

	let mut best: Option<(&SolverQuote, U256)> = None;

	for quote in quotes {
		let entry = match execution_type {
			Some(kind) => match quote.entry_for(kind) {
				Some(entry) => entry,
				None => continue,
			},
			None => quote.primary_entry().ok_or_else(|| {
				RoutesError::InvalidQuote(format!("Quote {} has no entries", quote.quote_id))
			})?,
		};
		let total = cost(entry);

		match best {
			Some((_, best_total)) if total >= best_total => {}
			_ => best = Some((quote, total)),
		}
	}

	best.map(|(quote, _)| quote).ok_or_else(|| {
		RoutesError::InvalidQuote(format!(
			"No quote carries a {} entry",
			execution_type.map(ToString::to_string).unwrap_or_default()
		))
	})
}
