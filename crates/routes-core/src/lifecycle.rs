//! Allowed moves of the publish state machine.

use routes_types::{ExecutionState, PublishState, Result, RoutesError};
use tracing::info;

/// Forward transitions only. `Errored` is entered through
/// [`ExecutionState::fail`], never through [`advance`].
pub fn is_valid_transition(from: &PublishState, to: &PublishState) -> bool {
	use PublishState::*;

	matches!(
		(from, to),
		(Idle, Approving)
			| (Approving, Submitting)
			| (Submitting, AwaitingSourceConfirmation)
			| (AwaitingSourceConfirmation, AwaitingDestinationFulfillment)
			| (AwaitingDestinationFulfillment, Fulfilled)
	)
}

pub fn advance(execution: &mut ExecutionState, next: PublishState) -> Result<()> {
	if !is_valid_transition(&execution.state, &next) {
		return Err(RoutesError::validation(format!(
			"Invalid publish transition from {} to {}",
			execution.state, next
		)));
	}

	info!("Publish state changed: {} -> {}", execution.state, next);
	execution.transition(next);
	Ok(())
}
