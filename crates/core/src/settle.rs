//! Cancellable settle delays.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{HarvestError, Phase, Result};

/// Sleeps for `delay`, returning early with [`HarvestError::Cancelled`] when
/// the token fires.
pub(crate) async fn settle(delay: Duration, cancel: &CancellationToken, phase: Phase) -> Result<()> {
	if delay.is_zero() {
		return ensure_active(cancel, phase);
	}
	tokio::select! {
		_ = cancel.cancelled() => Err(HarvestError::Cancelled { phase }),
		_ = tokio::time::sleep(delay) => Ok(()),
	}
}

pub(crate) fn ensure_active(cancel: &CancellationToken, phase: Phase) -> Result<()> {
	if cancel.is_cancelled() {
		return Err(HarvestError::Cancelled { phase });
	}
	Ok(())
}
