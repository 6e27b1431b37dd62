//! Dismissal of transient overlays that block interaction with the page.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::browser::{Browser, Element};
use crate::config::HarvestConfig;
use crate::error::{BrowserError, HarvestError, Phase, Result};
use crate::settle::settle;

/// What a dismissal pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayReport {
	pub dismissed: usize,
	/// The retry budget ran out with an overlay still present.
	pub exhausted: bool,
}

/// Closes overlays until none is found, bounded by `limits.maxOverlayDismissals`.
///
/// Each iteration waits `timeouts.overlaySettleMs` before looking, since
/// overlays render after the page. An overlay that is present but not yet
/// clickable is retried; one that vanishes between lookup and click counts as
/// dismissed. The budget bounds clicks; a final lookup after the last one
/// decides whether an overlay is still present, which logs a warning instead
/// of failing.
pub async fn dismiss_blocking_overlays<B: Browser>(
	browser: &B,
	config: &HarvestConfig,
	phase: Phase,
	cancel: &CancellationToken,
) -> Result<OverlayReport> {
	let selector = &config.selectors.overlay_close;
	let mut report = OverlayReport::default();

	for attempt in 1..=config.limits.max_overlay_dismissals {
		settle(config.timeouts.overlay_settle(), cancel, phase).await?;

		let Some(close) = browser.find(selector).await.map_err(HarvestError::in_phase(phase))? else {
			if report.dismissed > 0 {
				debug!(target = "harvest", dismissed = report.dismissed, "overlays cleared");
			}
			return Ok(report);
		};

		match close.click().await {
			Ok(()) => {
				report.dismissed += 1;
				debug!(target = "harvest", attempt, "overlay dismissed");
			}
			Err(BrowserError::Stale | BrowserError::NotFound(_)) => {
				report.dismissed += 1;
				debug!(target = "harvest", attempt, "overlay vanished before click");
			}
			Err(BrowserError::NotInteractable(reason)) => {
				debug!(target = "harvest", attempt, %reason, "overlay not clickable yet");
			}
			Err(err) => return Err(HarvestError::in_phase(phase)(err)),
		}
	}

	// The last click may have cleared the final overlay.
	settle(config.timeouts.overlay_settle(), cancel, phase).await?;
	if browser.find(selector).await.map_err(HarvestError::in_phase(phase))?.is_none() {
		debug!(target = "harvest", dismissed = report.dismissed, "overlays cleared");
		return Ok(report);
	}

	warn!(
		target = "harvest",
		%phase,
		attempts = config.limits.max_overlay_dismissals,
		"overlay still present after retry budget; continuing"
	);
	report.exhausted = true;
	Ok(report)
}

/// Clicks `element`, clearing overlays and retrying while the click is intercepted.
pub(crate) async fn click_through_overlays<B: Browser>(
	browser: &B,
	element: &B::Element,
	config: &HarvestConfig,
	phase: Phase,
	cancel: &CancellationToken,
) -> std::result::Result<(), ClickFailure> {
	let attempts = config.limits.click_attempts;
	for attempt in 1..=attempts {
		match element.click().await {
			Ok(()) => return Ok(()),
			Err(BrowserError::NotInteractable(reason)) if attempt < attempts => {
				debug!(target = "harvest", attempt, %reason, "click intercepted; clearing overlays");
				dismiss_blocking_overlays(browser, config, phase, cancel).await.map_err(ClickFailure::Fatal)?;
			}
			Err(BrowserError::Stale | BrowserError::NotFound(_)) => return Err(ClickFailure::Vanished),
			Err(err) => return Err(ClickFailure::Fatal(HarvestError::in_phase(phase)(err))),
		}
	}
	Err(ClickFailure::Fatal(HarvestError::Structural {
		phase,
		what: format!("element stayed unclickable after {attempts} attempts"),
	}))
}

#[derive(Debug)]
pub(crate) enum ClickFailure {
	/// The element detached from the page before it could be clicked.
	Vanished,
	Fatal(HarvestError),
}
