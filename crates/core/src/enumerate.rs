//! Walks the paginated member listing and collects record URLs.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{Browser, Element};
use crate::error::{BrowserError, HarvestError, Phase, Result};
use crate::obstruction::{ClickFailure, click_through_overlays, dismiss_blocking_overlays};
use crate::record::RecordRef;
use crate::session::Session;
use crate::settle::ensure_active;

const PHASE: Phase = Phase::Enumeration;

/// Collects every record link across the listing's pages, in page order then
/// document order.
///
/// The listing container must appear within `timeouts.elementWaitMs` on every
/// page; a listing without rows yields an empty result. Pagination stops when
/// the "next" control is absent or carries the disabled class, or after
/// `limits.maxPages` pages.
pub async fn enumerate_records<B: Browser>(session: &Session<B>, cancel: &CancellationToken) -> Result<Vec<RecordRef>> {
	let browser = session.browser();
	let config = session.config();
	let selectors = &config.selectors;
	let timeouts = &config.timeouts;

	let listing_url = session.url_for(&config.portal.listing_path)?;
	info!(target = "harvest", url = %listing_url, "collecting record pages");
	browser.navigate(listing_url.as_str()).await.map_err(HarvestError::in_phase(PHASE))?;

	let mut records = Vec::new();
	let mut page = 1usize;

	loop {
		ensure_active(cancel, PHASE)?;
		dismiss_blocking_overlays(browser, config, PHASE, cancel).await?;

		browser
			.wait_for(&selectors.listing, timeouts.element_wait(), timeouts.poll_interval())
			.await
			.map_err(|err| match err {
				BrowserError::Timeout { .. } => HarvestError::Structural {
					phase: PHASE,
					what: format!("listing {} on page {page}", selectors.listing),
				},
				other => HarvestError::in_phase(PHASE)(other),
			})?;

		let links = browser.find_all(&selectors.record_link).await.map_err(HarvestError::in_phase(PHASE))?;
		let before = records.len();
		for link in &links {
			let href = link.attribute("href").await.map_err(HarvestError::in_phase(PHASE))?;
			match href.as_deref().and_then(|href| resolve(&listing_url, href)) {
				Some(url) => records.push(RecordRef::new(url)),
				None => debug!(target = "harvest", page, "skipping record link without target"),
			}
		}
		debug!(target = "harvest", page, found = records.len() - before, "listing page collected");

		if !advance_page(session, page, cancel).await? {
			break;
		}
		page += 1;
	}

	info!(target = "harvest", pages = page, records = records.len(), "listing collected");
	Ok(records)
}

/// Activates the "next" control. Returns `false` when this page is the last one.
async fn advance_page<B: Browser>(session: &Session<B>, page: usize, cancel: &CancellationToken) -> Result<bool> {
	let browser = session.browser();
	let config = session.config();
	let selectors = &config.selectors;

	for _ in 0..config.limits.click_attempts {
		let Some(next) = browser.find(&selectors.next_page).await.map_err(HarvestError::in_phase(PHASE))? else {
			return Ok(false);
		};
		let class = next.attribute("class").await.map_err(HarvestError::in_phase(PHASE))?;
		if has_class(class.as_deref(), &selectors.disabled_class) {
			return Ok(false);
		}
		if page >= config.limits.max_pages {
			warn!(
				target = "harvest",
				max_pages = config.limits.max_pages,
				"listing never reported a last page; stopping at page limit"
			);
			return Ok(false);
		}

		match click_through_overlays(browser, &next, config, PHASE, cancel).await {
			Ok(()) => return Ok(true),
			Err(ClickFailure::Vanished) => debug!(target = "harvest", page, "next control detached; looking it up again"),
			Err(ClickFailure::Fatal(err)) => return Err(err),
		}
	}

	Err(HarvestError::Structural {
		phase: PHASE,
		what: format!("next control {} on page {page}", selectors.next_page),
	})
}

fn resolve(base: &Url, href: &str) -> Option<String> {
	let href = href.trim();
	if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
		return None;
	}
	base.join(href).ok().map(String::from)
}

fn has_class(class: Option<&str>, token: &str) -> bool {
	class.is_some_and(|c| c.split_whitespace().any(|t| t == token))
}
