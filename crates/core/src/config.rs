//! Harvest configuration: portal endpoints, selectors, timeouts, and limits.
//!
//! Every field has a default matching the Fairgate member portal, so an empty
//! JSON object is a valid configuration file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{HarvestError, Result};
use crate::merge::MergeOptions;
use crate::selector::Selector;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarvestConfig {
	pub portal: PortalConfig,
	pub selectors: Selectors,
	pub timeouts: Timeouts,
	pub limits: Limits,
	pub merge: MergeOptions,
}

impl HarvestConfig {
	/// Loads and validates a JSON configuration file.
	pub fn from_file(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)?;
		let config: HarvestConfig =
			serde_json::from_str(&content).map_err(|e| HarvestError::Config(format!("{}: {e}", path.display())))?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		Url::parse(&self.portal.origin).map_err(|e| HarvestError::Config(format!("portal origin {:?}: {e}", self.portal.origin)))?;

		let t = &self.timeouts;
		for (name, value) in [
			("elementWaitMs", t.element_wait_ms),
			("pollIntervalMs", t.poll_interval_ms),
			("downloadConfirmMs", t.download_confirm_ms),
		] {
			if value == 0 {
				return Err(HarvestError::Config(format!("timeouts.{name} must be greater than zero")));
			}
		}

		if self.limits.max_pages == 0 {
			return Err(HarvestError::Config("limits.maxPages must be greater than zero".into()));
		}
		if self.limits.max_overlay_dismissals == 0 {
			return Err(HarvestError::Config("limits.maxOverlayDismissals must be greater than zero".into()));
		}
		if self.limits.click_attempts == 0 {
			return Err(HarvestError::Config("limits.clickAttempts must be greater than zero".into()));
		}
		if self.merge.extension.trim_start_matches('.').is_empty() {
			return Err(HarvestError::Config("merge.extension must not be empty".into()));
		}
		Ok(())
	}
}

/// Where the portal lives and which paths serve each step.
///
/// Paths may contain `{site}`, replaced with the site identifier given on the
/// command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortalConfig {
	pub origin: String,
	pub signin_path: String,
	pub signout_path: String,
	pub listing_path: String,
}

impl Default for PortalConfig {
	fn default() -> Self {
		Self {
			origin: "https://mein.fairgate.ch".into(),
			signin_path: "/{site}/backend/signin".into(),
			signout_path: "/{site}/backend/signout".into(),
			listing_path: "/{site}/backend/contact/list".into(),
		}
	}
}

impl PortalConfig {
	/// Resolves a `{site}` path template against the origin.
	pub fn url_for(&self, site: &str, template: &str) -> Result<Url> {
		validate_site(site)?;
		let origin = Url::parse(&self.origin).map_err(|e| HarvestError::Config(format!("portal origin {:?}: {e}", self.origin)))?;
		let path = template.replace("{site}", site);
		origin.join(&path).map_err(|e| HarvestError::Config(format!("portal path {path:?}: {e}")))
	}
}

fn validate_site(site: &str) -> Result<()> {
	if site.is_empty() || site == "." || site == ".." || site.contains(['/', '?', '#']) || site.chars().any(char::is_whitespace) {
		return Err(HarvestError::Config(format!("invalid site identifier {site:?}")));
	}
	Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selectors {
	pub username: Selector,
	pub password: Selector,
	pub submit: Selector,
	/// Close control of transient overlays.
	pub overlay_close: Selector,
	/// Present whenever the listing page rendered, even with zero rows.
	pub listing: Selector,
	pub record_link: Selector,
	pub next_page: Selector,
	/// Class token marking the next control as disabled.
	pub disabled_class: String,
	/// Page-identity element of a record detail page.
	pub record_identity: Selector,
	pub download: Selector,
}

impl Default for Selectors {
	fn default() -> Self {
		Self {
			username: Selector::id("username"),
			password: Selector::id("password"),
			submit: Selector::name("_submit"),
			overlay_close: Selector::class("fg-dev-close-window"),
			listing: Selector::id("DataTables_Table_0"),
			record_link: Selector::class("fg-dev-contactname"),
			next_page: Selector::id("DataTables_Table_0_next"),
			disabled_class: "disabled".into(),
			record_identity: Selector::class("page-title-sub"),
			download: Selector::xpath("//a[contains(., 'Download Lizenz')]"),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timeouts {
	/// Bounded wait for structural elements.
	pub element_wait_ms: u64,
	/// Delay before each overlay lookup; overlays render late.
	pub overlay_settle_ms: u64,
	pub poll_interval_ms: u64,
	/// Pause after triggering a download when confirmation is off.
	pub post_download_ms: u64,
	/// How long to wait for a downloaded file when confirmation is on.
	pub download_confirm_ms: u64,
}

impl Default for Timeouts {
	fn default() -> Self {
		Self {
			element_wait_ms: 10_000,
			overlay_settle_ms: 4_000,
			poll_interval_ms: 250,
			post_download_ms: 1_000,
			download_confirm_ms: 30_000,
		}
	}
}

impl Timeouts {
	pub fn element_wait(&self) -> Duration {
		Duration::from_millis(self.element_wait_ms)
	}

	pub fn overlay_settle(&self) -> Duration {
		Duration::from_millis(self.overlay_settle_ms)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn post_download(&self) -> Duration {
		Duration::from_millis(self.post_download_ms)
	}

	pub fn download_confirm(&self) -> Duration {
		Duration::from_millis(self.download_confirm_ms)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
	/// Safety bound for listings whose "next" control never reports disabled.
	pub max_pages: usize,
	pub max_overlay_dismissals: usize,
	/// Attempts for a click that keeps getting intercepted.
	pub click_attempts: usize,
}

impl Default for Limits {
	fn default() -> Self {
		Self {
			max_pages: 500,
			max_overlay_dismissals: 10,
			click_attempts: 3,
		}
	}
}
