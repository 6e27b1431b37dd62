//! Authenticated portal session: form login and best-effort logout.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{Browser, Element};
use crate::config::HarvestConfig;
use crate::error::{BrowserError, HarvestError, Phase, Result};
use crate::obstruction::dismiss_blocking_overlays;
use crate::selector::Selector;

/// Username/password pair for the sign-in form.
#[derive(Clone)]
pub struct Credentials {
	pub username: String,
	pub password: String,
}

impl Credentials {
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// The single browser context of one harvest run.
///
/// Owns the browser; every step borrows it through the session so the current
/// page is never driven from two places at once.
pub struct Session<B: Browser> {
	browser: B,
	config: HarvestConfig,
	site: String,
	origin: Url,
	authenticated: bool,
}

impl<B: Browser> Session<B> {
	pub fn new(browser: B, config: HarvestConfig, site: impl Into<String>) -> Result<Self> {
		let site = site.into();
		config.validate()?;
		let origin = config.portal.url_for(&site, "/")?;
		Ok(Self {
			browser,
			config,
			site,
			origin,
			authenticated: false,
		})
	}

	pub fn browser(&self) -> &B {
		&self.browser
	}

	pub fn config(&self) -> &HarvestConfig {
		&self.config
	}

	pub fn site(&self) -> &str {
		&self.site
	}

	/// Base URL that relative record links resolve against.
	pub fn origin(&self) -> &Url {
		&self.origin
	}

	/// `true` once the credentials were submitted. The portal's answer is not
	/// checked here; a rejected login surfaces when the listing is unreachable.
	pub fn is_authenticated(&self) -> bool {
		self.authenticated
	}

	pub(crate) fn url_for(&self, template: &str) -> Result<Url> {
		self.config.portal.url_for(&self.site, template)
	}

	/// Fills and submits the sign-in form, then clears post-login overlays.
	///
	/// Missing form fields are a structural failure: the portal layout no
	/// longer matches the configured selectors.
	pub async fn login(&mut self, credentials: &Credentials, cancel: &CancellationToken) -> Result<()> {
		let url = self.url_for(&self.config.portal.signin_path)?;
		info!(target = "harvest", site = %self.site, username = %credentials.username, "logging in");

		self.browser.navigate(url.as_str()).await.map_err(HarvestError::in_phase(Phase::Login))?;

		let selectors = &self.config.selectors;
		let timeouts = &self.config.timeouts;
		let username = self
			.browser
			.wait_for(&selectors.username, timeouts.element_wait(), timeouts.poll_interval())
			.await
			.map_err(|err| match err {
				BrowserError::Timeout { .. } => missing_field(&selectors.username),
				other => HarvestError::in_phase(Phase::Login)(other),
			})?;
		let password = self.require(&selectors.password).await?;
		let submit = self.require(&selectors.submit).await?;

		username.send_text(&credentials.username).await.map_err(HarvestError::in_phase(Phase::Login))?;
		password.send_text(&credentials.password).await.map_err(HarvestError::in_phase(Phase::Login))?;
		submit.click().await.map_err(HarvestError::in_phase(Phase::Login))?;
		self.authenticated = true;
		debug!(target = "harvest", "credentials submitted");

		dismiss_blocking_overlays(&self.browser, &self.config, Phase::Login, cancel).await?;
		Ok(())
	}

	async fn require(&self, selector: &Selector) -> Result<B::Element> {
		self.browser
			.find(selector)
			.await
			.map_err(HarvestError::in_phase(Phase::Login))?
			.ok_or_else(|| missing_field(selector))
	}

	/// Navigates to the sign-out endpoint.
	///
	/// Callers treat failure as a warning; the run is ending either way.
	pub async fn logout(&mut self) -> Result<()> {
		let url = self.url_for(&self.config.portal.signout_path)?;
		info!(target = "harvest", site = %self.site, "logging out");
		self.browser.navigate(url.as_str()).await.map_err(HarvestError::in_phase(Phase::Logout))?;
		self.authenticated = false;
		Ok(())
	}

	/// Logs out when a login was submitted, then closes the browser. Never fails.
	pub async fn teardown(mut self) {
		if self.authenticated {
			if let Err(err) = self.logout().await {
				warn!(target = "harvest", error = %err, "logout failed");
			}
		}
		if let Err(err) = self.browser.close().await {
			warn!(target = "harvest", error = %err, "closing browser failed");
		}
	}
}

fn missing_field(selector: &Selector) -> HarvestError {
	HarvestError::Structural {
		phase: Phase::Login,
		what: format!("sign-in form field {selector}"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{FakeEvent, FakeSite, ScriptedBrowser};

	fn config() -> HarvestConfig {
		let mut config = HarvestConfig::default();
		config.timeouts.overlay_settle_ms = 10;
		config
	}

	#[tokio::test(start_paused = true)]
	async fn login_fills_form_and_clears_overlays() {
		let config = config();
		let site = FakeSite {
			overlays_after_login: 2,
			..Default::default()
		};
		let browser = ScriptedBrowser::new(site, &config.selectors);
		let mut session = Session::new(browser.clone(), config, "fcdemo").unwrap();

		session.login(&Credentials::new("anna", "s3cret"), &CancellationToken::new()).await.unwrap();

		assert!(session.is_authenticated());
		assert_eq!(browser.navigations(), vec!["https://mein.fairgate.ch/fcdemo/backend/signin".to_string()]);
		let events = browser.events();
		assert!(events.contains(&FakeEvent::Type {
			field: "username".into(),
			value: "anna".into()
		}));
		assert!(events.contains(&FakeEvent::Type {
			field: "password".into(),
			value: "s3cret".into()
		}));
		assert_eq!(browser.clicks("submit"), 1);
		assert_eq!(browser.lookups(&session.config().selectors.overlay_close), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn missing_form_is_structural_failure() {
		let config = config();
		let site = FakeSite {
			login_form: false,
			..Default::default()
		};
		let browser = ScriptedBrowser::new(site, &config.selectors);
		let mut session = Session::new(browser, config, "fcdemo").unwrap();

		let err = session.login(&Credentials::new("anna", "x"), &CancellationToken::new()).await.unwrap_err();

		assert!(matches!(err, HarvestError::Structural { phase: Phase::Login, .. }));
		assert!(!session.is_authenticated());
	}

	#[tokio::test]
	async fn teardown_survives_failing_logout() {
		let config = config();
		let site = FakeSite {
			fail_signout: true,
			..Default::default()
		};
		let browser = ScriptedBrowser::new(site, &config.selectors);
		let mut session = Session::new(browser.clone(), config, "fcdemo").unwrap();
		session.authenticated = true;

		session.teardown().await;

		assert!(browser.is_closed());
		assert_eq!(browser.navigations(), vec!["https://mein.fairgate.ch/fcdemo/backend/signout".to_string()]);
	}

	#[tokio::test]
	async fn teardown_skips_logout_without_login() {
		let config = config();
		let browser = ScriptedBrowser::new(FakeSite::default(), &config.selectors);
		let session = Session::new(browser.clone(), config, "fcdemo").unwrap();

		session.teardown().await;

		assert!(browser.navigations().is_empty());
		assert!(browser.is_closed());
	}

	#[test]
	fn credentials_debug_hides_password() {
		let creds = Credentials::new("anna", "s3cret");
		assert!(!format!("{creds:?}").contains("s3cret"));
	}
}
