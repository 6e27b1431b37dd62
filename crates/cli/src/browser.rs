//! [`Browser`] over a WebDriver session driving Chrome.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use harvest::{Browser, BrowserError, BrowserResult, Element, Selector};
use serde_json::{Value, json};
use thirtyfour::error::{WebDriverErrorInfo, WebDriverErrorInner};
use thirtyfour::prelude::*;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LaunchOptions {
	/// WebDriver server URL, e.g. a local chromedriver.
	pub endpoint: String,
	pub headless: bool,
	/// Directory Chrome saves downloads into without prompting.
	pub download_dir: PathBuf,
}

pub struct WebDriverBrowser {
	driver: WebDriver,
}

impl WebDriverBrowser {
	/// Starts a Chrome session that downloads PDFs straight into `download_dir`.
	pub async fn launch(options: &LaunchOptions) -> BrowserResult<Self> {
		let mut caps = DesiredCapabilities::chrome();
		if options.headless {
			caps.set_headless().map_err(session_error)?;
		}
		caps.add_experimental_option("prefs", download_prefs(&options.download_dir)).map_err(session_error)?;

		info!(
			target = "harvest.cli",
			endpoint = %options.endpoint,
			headless = options.headless,
			download_dir = %options.download_dir.display(),
			"starting browser session"
		);
		let driver = WebDriver::new(options.endpoint.as_str(), caps).await.map_err(session_error)?;
		Ok(Self { driver })
	}
}

fn download_prefs(dir: &Path) -> Value {
	json!({
		"download.default_directory": dir.display().to_string(),
		"download.prompt_for_download": false,
		"download.directory_upgrade": true,
		"plugins.always_open_pdf_externally": true,
	})
}

fn by(selector: &Selector) -> By {
	match selector {
		Selector::Id(v) => By::Id(v.as_str()),
		Selector::Name(v) => By::Name(v.as_str()),
		Selector::Class(v) => By::ClassName(v.as_str()),
		Selector::Css(v) => By::Css(v.as_str()),
		Selector::XPath(v) => By::XPath(v.as_str()),
	}
}

fn session_error(err: impl fmt::Display) -> BrowserError {
	BrowserError::Session(err.to_string())
}

/// Maps a WebDriver failure onto the capability's error kinds.
fn classify(err: WebDriverError) -> BrowserError {
	let message = err.to_string();
	match err.as_inner() {
		WebDriverErrorInner::StaleElementReference(_) => BrowserError::Stale,
		WebDriverErrorInner::NoSuchElement(_) | WebDriverErrorInner::NotFound(..) => BrowserError::NotFound(message),
		WebDriverErrorInner::ElementNotInteractable(_) | WebDriverErrorInner::ElementClickIntercepted(_) => {
			BrowserError::NotInteractable(message)
		}
		WebDriverErrorInner::InvalidSessionId(_)
		| WebDriverErrorInner::SessionNotCreated(_)
		| WebDriverErrorInner::SessionCreateError(_)
		| WebDriverErrorInner::NoSuchWindow(_)
		| WebDriverErrorInner::FatalError(_) => BrowserError::Session(message),
		_ => classify_message(message),
	}
}

/// Fallback for responses a driver did not tag with a W3C error code.
fn classify_message(message: String) -> BrowserError {
	let lower = message.to_ascii_lowercase();
	if lower.contains("stale element") {
		BrowserError::Stale
	} else if lower.contains("no such element") {
		BrowserError::NotFound(message)
	} else if lower.contains("not interactable") || lower.contains("click intercepted") {
		BrowserError::NotInteractable(message)
	} else if lower.contains("invalid session") || lower.contains("session not created") || lower.contains("no such window") {
		BrowserError::Session(message)
	} else {
		BrowserError::Other(message)
	}
}

#[async_trait]
impl Browser for WebDriverBrowser {
	type Element = WebDriverElement;

	async fn navigate(&self, url: &str) -> BrowserResult<()> {
		debug!(target = "harvest.cli", %url, "goto");
		self.driver.goto(url).await.map_err(|err| {
			let reason = err.to_string();
			match classify(err) {
				BrowserError::Session(message) => BrowserError::Session(message),
				_ => BrowserError::Navigation {
					url: url.to_string(),
					reason,
				},
			}
		})
	}

	async fn find(&self, selector: &Selector) -> BrowserResult<Option<WebDriverElement>> {
		Ok(self.find_all(selector).await?.into_iter().next())
	}

	async fn find_all(&self, selector: &Selector) -> BrowserResult<Vec<WebDriverElement>> {
		let found = self.driver.find_all(by(selector)).await.map_err(classify)?;
		Ok(found.into_iter().map(WebDriverElement).collect())
	}

	async fn close(&self) -> BrowserResult<()> {
		debug!(target = "harvest.cli", "quitting browser session");
		self.driver.clone().quit().await.map_err(classify)
	}
}

pub struct WebDriverElement(WebElement);

#[async_trait]
impl Element for WebDriverElement {
	async fn click(&self) -> BrowserResult<()> {
		self.0.click().await.map_err(classify)
	}

	async fn send_text(&self, value: &str) -> BrowserResult<()> {
		self.0.send_keys(value).await.map_err(classify)
	}

	async fn read_text(&self) -> BrowserResult<String> {
		self.0.text().await.map_err(classify)
	}

	async fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
		self.0.attr(name).await.map_err(classify)
	}
}
