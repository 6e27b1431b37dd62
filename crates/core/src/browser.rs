//! Browser-control capability consumed by the orchestrator.
//!
//! The orchestration logic only ever talks to these two traits, so it can run
//! against a WebDriver session in production and a scripted fake in tests.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::BrowserError;
use crate::selector::Selector;

pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// A handle to one element on the current page.
#[async_trait]
pub trait Element: Send + Sync {
	async fn click(&self) -> BrowserResult<()>;

	async fn send_text(&self, value: &str) -> BrowserResult<()>;

	async fn read_text(&self) -> BrowserResult<String>;

	/// Returns `None` when the attribute is absent.
	async fn attribute(&self, name: &str) -> BrowserResult<Option<String>>;
}

/// One stateful browser context. The current page is shared mutable state, so
/// callers drive it strictly sequentially.
#[async_trait]
pub trait Browser: Send + Sync {
	type Element: Element;

	async fn navigate(&self, url: &str) -> BrowserResult<()>;

	/// Looks up the first match; absence is `Ok(None)`, not an error.
	async fn find(&self, selector: &Selector) -> BrowserResult<Option<Self::Element>>;

	/// All matches in document order, possibly empty.
	async fn find_all(&self, selector: &Selector) -> BrowserResult<Vec<Self::Element>>;

	/// Releases the underlying browser.
	async fn close(&self) -> BrowserResult<()>;

	/// Polls until at least one element matches, or fails with
	/// [`BrowserError::Timeout`] once `timeout` elapses.
	async fn wait_for_all(&self, selector: &Selector, timeout: Duration, poll: Duration) -> BrowserResult<Vec<Self::Element>> {
		let deadline = Instant::now() + timeout;
		loop {
			let found = self.find_all(selector).await?;
			if !found.is_empty() {
				return Ok(found);
			}
			let now = Instant::now();
			if now >= deadline {
				return Err(BrowserError::Timeout {
					selector: selector.to_string(),
					timeout,
				});
			}
			tokio::time::sleep(poll.min(deadline - now)).await;
		}
	}

	/// Like [`Browser::wait_for_all`] but yields only the first match.
	async fn wait_for(&self, selector: &Selector, timeout: Duration, poll: Duration) -> BrowserResult<Self::Element> {
		let mut found = self.wait_for_all(selector, timeout, poll).await?;
		Ok(found.swap_remove(0))
	}
}
