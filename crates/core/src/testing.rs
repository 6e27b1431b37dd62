//! Scripted in-memory portal implementing [`Browser`] for orchestration tests.
//!
//! Routes navigation by path suffix (`/backend/signin`, `/backend/contact/list`,
//! `/backend/signout`) or by exact record URL, and answers lookups for the
//! configured selectors from the current page's state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::browser::{Browser, BrowserResult, Element};
use crate::config::Selectors;
use crate::error::BrowserError;
use crate::selector::Selector;

#[derive(Debug, Clone)]
pub(crate) struct FakeRecord {
	pub identity: Option<String>,
	pub download: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeSite {
	pub login_form: bool,
	/// Record link targets per listing page; `None` means the listing never renders.
	pub listing: Option<Vec<Vec<Option<String>>>>,
	pub next_control: bool,
	pub next_never_disabled: bool,
	pub records: HashMap<String, FakeRecord>,
	pub overlays_after_login: usize,
	pub overlays_per_page: usize,
	/// Clicking a download control writes the file here.
	pub download_dir: Option<PathBuf>,
	pub drop_downloads: bool,
	pub fail_signout: bool,
}

impl Default for FakeSite {
	fn default() -> Self {
		Self {
			login_form: true,
			listing: Some(vec![Vec::new()]),
			next_control: true,
			next_never_disabled: false,
			records: HashMap::new(),
			overlays_after_login: 0,
			overlays_per_page: 0,
			download_dir: None,
			drop_downloads: false,
			fail_signout: false,
		}
	}
}

impl FakeSite {
	pub fn with_listing(pages: &[&[&str]]) -> Self {
		let listing = pages
			.iter()
			.map(|page| page.iter().map(|href| Some(href.to_string())).collect())
			.collect();
		Self {
			listing: Some(listing),
			..Default::default()
		}
	}

	pub fn record(mut self, url: &str, identity: &str, download: Option<&str>) -> Self {
		self.records.insert(
			url.to_string(),
			FakeRecord {
				identity: Some(identity.to_string()),
				download: download.map(str::to_string),
			},
		);
		self
	}

	pub fn broken_record(mut self, url: &str) -> Self {
		self.records.insert(
			url.to_string(),
			FakeRecord {
				identity: None,
				download: None,
			},
		);
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FakeEvent {
	Navigate(String),
	Type { field: String, value: String },
	Click(String),
	Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Page {
	Blank,
	Signin,
	Listing(usize),
	Record(String),
	Other(String),
}

struct State {
	site: FakeSite,
	selectors: Selectors,
	page: Page,
	overlays: usize,
	overlay_click_blocks: usize,
	overlay_vanishes: bool,
	lookups: HashMap<String, usize>,
	events: Vec<FakeEvent>,
	closed: bool,
}

#[derive(Debug, Clone)]
enum Kind {
	Field(&'static str),
	Submit,
	Overlay,
	Marker,
	RecordLink(Option<String>),
	Next { disabled: bool },
	Identity(String),
	Download(String),
}

#[derive(Clone)]
pub(crate) struct ScriptedBrowser {
	state: Arc<Mutex<State>>,
}

impl ScriptedBrowser {
	pub fn new(site: FakeSite, selectors: &Selectors) -> Self {
		Self {
			state: Arc::new(Mutex::new(State {
				site,
				selectors: selectors.clone(),
				page: Page::Blank,
				overlays: 0,
				overlay_click_blocks: 0,
				overlay_vanishes: false,
				lookups: HashMap::new(),
				events: Vec::new(),
				closed: false,
			})),
		}
	}

	pub fn push_overlays(&self, count: usize) {
		self.state.lock().overlays += count;
	}

	/// The next `count` overlay clicks report "not interactable".
	pub fn block_overlay_clicks(&self, count: usize) {
		self.state.lock().overlay_click_blocks = count;
	}

	/// Overlays detach while being clicked.
	pub fn vanish_overlay_on_click(&self) {
		self.state.lock().overlay_vanishes = true;
	}

	pub fn lookups(&self, selector: &Selector) -> usize {
		self.state.lock().lookups.get(&selector.to_string()).copied().unwrap_or(0)
	}

	pub fn events(&self) -> Vec<FakeEvent> {
		self.state.lock().events.clone()
	}

	pub fn navigations(&self) -> Vec<String> {
		self.events()
			.into_iter()
			.filter_map(|e| match e {
				FakeEvent::Navigate(url) => Some(url),
				_ => None,
			})
			.collect()
	}

	pub fn clicks(&self, label: &str) -> usize {
		self.events().iter().filter(|e| matches!(e, FakeEvent::Click(l) if l == label)).count()
	}

	pub fn is_closed(&self) -> bool {
		self.state.lock().closed
	}

	fn lookup(&self, selector: &Selector) -> Vec<FakeElement> {
		let mut state = self.state.lock();
		*state.lookups.entry(selector.to_string()).or_default() += 1;

		let s = &state.selectors;
		let mut kinds = Vec::new();

		if *selector == s.overlay_close {
			if state.overlays > 0 {
				kinds.push(Kind::Overlay);
			}
		} else if *selector == s.username || *selector == s.password || *selector == s.submit {
			if state.page == Page::Signin && state.site.login_form {
				kinds.push(if *selector == s.username {
					Kind::Field("username")
				} else if *selector == s.password {
					Kind::Field("password")
				} else {
					Kind::Submit
				});
			}
		} else if let Page::Listing(index) = state.page {
			if let Some(pages) = &state.site.listing {
				let last = index + 1 >= pages.len();
				if *selector == s.listing {
					kinds.push(Kind::Marker);
				} else if *selector == s.record_link {
					kinds.extend(pages[index].iter().cloned().map(Kind::RecordLink));
				} else if *selector == s.next_page && state.site.next_control {
					kinds.push(Kind::Next {
						disabled: last && !state.site.next_never_disabled,
					});
				}
			}
		} else if let Page::Record(url) = &state.page {
			let record = &state.site.records[url];
			if *selector == s.record_identity {
				kinds.extend(record.identity.clone().map(Kind::Identity));
			} else if *selector == s.download && record.download.is_some() {
				kinds.push(Kind::Download(url.clone()));
			}
		}

		kinds
			.into_iter()
			.map(|kind| FakeElement {
				state: Arc::clone(&self.state),
				kind,
			})
			.collect()
	}
}

#[async_trait]
impl Browser for ScriptedBrowser {
	type Element = FakeElement;

	async fn navigate(&self, url: &str) -> BrowserResult<()> {
		let mut state = self.state.lock();
		state.events.push(FakeEvent::Navigate(url.to_string()));

		if url.ends_with("/backend/signout") && state.site.fail_signout {
			return Err(BrowserError::Navigation {
				url: url.to_string(),
				reason: "connection reset".into(),
			});
		}

		state.page = if url.ends_with("/backend/signin") {
			Page::Signin
		} else if url.ends_with("/backend/contact/list") {
			Page::Listing(0)
		} else if state.site.records.contains_key(url) {
			Page::Record(url.to_string())
		} else {
			Page::Other(url.to_string())
		};
		let extra = state.site.overlays_per_page;
		state.overlays += extra;
		Ok(())
	}

	async fn find(&self, selector: &Selector) -> BrowserResult<Option<FakeElement>> {
		Ok(self.lookup(selector).into_iter().next())
	}

	async fn find_all(&self, selector: &Selector) -> BrowserResult<Vec<FakeElement>> {
		Ok(self.lookup(selector))
	}

	async fn close(&self) -> BrowserResult<()> {
		let mut state = self.state.lock();
		state.events.push(FakeEvent::Close);
		state.closed = true;
		Ok(())
	}
}

pub(crate) struct FakeElement {
	state: Arc<Mutex<State>>,
	kind: Kind,
}

#[async_trait]
impl Element for FakeElement {
	async fn click(&self) -> BrowserResult<()> {
		let mut state = self.state.lock();
		match &self.kind {
			Kind::Overlay => {
				if state.overlays == 0 {
					return Err(BrowserError::Stale);
				}
				if state.overlay_click_blocks > 0 {
					state.overlay_click_blocks -= 1;
					return Err(BrowserError::NotInteractable("element click intercepted".into()));
				}
				state.overlays -= 1;
				if state.overlay_vanishes {
					return Err(BrowserError::Stale);
				}
			}
			Kind::Submit => {
				state.events.push(FakeEvent::Click("submit".into()));
				state.page = Page::Other("dashboard".into());
				let extra = state.site.overlays_after_login;
				state.overlays += extra;
			}
			Kind::Next { .. } => {
				state.events.push(FakeEvent::Click("next".into()));
				if let Page::Listing(index) = state.page {
					let pages = state.site.listing.as_ref().map_or(0, Vec::len);
					if index + 1 < pages {
						state.page = Page::Listing(index + 1);
					}
				}
			}
			Kind::Download(url) => {
				state.events.push(FakeEvent::Click("download".into()));
				let file = state.site.records[url].download.clone();
				if let (Some(dir), Some(file), false) = (&state.site.download_dir, file, state.site.drop_downloads) {
					std::fs::write(dir.join(file), b"%PDF-1.5\n").map_err(|e| BrowserError::Other(e.to_string()))?;
				}
			}
			Kind::Field(_) | Kind::Marker | Kind::RecordLink(_) | Kind::Identity(_) => {}
		}
		Ok(())
	}

	async fn send_text(&self, value: &str) -> BrowserResult<()> {
		if let Kind::Field(field) = self.kind {
			self.state.lock().events.push(FakeEvent::Type {
				field: field.to_string(),
				value: value.to_string(),
			});
		}
		Ok(())
	}

	async fn read_text(&self) -> BrowserResult<String> {
		Ok(match &self.kind {
			Kind::Identity(name) => format!("  {name}\n"),
			_ => String::new(),
		})
	}

	async fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
		Ok(match (&self.kind, name) {
			(Kind::RecordLink(href), "href") => href.clone(),
			(Kind::Next { disabled }, "class") => Some(if *disabled {
				"paginate_button next disabled".to_string()
			} else {
				"paginate_button next".to_string()
			}),
			_ => None,
		})
	}
}
