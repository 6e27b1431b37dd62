//! Error taxonomy for the crawl, download, and merge phases.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

/// Pipeline phase an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
	Login,
	Enumeration,
	Download,
	Logout,
	Merge,
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Phase::Login => write!(f, "login"),
			Phase::Enumeration => write!(f, "enumeration"),
			Phase::Download => write!(f, "download"),
			Phase::Logout => write!(f, "logout"),
			Phase::Merge => write!(f, "merge"),
		}
	}
}

/// Failures reported by a [`Browser`](crate::browser::Browser) implementation.
#[derive(Debug, Error)]
pub enum BrowserError {
	#[error("element not found: {0}")]
	NotFound(String),

	#[error("element is no longer attached to the page")]
	Stale,

	#[error("element not interactable: {0}")]
	NotInteractable(String),

	#[error("timed out after {}ms waiting for {selector}", timeout.as_millis())]
	Timeout { selector: String, timeout: Duration },

	#[error("navigation to {url} failed: {reason}")]
	Navigation { url: String, reason: String },

	#[error("browser session error: {0}")]
	Session(String),

	#[error("{0}")]
	Other(String),
}

/// Failures of the artifact merge step.
///
/// Any unreadable input aborts the whole merge; no partial output is written.
#[derive(Debug, Error)]
pub enum MergeError {
	#[error("cannot read input document {}: {reason}", path.display())]
	UnreadableInput { path: PathBuf, reason: String },

	#[error("cannot write merged document {}: {reason}", path.display())]
	Write { path: PathBuf, reason: String },

	#[error("cannot list input directory {}: {source}", path.display())]
	ListInput {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

#[derive(Debug, Error)]
pub enum HarvestError {
	/// An element whose presence is a precondition is missing.
	#[error("{phase}: required page structure missing: {what}")]
	Structural { phase: Phase, what: String },

	/// A record page did not load as a detail page.
	#[error("download: record {url} did not load as a detail page: {what}")]
	RecordStructural { url: String, what: String },

	#[error("{phase}: timed out after {}ms waiting for {what}", timeout.as_millis())]
	Timeout { phase: Phase, what: String, timeout: Duration },

	#[error("{phase}: browser operation failed: {source}")]
	Browser {
		phase: Phase,
		#[source]
		source: BrowserError,
	},

	#[error("{phase}: cancelled")]
	Cancelled { phase: Phase },

	#[error("merge: {0}")]
	Merge(#[from] MergeError),

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl HarvestError {
	/// Returns a mapper that tags a browser failure with the phase it happened in.
	///
	/// Wait timeouts become [`HarvestError::Timeout`] so they read as structural
	/// failures rather than transport errors.
	pub fn in_phase(phase: Phase) -> impl FnOnce(BrowserError) -> HarvestError {
		move |source| match source {
			BrowserError::Timeout { selector, timeout } => HarvestError::Timeout { phase, what: selector, timeout },
			source => HarvestError::Browser { phase, source },
		}
	}

	/// Phase this failure belongs to, when one applies.
	pub fn phase(&self) -> Option<Phase> {
		match self {
			HarvestError::Structural { phase, .. }
			| HarvestError::Timeout { phase, .. }
			| HarvestError::Browser { phase, .. }
			| HarvestError::Cancelled { phase } => Some(*phase),
			HarvestError::RecordStructural { .. } => Some(Phase::Download),
			HarvestError::Merge(_) => Some(Phase::Merge),
			HarvestError::Config(_) | HarvestError::Io(_) => None,
		}
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, HarvestError::Cancelled { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn timeout_maps_to_phase_timeout() {
		let err = HarvestError::in_phase(Phase::Enumeration)(BrowserError::Timeout {
			selector: "css=.row".into(),
			timeout: Duration::from_secs(10),
		});
		assert!(matches!(err, HarvestError::Timeout { phase: Phase::Enumeration, .. }));
		assert_eq!(err.to_string(), "enumeration: timed out after 10000ms waiting for css=.row");
	}

	#[test]
	fn other_browser_errors_keep_source() {
		let err = HarvestError::in_phase(Phase::Login)(BrowserError::Session("gone".into()));
		assert_eq!(err.phase(), Some(Phase::Login));
		assert!(std::error::Error::source(&err).is_some());
	}

	#[test]
	fn record_failure_names_record() {
		let err = HarvestError::RecordStructural {
			url: "https://portal.test/contact/7".into(),
			what: "css=.page-title-sub".into(),
		};
		assert_eq!(err.phase(), Some(Phase::Download));
		assert!(err.to_string().contains("https://portal.test/contact/7"));
	}
}
