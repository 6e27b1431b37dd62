//! Record references and per-record download outcomes.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// URL of one member's detail page, in listing order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordRef(String);

impl RecordRef {
	pub fn new(url: impl Into<String>) -> Self {
		Self(url.into())
	}

	pub fn url(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for RecordRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DownloadOutcome {
	/// The download control was activated. `file` is set only when the file
	/// was confirmed on disk.
	Downloaded { file: Option<PathBuf> },
	/// The record has no download control, or no file appeared in time.
	NoFileAvailable,
}

impl DownloadOutcome {
	pub fn is_downloaded(&self) -> bool {
		matches!(self, DownloadOutcome::Downloaded { .. })
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
	pub record: RecordRef,
	/// Display name read from the record's identity element.
	pub identity: String,
	pub outcome: DownloadOutcome,
}

/// Per-record outcomes of one download batch, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReport {
	pub outcomes: Vec<RecordOutcome>,
}

impl DownloadReport {
	pub fn downloaded(&self) -> usize {
		self.outcomes.iter().filter(|o| o.outcome.is_downloaded()).count()
	}

	pub fn missing(&self) -> impl Iterator<Item = &RecordOutcome> {
		self.outcomes.iter().filter(|o| !o.outcome.is_downloaded())
	}

	pub fn len(&self) -> usize {
		self.outcomes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.outcomes.is_empty()
	}
}
