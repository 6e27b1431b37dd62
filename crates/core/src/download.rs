//! Per-record download orchestration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::browser::{Browser, Element};
use crate::error::{BrowserError, HarvestError, Phase, Result};
use crate::obstruction::{ClickFailure, click_through_overlays, dismiss_blocking_overlays};
use crate::progress::ProgressSink;
use crate::record::{DownloadOutcome, DownloadReport, RecordOutcome, RecordRef};
use crate::session::Session;
use crate::settle::{ensure_active, settle};

const PHASE: Phase = Phase::Download;

/// Suffixes browsers use for downloads still being written.
const PARTIAL_SUFFIXES: &[&str] = &["crdownload", "part", "tmp", "download"];

/// Visits each record in order and triggers its download when one is offered.
///
/// A record without a download control is recorded as
/// [`DownloadOutcome::NoFileAvailable`] and the batch continues. A record page
/// whose identity element never appears aborts the whole batch, since that
/// points at a lost session rather than at the record.
///
/// Without a `watch`, downloads are fire-and-forget followed by
/// `timeouts.postDownloadMs`. With one, each trigger waits for a new completed
/// file in the download directory; none within `timeouts.downloadConfirmMs`
/// counts as no file.
pub async fn download_all<B: Browser>(
	session: &Session<B>,
	records: &[RecordRef],
	progress: &dyn ProgressSink,
	mut watch: Option<&mut DownloadWatch>,
	cancel: &CancellationToken,
) -> Result<DownloadReport> {
	let browser = session.browser();
	let config = session.config();
	let selectors = &config.selectors;
	let timeouts = &config.timeouts;
	let total = records.len();
	let mut report = DownloadReport::default();

	info!(target = "harvest", total, "downloading documents");

	for (i, record) in records.iter().enumerate() {
		let index = i + 1;
		ensure_active(cancel, PHASE)?;

		browser.navigate(record.url()).await.map_err(|err| match err {
			BrowserError::Navigation { reason, .. } => HarvestError::RecordStructural {
				url: record.url().to_string(),
				what: format!("navigation failed: {reason}"),
			},
			other => HarvestError::in_phase(PHASE)(other),
		})?;
		dismiss_blocking_overlays(browser, config, PHASE, cancel).await?;

		let identity = browser
			.wait_for(&selectors.record_identity, timeouts.element_wait(), timeouts.poll_interval())
			.await
			.map_err(|err| match err {
				BrowserError::Timeout { .. } => HarvestError::RecordStructural {
					url: record.url().to_string(),
					what: format!("identity element {} missing", selectors.record_identity),
				},
				other => HarvestError::in_phase(PHASE)(other),
			})?;
		let identity = identity.read_text().await.map_err(HarvestError::in_phase(PHASE))?.trim().to_string();
		progress.record_started(index, total, &identity);

		let outcome = match browser.find(&selectors.download).await.map_err(HarvestError::in_phase(PHASE))? {
			None => {
				info!(target = "harvest", record = %identity, "no document available");
				DownloadOutcome::NoFileAvailable
			}
			Some(control) => match click_through_overlays(browser, &control, config, PHASE, cancel).await {
				Ok(()) => match watch.as_deref_mut() {
					Some(watch) => confirm(watch, &identity, timeouts.download_confirm(), timeouts.poll_interval(), cancel).await?,
					None => {
						settle(timeouts.post_download(), cancel, PHASE).await?;
						DownloadOutcome::Downloaded { file: None }
					}
				},
				Err(ClickFailure::Vanished) => {
					warn!(target = "harvest", record = %identity, "download control detached before click");
					DownloadOutcome::NoFileAvailable
				}
				Err(ClickFailure::Fatal(err)) => return Err(err),
			},
		};

		progress.record_finished(index, total, &identity, &outcome);
		report.outcomes.push(RecordOutcome {
			record: record.clone(),
			identity,
			outcome,
		});
	}

	info!(
		target = "harvest",
		total,
		downloaded = report.downloaded(),
		missing = total - report.downloaded(),
		"download batch finished"
	);
	Ok(report)
}

async fn confirm(
	watch: &mut DownloadWatch,
	identity: &str,
	timeout: Duration,
	poll: Duration,
	cancel: &CancellationToken,
) -> Result<DownloadOutcome> {
	match watch.wait_for_new(timeout, poll, cancel).await? {
		Some(file) => Ok(DownloadOutcome::Downloaded { file: Some(file) }),
		None => {
			warn!(
				target = "harvest",
				record = %identity,
				timeout_ms = timeout.as_millis() as u64,
				"download triggered but no file appeared"
			);
			Ok(DownloadOutcome::NoFileAvailable)
		}
	}
}

/// Detects completed files that appear in the download directory.
#[derive(Debug)]
pub struct DownloadWatch {
	dir: PathBuf,
	extension: String,
	seen: HashSet<PathBuf>,
}

impl DownloadWatch {
	/// Snapshots the files already present so only new arrivals are reported.
	pub async fn new(dir: impl Into<PathBuf>, extension: &str) -> Result<Self> {
		let dir = dir.into();
		let extension = extension.trim_start_matches('.').to_ascii_lowercase();
		let seen = completed_files(&dir, &extension).await?.into_iter().collect();
		Ok(Self { dir, extension, seen })
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Waits for one completed file not seen before. `Ok(None)` on timeout.
	pub async fn wait_for_new(&mut self, timeout: Duration, poll: Duration, cancel: &CancellationToken) -> Result<Option<PathBuf>> {
		let deadline = Instant::now() + timeout;
		loop {
			let mut fresh: Vec<PathBuf> = completed_files(&self.dir, &self.extension)
				.await?
				.into_iter()
				.filter(|p| !self.seen.contains(p))
				.collect();
			fresh.sort();
			if let Some(file) = fresh.into_iter().next() {
				debug!(target = "harvest", file = %file.display(), "download landed");
				self.seen.insert(file.clone());
				return Ok(Some(file));
			}

			let now = Instant::now();
			if now >= deadline {
				return Ok(None);
			}
			settle(poll.min(deadline - now), cancel, PHASE).await?;
		}
	}
}

async fn completed_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut entries = match tokio::fs::read_dir(dir).await {
		Ok(entries) => entries,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(files),
		Err(err) => return Err(err.into()),
	};
	while let Some(entry) = entries.next_entry().await? {
		let path = entry.path();
		if entry.file_type().await?.is_file() && is_completed(&path, extension) {
			files.push(path);
		}
	}
	Ok(files)
}

fn is_completed(path: &Path, extension: &str) -> bool {
	let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
		return false;
	};
	let ext = ext.to_ascii_lowercase();
	!PARTIAL_SUFFIXES.contains(&ext.as_str()) && ext == extension
}
