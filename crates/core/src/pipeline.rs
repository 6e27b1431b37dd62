//! One harvest run: login, enumerate, download, teardown.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::browser::Browser;
use crate::config::HarvestConfig;
use crate::download::{DownloadWatch, download_all};
use crate::enumerate::enumerate_records;
use crate::error::Result;
use crate::progress::ProgressSink;
use crate::record::DownloadReport;
use crate::session::{Credentials, Session};

#[derive(Debug, Clone)]
pub struct RunOptions {
	/// Where the browser saves downloads.
	pub download_dir: PathBuf,
	/// Wait for each triggered download to land in `download_dir`.
	pub confirm_downloads: bool,
}

/// Drives the browser through a full run and returns the per-record outcomes.
///
/// The session is torn down (logout, then browser close) whether or not the
/// run succeeded; teardown problems are logged, never returned.
pub async fn run_harvest<B: Browser>(
	browser: B,
	config: HarvestConfig,
	site: &str,
	credentials: &Credentials,
	options: &RunOptions,
	progress: &dyn ProgressSink,
	cancel: &CancellationToken,
) -> Result<DownloadReport> {
	if let Err(err) = config.validate() {
		if let Err(close_err) = browser.close().await {
			warn!(target = "harvest", error = %close_err, "closing browser failed");
		}
		return Err(err);
	}

	let mut session = Session::new(browser, config, site)?;
	let result = harvest(&mut session, credentials, options, progress, cancel).await;
	session.teardown().await;
	result
}

async fn harvest<B: Browser>(
	session: &mut Session<B>,
	credentials: &Credentials,
	options: &RunOptions,
	progress: &dyn ProgressSink,
	cancel: &CancellationToken,
) -> Result<DownloadReport> {
	session.login(credentials, cancel).await?;
	let records = enumerate_records(session, cancel).await?;

	let mut watch = if options.confirm_downloads {
		Some(DownloadWatch::new(&options.download_dir, &session.config().merge.extension).await?)
	} else {
		None
	};
	let report = download_all(session, &records, progress, watch.as_mut(), cancel).await?;

	info!(
		target = "harvest",
		records = report.len(),
		downloaded = report.downloaded(),
		"harvest finished"
	);
	Ok(report)
}
