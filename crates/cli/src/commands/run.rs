use harvest::{Credentials, DownloadReport, HarvestConfig, RunOptions, run_harvest};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::merge::merge_dir;
use crate::browser::{LaunchOptions, WebDriverBrowser};
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::paths;
use crate::progress::BarProgress;

pub async fn execute(args: RunArgs, mut config: HarvestConfig) -> Result<()> {
	if let Some(max_pages) = args.max_pages {
		config.limits.max_pages = max_pages;
	}
	config.validate()?;

	let download_dir = paths::resolve_download_dir(args.download_dir.as_deref())?;
	let output = args.output.clone().unwrap_or_else(|| paths::default_output(&download_dir));
	info!(target = "harvest.cli", dir = %download_dir.display(), "download directory");

	let cancel = CancellationToken::new();
	cancel_on_interrupt(cancel.clone());

	let browser = WebDriverBrowser::launch(&LaunchOptions {
		endpoint: args.webdriver.clone(),
		headless: !args.headed,
		download_dir: download_dir.clone(),
	})
	.await
	.map_err(CliError::Launch)?;

	let credentials = Credentials::new(args.username, args.password);
	let options = RunOptions {
		download_dir: download_dir.clone(),
		confirm_downloads: args.confirm_downloads,
	};
	let merge_options = config.merge.clone();

	let progress = BarProgress::new();
	let result = run_harvest(browser, config, &args.site, &credentials, &options, &progress, &cancel).await;
	progress.finish();
	let report = result?;
	log_summary(&report);

	if args.no_merge {
		info!(target = "harvest.cli", "merge skipped");
		return Ok(());
	}
	merge_dir(download_dir, output, merge_options).await
}

fn cancel_on_interrupt(cancel: CancellationToken) {
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			warn!(target = "harvest.cli", "interrupt received; stopping after the current step");
			cancel.cancel();
		}
	});
}

fn log_summary(report: &DownloadReport) {
	info!(
		target = "harvest.cli",
		records = report.len(),
		downloaded = report.downloaded(),
		"downloads finished"
	);
	for missing in report.missing() {
		info!(target = "harvest.cli", record = %missing.identity, url = %missing.record, "no document");
	}
}
