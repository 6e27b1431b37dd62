//! Terminal progress bar over the download batch.

use std::time::Duration;

use harvest::{DownloadOutcome, LogProgress, ProgressSink};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}";

/// Shows a bar on stderr and keeps the per-record log lines above it.
///
/// indicatif hides the bar when stderr is not a terminal, leaving only the logs.
pub struct BarProgress {
	bar: ProgressBar,
}

impl BarProgress {
	pub fn new() -> Self {
		let bar = ProgressBar::new(0);
		let style = ProgressStyle::with_template(TEMPLATE)
			.unwrap_or_else(|_| ProgressStyle::default_bar())
			.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
			.progress_chars("█▓░");
		bar.set_style(style);
		bar.enable_steady_tick(Duration::from_millis(100));
		Self { bar }
	}

	#[cfg(test)]
	fn hidden() -> Self {
		Self { bar: ProgressBar::hidden() }
	}

	pub fn finish(&self) {
		self.bar.finish_and_clear();
	}
}

impl Default for BarProgress {
	fn default() -> Self {
		Self::new()
	}
}

impl ProgressSink for BarProgress {
	fn record_started(&self, index: usize, total: usize, identity: &str) {
		self.bar.set_length(total as u64);
		self.bar.set_position(index.saturating_sub(1) as u64);
		self.bar.set_message(identity.to_string());
		self.bar.suspend(|| LogProgress.record_started(index, total, identity));
	}

	fn record_finished(&self, index: usize, total: usize, identity: &str, outcome: &DownloadOutcome) {
		self.bar.set_position(index as u64);
		self.bar.suspend(|| LogProgress.record_finished(index, total, identity, outcome));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tracks_batch_position() {
		let progress = BarProgress::hidden();

		progress.record_started(1, 3, "Anna Muster");
		assert_eq!(progress.bar.length(), Some(3));
		assert_eq!(progress.bar.position(), 0);
		assert_eq!(progress.bar.message(), "Anna Muster");

		progress.record_finished(1, 3, "Anna Muster", &DownloadOutcome::NoFileAvailable);
		progress.record_started(2, 3, "Beat Beispiel");
		progress.record_finished(2, 3, "Beat Beispiel", &DownloadOutcome::Downloaded { file: None });
		assert_eq!(progress.bar.position(), 2);
		assert_eq!(progress.bar.message(), "Beat Beispiel");
	}

	#[test]
	fn finish_clears_bar() {
		let progress = BarProgress::hidden();
		progress.record_started(1, 1, "Anna Muster");
		progress.finish();
		assert!(progress.bar.is_finished());
	}
}
