//! Progress side channel for the download batch.

use tracing::info;

use crate::record::DownloadOutcome;

/// Observer of batch progress. Not part of the functional contract; sinks must
/// not fail the batch.
pub trait ProgressSink: Send + Sync {
	/// Called once the record's identity is known. `index` is 1-based.
	fn record_started(&self, index: usize, total: usize, identity: &str);

	fn record_finished(&self, _index: usize, _total: usize, _identity: &str, _outcome: &DownloadOutcome) {}
}

/// Reports progress as structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
	fn record_started(&self, index: usize, total: usize, identity: &str) {
		info!(target = "harvest", index, total, record = %identity, "processing record");
	}

	fn record_finished(&self, index: usize, total: usize, identity: &str, outcome: &DownloadOutcome) {
		match outcome {
			DownloadOutcome::Downloaded { file: Some(file) } => {
				info!(target = "harvest", index, total, record = %identity, file = %file.display(), "document downloaded")
			}
			DownloadOutcome::Downloaded { file: None } => info!(target = "harvest", index, total, record = %identity, "download triggered"),
			DownloadOutcome::NoFileAvailable => info!(target = "harvest", index, total, record = %identity, "no document available"),
		}
	}
}
