use harvest::{BrowserError, HarvestError, MergeError};
use thiserror::Error;

/// Exit status for a run stopped by an interrupt.
pub const EXIT_CANCELLED: i32 = 130;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Harvest(#[from] HarvestError),

	#[error("merge: {0}")]
	Merge(#[from] MergeError),

	#[error("cannot start browser: {0}")]
	Launch(#[source] BrowserError),

	#[error("merge task failed: {0}")]
	Join(#[from] tokio::task::JoinError),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl CliError {
	pub fn exit_code(&self) -> i32 {
		match self {
			CliError::Harvest(err) if err.is_cancelled() => EXIT_CANCELLED,
			_ => 1,
		}
	}
}

pub type Result<T> = std::result::Result<T, CliError>;
