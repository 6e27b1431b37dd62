use std::path::PathBuf;

use harvest::{EmptyMergePolicy, HarvestConfig, LopdfBackend, MergeOptions, MergeOutcome, merge};
use tracing::{info, warn};

use crate::cli::MergeArgs;
use crate::error::Result;
use crate::paths;

pub async fn execute(args: MergeArgs, mut config: HarvestConfig) -> Result<()> {
	if args.placeholder_on_empty {
		config.merge.empty = EmptyMergePolicy::Placeholder;
	}
	config.validate()?;

	let output = args.output.unwrap_or_else(|| paths::default_output(&args.dir));
	merge_dir(args.dir, output, config.merge).await
}

/// Runs the merge off the async runtime and logs its outcome.
pub(crate) async fn merge_dir(dir: PathBuf, output: PathBuf, options: MergeOptions) -> Result<()> {
	let outcome = tokio::task::spawn_blocking(move || merge(&LopdfBackend, &dir, &output, &options)).await??;

	match outcome {
		MergeOutcome::Merged(summary) => info!(
			target = "harvest.cli",
			files = summary.files.len(),
			pages = summary.pages,
			output = %summary.output.display(),
			"merged document ready"
		),
		MergeOutcome::Empty { placeholder: Some(path) } => {
			warn!(target = "harvest.cli", output = %path.display(), "nothing to merge; wrote empty placeholder")
		}
		MergeOutcome::Empty { placeholder: None } => warn!(target = "harvest.cli", "nothing to merge; no output written"),
	}
	Ok(())
}
