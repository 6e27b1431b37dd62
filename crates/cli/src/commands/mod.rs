mod merge;
mod run;

use std::path::Path;

use anyhow::Context;
use harvest::HarvestConfig;

use crate::cli::{Cli, Commands};
use crate::error::Result;

pub async fn dispatch(cli: Cli) -> Result<()> {
	let config = load_config(cli.config.as_deref())?;

	match cli.command {
		Commands::Run(args) => run::execute(args, config).await?,
		Commands::Merge(args) => merge::execute(args, config).await?,
	}

	Ok(())
}

fn load_config(path: Option<&Path>) -> Result<HarvestConfig> {
	let Some(path) = path else {
		return Ok(HarvestConfig::default());
	};
	let config = HarvestConfig::from_file(path).with_context(|| format!("loading configuration {}", path.display()))?;
	Ok(config)
}
