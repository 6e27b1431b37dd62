use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(about = "Download every member document from the club portal and merge them into one PDF")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v debug for harvest, -vv debug everywhere, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// JSON configuration file (portal, selectors, timeouts, limits, merge)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Log in, download every record's document, then merge them
	Run(RunArgs),

	/// Merge the documents already in a directory
	Merge(MergeArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
	/// Site identifier, the first path segment of portal URLs
	#[arg(long)]
	pub site: String,

	#[arg(short, long)]
	pub username: String,

	#[arg(short, long, env = "HARVEST_PASSWORD", hide_env_values = true)]
	pub password: String,

	/// Where the browser saves downloads (default: a fresh timestamped temp directory)
	#[arg(long, value_name = "DIR")]
	pub download_dir: Option<PathBuf>,

	/// Merged document path (default: 1_all.pdf inside the download directory)
	#[arg(short, long, value_name = "FILE")]
	pub output: Option<PathBuf>,

	/// WebDriver endpoint (chromedriver)
	#[arg(long, value_name = "URL", default_value = "http://localhost:9515")]
	pub webdriver: String,

	/// Show the browser window
	#[arg(long)]
	pub headed: bool,

	/// Stop paginating after this many listing pages
	#[arg(long, value_name = "N")]
	pub max_pages: Option<usize>,

	/// Wait for each download to land on disk before moving on
	#[arg(long)]
	pub confirm_downloads: bool,

	/// Skip merging after the downloads
	#[arg(long)]
	pub no_merge: bool,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
	/// Directory holding the documents to merge
	pub dir: PathBuf,

	/// Merged document path (default: 1_all.pdf inside DIR)
	#[arg(short, long, value_name = "FILE")]
	pub output: Option<PathBuf>,

	/// Write a zero-page document when there is nothing to merge
	#[arg(long)]
	pub placeholder_on_empty: bool,
}
