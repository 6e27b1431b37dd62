//! Download directory and output path defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

/// File name of the merged document when no output path is given.
pub const DEFAULT_OUTPUT_NAME: &str = "1_all.pdf";

/// Returns an absolute download directory, creating it when needed.
///
/// Without an explicit directory a fresh timestamped one is created under
/// `<tmp>/harvest` and kept after the run.
pub fn resolve_download_dir(explicit: Option<&Path>) -> Result<PathBuf> {
	match explicit {
		Some(dir) => {
			std::fs::create_dir_all(dir).with_context(|| format!("creating download directory {}", dir.display()))?;
			dir.canonicalize()
				.with_context(|| format!("resolving download directory {}", dir.display()))
		}
		None => timestamped_dir(&std::env::temp_dir().join("harvest")),
	}
}

fn timestamped_dir(root: &Path) -> Result<PathBuf> {
	std::fs::create_dir_all(root).with_context(|| format!("creating {}", root.display()))?;
	let prefix = Local::now().format("%Y-%m-%d-%H-%M-%S-%f_").to_string();
	let dir = tempfile::Builder::new()
		.prefix(&prefix)
		.tempdir_in(root)
		.with_context(|| format!("creating download directory in {}", root.display()))?;
	let dir = dir.keep();
	dir.canonicalize().with_context(|| format!("resolving download directory {}", dir.display()))
}

pub fn default_output(download_dir: &Path) -> PathBuf {
	download_dir.join(DEFAULT_OUTPUT_NAME)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn explicit_dir_is_created_and_absolute() {
		let root = tempfile::tempdir().unwrap();
		let dir = root.path().join("nested").join("downloads");

		let resolved = resolve_download_dir(Some(&dir)).unwrap();

		assert!(resolved.is_absolute());
		assert!(resolved.is_dir());
		assert!(resolved.ends_with("nested/downloads"));
	}

	#[test]
	fn timestamped_dirs_are_unique() {
		let root = tempfile::tempdir().unwrap();

		let first = timestamped_dir(root.path()).unwrap();
		let second = timestamped_dir(root.path()).unwrap();

		assert_ne!(first, second);
		assert!(first.is_dir() && second.is_dir());
		let name = first.file_name().unwrap().to_string_lossy().into_owned();
		assert!(name.as_bytes()[..4].iter().all(u8::is_ascii_digit), "{name}");
	}

	#[test]
	fn default_output_lives_in_download_dir() {
		assert_eq!(default_output(Path::new("/tmp/harvest/x")), PathBuf::from("/tmp/harvest/x/1_all.pdf"));
	}
}
