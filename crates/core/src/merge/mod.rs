//! Consolidation of downloaded documents into one artifact.
//!
//! Inputs are the files in a directory with the configured extension, taken in
//! ascending file-name order. Every input is opened before anything is written,
//! so one unreadable file aborts the merge with no output.

mod pdf;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use self::pdf::{LopdfBackend, PdfDocument};
use crate::error::MergeError;

/// Page-document primitives the merger is written against.
pub trait DocumentBackend {
	type Document;

	fn open_empty(&self) -> Self::Document;

	fn open(&self, path: &Path) -> Result<Self::Document, MergeError>;

	/// Appends every page of `src` to `dest`, in `src`'s page order.
	fn append_pages(&self, dest: &mut Self::Document, src: Self::Document) -> Result<(), MergeError>;

	fn page_count(&self, document: &Self::Document) -> usize;

	/// Writes `document` to `path`, replacing any existing file.
	fn save(&self, document: Self::Document, path: &Path, compression: &CompressionOptions) -> Result<(), MergeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeOptions {
	/// Extension of input documents, matched case-insensitively.
	pub extension: String,
	pub empty: EmptyMergePolicy,
	pub compression: CompressionOptions,
}

impl Default for MergeOptions {
	fn default() -> Self {
		Self {
			extension: "pdf".into(),
			empty: EmptyMergePolicy::default(),
			compression: CompressionOptions::default(),
		}
	}
}

/// What to do when there is nothing to merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyMergePolicy {
	/// Write nothing.
	#[default]
	Skip,
	/// Write a zero-page document.
	Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionOptions {
	pub remove_unreferenced: bool,
	pub compress_streams: bool,
	pub compress_images: bool,
	pub compress_fonts: bool,
}

impl Default for CompressionOptions {
	fn default() -> Self {
		Self {
			remove_unreferenced: true,
			compress_streams: true,
			compress_images: true,
			compress_fonts: true,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
	/// Inputs in the order their pages were appended.
	pub files: Vec<PathBuf>,
	pub pages: usize,
	pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MergeOutcome {
	Merged(MergeSummary),
	/// No input documents. `placeholder` is set when a zero-page document was written.
	Empty { placeholder: Option<PathBuf> },
}

/// Merges every matching document in `input_dir` into `output`.
///
/// A missing directory is treated like an empty one. When `output` itself
/// lives in `input_dir` it is never taken as an input.
pub fn merge<D: DocumentBackend>(
	backend: &D,
	input_dir: &Path,
	output: &Path,
	options: &MergeOptions,
) -> Result<MergeOutcome, MergeError> {
	let inputs = collect_inputs(input_dir, output, &options.extension)?;

	if inputs.is_empty() {
		info!(target = "harvest", dir = %input_dir.display(), "no documents to merge");
		return match options.empty {
			EmptyMergePolicy::Skip => Ok(MergeOutcome::Empty { placeholder: None }),
			EmptyMergePolicy::Placeholder => {
				backend.save(backend.open_empty(), output, &options.compression)?;
				Ok(MergeOutcome::Empty {
					placeholder: Some(output.to_path_buf()),
				})
			}
		};
	}

	info!(target = "harvest", files = inputs.len(), output = %output.display(), "merging documents");
	let mut merged = backend.open_empty();
	let mut pages = 0;
	for path in &inputs {
		let document = backend.open(path)?;
		let count = backend.page_count(&document);
		debug!(target = "harvest", file = %path.display(), pages = count, "appending document");
		backend.append_pages(&mut merged, document)?;
		pages += count;
	}
	backend.save(merged, output, &options.compression)?;

	info!(target = "harvest", files = inputs.len(), pages, output = %output.display(), "merged document written");
	Ok(MergeOutcome::Merged(MergeSummary {
		files: inputs,
		pages,
		output: output.to_path_buf(),
	}))
}

fn collect_inputs(dir: &Path, output: &Path, extension: &str) -> Result<Vec<PathBuf>, MergeError> {
	let list_err = |source| MergeError::ListInput {
		path: dir.to_path_buf(),
		source,
	};
	let entries = match std::fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
		Err(err) => return Err(list_err(err)),
	};

	let extension = extension.trim_start_matches('.');
	let output = std::fs::canonicalize(output).ok();
	let mut inputs = Vec::new();
	for entry in entries {
		let entry = entry.map_err(list_err)?;
		let path = entry.path();
		if !entry.file_type().map_err(list_err)?.is_file() {
			continue;
		}
		let matches = path
			.extension()
			.and_then(|e| e.to_str())
			.is_some_and(|e| e.eq_ignore_ascii_case(extension));
		if !matches {
			continue;
		}
		if output.is_some() && std::fs::canonicalize(&path).ok() == output {
			debug!(target = "harvest", file = %path.display(), "skipping merge output");
			continue;
		}
		inputs.push(path);
	}
	inputs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
	Ok(inputs)
}
