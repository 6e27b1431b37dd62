//! Resilient crawl-and-download orchestration for a credential-protected
//! member portal, plus the merge of downloaded documents into one PDF.
//!
//! The browser is reached only through the [`Browser`] capability; the CLI
//! crate provides a WebDriver implementation.

pub mod browser;
pub mod config;
pub mod download;
pub mod enumerate;
pub mod error;
pub mod merge;
pub mod obstruction;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod selector;
pub mod session;
mod settle;
#[cfg(test)]
pub(crate) mod testing;

pub use browser::{Browser, BrowserResult, Element};
pub use config::HarvestConfig;
pub use download::{DownloadWatch, download_all};
pub use enumerate::enumerate_records;
pub use error::{BrowserError, HarvestError, MergeError, Phase, Result};
pub use merge::{DocumentBackend, EmptyMergePolicy, LopdfBackend, MergeOptions, MergeOutcome, MergeSummary, merge};
pub use obstruction::{OverlayReport, dismiss_blocking_overlays};
pub use pipeline::{RunOptions, run_harvest};
pub use progress::{LogProgress, ProgressSink};
pub use record::{DownloadOutcome, DownloadReport, RecordOutcome, RecordRef};
pub use selector::Selector;
pub use session::{Credentials, Session};
