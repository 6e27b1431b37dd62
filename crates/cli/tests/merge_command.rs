//! Integration tests for the `merge` subcommand.
//!
//! Each test works in its own temporary directory; no browser is involved.

use std::path::Path;
use std::process::Command;

fn run_harvest(args: &[&str]) -> (Option<i32>, String) {
	let output = Command::new(env!("CARGO_BIN_EXE_harvest"))
		.args(args)
		.env_remove("RUST_LOG")
		.env("NO_COLOR", "1")
		.output()
		.expect("Failed to execute harvest");

	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	(output.status.code(), stderr)
}

fn path_arg(path: &Path) -> String {
	path.to_string_lossy().to_string()
}

#[test]
fn empty_directory_succeeds_without_output() {
	let dir = tempfile::tempdir().unwrap();
	let dir_arg = path_arg(dir.path());

	let (code, stderr) = run_harvest(&["merge", &dir_arg]);

	assert_eq!(code, Some(0), "stderr:\n{stderr}");
	assert!(!dir.path().join("1_all.pdf").exists());
}

#[test]
fn placeholder_flag_writes_output() {
	let dir = tempfile::tempdir().unwrap();
	let dir_arg = path_arg(dir.path());
	let output = dir.path().join("out").join("empty.pdf");
	let output_arg = path_arg(&output);

	let (code, stderr) = run_harvest(&["merge", &dir_arg, "-o", &output_arg, "--placeholder-on-empty"]);

	assert_eq!(code, Some(0), "stderr:\n{stderr}");
	let bytes = std::fs::read(&output).unwrap();
	assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn corrupt_input_exits_with_failure() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();
	let dir_arg = path_arg(dir.path());

	let (code, stderr) = run_harvest(&["merge", &dir_arg]);

	assert_eq!(code, Some(1));
	assert!(stderr.contains("broken.pdf"), "stderr:\n{stderr}");
	assert!(!dir.path().join("1_all.pdf").exists());
}

#[test]
fn invalid_config_exits_with_failure() {
	let dir = tempfile::tempdir().unwrap();
	let config = dir.path().join("harvest.json");
	std::fs::write(&config, r#"{"limits": {"maxPages": 0}}"#).unwrap();
	let dir_arg = path_arg(dir.path());
	let config_arg = path_arg(&config);

	let (code, stderr) = run_harvest(&["--config", &config_arg, "merge", &dir_arg]);

	assert_eq!(code, Some(1));
	assert!(stderr.contains("maxPages"), "stderr:\n{stderr}");
}
