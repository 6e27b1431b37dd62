use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber on stderr.
///
/// `RUST_LOG` takes precedence over the verbosity count.
pub fn init_logging(verbose: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn default_directives(verbose: u8) -> &'static str {
	match verbose {
		0 => "warn,harvest=info",
		1 => "warn,harvest=debug",
		2 => "debug",
		_ => "trace",
	}
}
