use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the stderr subscriber; `RUST_LOG` wins over `verbosity`.
pub fn init_logging(verbosity: u8) {
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_for(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.try_init()
		.ok();
}

// 0 = errors only, driver output hidden
// 1 (-v) = lifecycle events, driver output still hidden
// 2+ (-vv) = everything, including driver stdout/stderr
fn filter_for(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "error,winium.driver=off",
		1 => "warn,winium=info,winium_cli=info,winium.driver=off",
		_ => "debug",
	}
}
