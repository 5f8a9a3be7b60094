use std::path::{Path, PathBuf};
use std::time::Duration;

use winium_protocol::Backend;

use super::DriverService;
use crate::error::Result;
use crate::port::find_free_port;

/// Default time allowed for the driver to answer its readiness probe.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(20);

/// Default time a driver gets to exit on its own before it is killed.
pub const DEFAULT_STOP_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Default interval between readiness probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Environment variable enabling `--silent` when set to a truthy value.
pub const SILENT_ENV: &str = "WINIUM_DRIVER_SILENT";

/// Environment variable enabling `--verbose` when set to a truthy value.
pub const VERBOSE_ENV: &str = "WINIUM_DRIVER_VERBOSE";

/// Environment variable providing a default `--log-path`.
pub const LOG_PATH_ENV: &str = "WINIUM_DRIVER_LOG_PATH";

/// Everything needed to launch one driver process.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
	/// Directory holding the driver executable.
	pub executable_dir: PathBuf,
	/// File name of the driver executable inside `executable_dir`.
	pub executable_file_name: String,
	/// Port the driver listens on, allocated before the process is spawned.
	pub port: u16,
	/// Shown in diagnostics when the executable is missing.
	pub download_url: String,
	pub startup_timeout: Duration,
	pub stop_grace_period: Duration,
	pub poll_interval: Duration,
	/// Suppress the driver's start-up banner.
	pub silent: bool,
	pub verbose: bool,
	pub log_path: Option<PathBuf>,
	/// Appended after the generated flags.
	pub extra_args: Vec<String>,
}

impl ServiceConfig {
	pub fn new(
		executable_dir: impl Into<PathBuf>,
		executable_file_name: impl Into<String>,
		port: u16,
		download_url: impl Into<String>,
	) -> Self {
		Self {
			executable_dir: executable_dir.into(),
			executable_file_name: executable_file_name.into(),
			port,
			download_url: download_url.into(),
			startup_timeout: DEFAULT_STARTUP_TIMEOUT,
			stop_grace_period: DEFAULT_STOP_GRACE_PERIOD,
			poll_interval: DEFAULT_POLL_INTERVAL,
			silent: false,
			verbose: false,
			log_path: None,
			extra_args: Vec::new(),
		}
	}

	pub fn executable_path(&self) -> PathBuf {
		self.executable_dir.join(&self.executable_file_name)
	}

	/// Arguments passed to the driver, in order: port, `--silent`,
	/// `--verbose`, `--log-path=<path>`, then `extra_args`.
	pub fn command_args(&self) -> Vec<String> {
		let mut args = vec![format!("--port={}", self.port)];
		if self.silent {
			args.push("--silent".to_string());
		}
		if self.verbose {
			args.push("--verbose".to_string());
		}
		if let Some(path) = self.log_path.as_ref().filter(|p| !p.as_os_str().is_empty()) {
			args.push(format!("--log-path={}", path.display()));
		}
		args.extend(self.extra_args.iter().cloned());
		args
	}

	/// Base URL of the driver, with a trailing slash.
	pub fn service_url(&self) -> String {
		format!("http://127.0.0.1:{}/", self.port)
	}
}

/// Builds a [`DriverService`] for a [`Backend`].
///
/// Unset values fall back to the environment, then to the backend defaults:
/// the executable comes from the backend's override variable, then the driver
/// directory, then the current directory.
#[derive(Debug, Clone)]
pub struct ServiceBuilder {
	backend: Backend,
	driver_directory: Option<PathBuf>,
	driver_executable: Option<PathBuf>,
	port: Option<u16>,
	silent: bool,
	verbose: bool,
	log_path: Option<PathBuf>,
	args: Vec<String>,
	startup_timeout: Duration,
	stop_grace_period: Duration,
}

impl ServiceBuilder {
	pub fn new(backend: Backend) -> Self {
		Self {
			backend,
			driver_directory: None,
			driver_executable: None,
			port: None,
			silent: env_flag(SILENT_ENV),
			verbose: env_flag(VERBOSE_ENV),
			log_path: std::env::var_os(LOG_PATH_ENV)
				.filter(|v| !v.is_empty())
				.map(PathBuf::from),
			args: Vec::new(),
			startup_timeout: DEFAULT_STARTUP_TIMEOUT,
			stop_grace_period: DEFAULT_STOP_GRACE_PERIOD,
		}
	}

	/// Directory containing the backend's driver executable.
	pub fn driver_directory(mut self, dir: impl Into<PathBuf>) -> Self {
		self.driver_directory = Some(dir.into());
		self
	}

	/// Full path to the driver executable; wins over the directory.
	pub fn driver_executable(mut self, path: impl Into<PathBuf>) -> Self {
		self.driver_executable = Some(path.into());
		self
	}

	/// Fixed port instead of a freshly allocated one.
	pub fn port(mut self, port: u16) -> Self {
		self.port = Some(port);
		self
	}

	pub fn silent(mut self, silent: bool) -> Self {
		self.silent = silent;
		self
	}

	pub fn verbose(mut self, verbose: bool) -> Self {
		self.verbose = verbose;
		self
	}

	pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.log_path = Some(path.into());
		self
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	pub fn startup_timeout(mut self, timeout: Duration) -> Self {
		self.startup_timeout = timeout;
		self
	}

	pub fn stop_grace_period(mut self, grace: Duration) -> Self {
		self.stop_grace_period = grace;
		self
	}

	/// Resolves the executable, allocates a port if none was given and
	/// validates the result.
	///
	/// # Errors
	///
	/// Returns [`Error::DriverExecutableNotFound`](crate::Error::DriverExecutableNotFound)
	/// if the executable does not exist, or
	/// [`Error::PortAllocation`](crate::Error::PortAllocation) if no port is available.
	pub fn build(self) -> Result<DriverService> {
		DriverService::new(self.into_config()?)
	}

	/// Like [`build`](Self::build) but stops short of the existence check.
	pub fn into_config(self) -> Result<ServiceConfig> {
		let (dir, file_name) = self.resolve_executable();
		let port = match self.port {
			Some(port) => port,
			None => find_free_port()?,
		};

		let mut config = ServiceConfig::new(dir, file_name, port, self.backend.download_url());
		config.silent = self.silent;
		config.verbose = self.verbose;
		config.log_path = self.log_path;
		config.extra_args = self.args;
		config.startup_timeout = self.startup_timeout;
		config.stop_grace_period = self.stop_grace_period;
		Ok(config)
	}

	fn resolve_executable(&self) -> (PathBuf, String) {
		let explicit = self.driver_executable.clone().or_else(|| {
			std::env::var_os(self.backend.executable_env_var())
				.filter(|v| !v.is_empty())
				.map(PathBuf::from)
		});

		if let Some(path) = explicit {
			return split_executable(&path, self.backend);
		}

		let dir = self
			.driver_directory
			.clone()
			.unwrap_or_else(|| PathBuf::from("."));
		(dir, self.backend.executable_file_name().to_string())
	}
}

fn split_executable(path: &Path, backend: Backend) -> (PathBuf, String) {
	let dir = path
		.parent()
		.map(Path::to_path_buf)
		.unwrap_or_else(|| PathBuf::from("."));
	let file_name = path
		.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_else(|| backend.executable_file_name().to_string());
	(dir, file_name)
}

fn env_flag(name: &str) -> bool {
	std::env::var(name)
		.map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
		.unwrap_or(false)
}
