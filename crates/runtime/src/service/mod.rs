//! Winium driver process management
//!
//! A [`DriverService`] owns exactly one driver process. It is configured up
//! front (executable, port, flags), started once, and stopped once:
//!
//! ```text
//! Created ──start──▶ Starting ──ready──▶ Running ──stop──▶ Stopping ──▶ Stopped
//!                       │
//!                       └──timeout / early exit──▶ Faulted
//! ```
//!
//! There is no restart in place; a stopped or faulted service must be
//! replaced by a new one (with a new port).

mod config;
mod process;
mod state;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};
use winium_protocol::Backend;

pub use config::{
	DEFAULT_POLL_INTERVAL, DEFAULT_STARTUP_TIMEOUT, DEFAULT_STOP_GRACE_PERIOD, LOG_PATH_ENV,
	SILENT_ENV, ServiceBuilder, ServiceConfig, VERBOSE_ENV,
};
use process::ProcessHandle;
pub use state::ServiceState;

use crate::error::{Error, Result};

/// Upper bound for a single readiness probe request.
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Process lifecycle as seen by the session dispatcher.
///
/// [`DriverService`] is the real implementation; [`RemoteService`] stands in
/// when the driver is managed elsewhere.
#[async_trait]
pub trait ServiceLifecycle: Send {
	/// Starts the driver and waits until it accepts requests. Must be a no-op
	/// when already running.
	async fn start(&mut self) -> Result<()>;

	/// Stops the driver. Must be safe to call repeatedly and in any state.
	async fn stop(&mut self);

	/// Base URL commands are sent to, with a trailing slash.
	fn service_url(&self) -> String;
}

/// Owns and supervises one Winium driver process.
#[derive(Debug)]
pub struct DriverService {
	config: ServiceConfig,
	state: ServiceState,
	process: Option<ProcessHandle>,
	last_output: Vec<String>,
}

impl DriverService {
	/// Creates a service from `config`.
	///
	/// # Errors
	///
	/// Returns [`Error::DriverExecutableNotFound`] if the executable does not
	/// exist. Nothing is spawned.
	pub fn new(config: ServiceConfig) -> Result<Self> {
		ensure_executable(&config)?;
		Ok(Self {
			config,
			state: ServiceState::Created,
			process: None,
			last_output: Vec::new(),
		})
	}

	/// Service for `backend` with its driver in `driver_directory`, on a
	/// freshly allocated port.
	pub fn for_backend(backend: Backend, driver_directory: impl Into<PathBuf>) -> Result<Self> {
		ServiceBuilder::new(backend)
			.driver_directory(driver_directory)
			.build()
	}

	pub fn config(&self) -> &ServiceConfig {
		&self.config
	}

	pub fn state(&self) -> ServiceState {
		self.state
	}

	pub fn port(&self) -> u16 {
		self.config.port
	}

	/// `http://127.0.0.1:<port>/`, valid from construction on.
	pub fn service_url(&self) -> String {
		self.config.service_url()
	}

	/// Process id while a process is held.
	pub fn pid(&self) -> Option<u32> {
		self.process.as_ref().and_then(ProcessHandle::pid)
	}

	/// Program and arguments `start` launches.
	pub fn command_line(&self) -> (PathBuf, Vec<String>) {
		(self.config.executable_path(), self.config.command_args())
	}

	/// Output captured from the driver so far, or from the last process
	/// once it is gone.
	pub fn captured_output(&self) -> Vec<String> {
		match &self.process {
			Some(handle) => handle.output_lines(),
			None => self.last_output.clone(),
		}
	}

	/// Enables `--verbose` for the next start.
	pub fn set_verbose(&mut self, verbose: bool) {
		self.config.verbose = verbose;
	}

	/// Enables `--silent` for the next start.
	pub fn set_silent(&mut self, silent: bool) {
		self.config.silent = silent;
	}

	/// Sets `--log-path` for the next start.
	pub fn set_log_path(&mut self, path: Option<PathBuf>) {
		self.config.log_path = path;
	}

	/// True while running and the process has not exited on its own.
	///
	/// A crash after start is reported here but does not change the state.
	pub fn is_running(&mut self) -> bool {
		if self.state != ServiceState::Running {
			return false;
		}
		match self.process.as_mut().map(ProcessHandle::try_wait) {
			Some(Ok(None)) => true,
			Some(Ok(Some(status))) => {
				warn!(target = "winium", %status, "driver process exited while running");
				false
			}
			Some(Err(e)) => {
				warn!(target = "winium", error = %e, "failed to query driver process");
				false
			}
			None => false,
		}
	}

	/// Launches the driver and waits until it answers on `/status`.
	///
	/// Returns immediately when already running.
	///
	/// # Errors
	///
	/// - [`Error::ServiceTerminated`] if the service was stopped or faulted before
	/// - [`Error::DriverExecutableNotFound`] if the executable disappeared
	/// - [`Error::LaunchFailed`] if the process could not be spawned
	/// - [`Error::ServiceProcessExited`] if the process exits before it is ready
	/// - [`Error::ServiceStartTimeout`] if it is not ready within the startup
	///   timeout; the process is killed
	pub async fn start(&mut self) -> Result<()> {
		match self.state {
			ServiceState::Running => return Ok(()),
			ServiceState::Stopping | ServiceState::Stopped | ServiceState::Faulted => {
				return Err(Error::ServiceTerminated(self.state));
			}
			ServiceState::Starting => {
				// A previous start was cancelled mid-wait.
				if let Some(handle) = self.process.take() {
					handle.kill().await;
				}
			}
			ServiceState::Created => {}
		}

		ensure_executable(&self.config)?;

		let (program, args) = self.command_line();
		let mut cmd = Command::new(&program);
		cmd.args(&args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);
		#[cfg(unix)]
		cmd.process_group(0);

		let child = cmd
			.spawn()
			.map_err(|e| Error::LaunchFailed(format!("{}: {}", program.display(), e)))?;

		let handle = ProcessHandle::new(child);
		info!(
			target = "winium",
			pid = ?handle.pid(),
			program = %program.display(),
			args = ?args,
			"spawned driver process"
		);
		self.process = Some(handle);
		self.transition(ServiceState::Starting);

		match self.wait_until_ready().await {
			Ok(()) => {
				self.transition(ServiceState::Running);
				info!(target = "winium", url = %self.service_url(), "driver ready");
				Ok(())
			}
			Err(e) => {
				if let Some(handle) = self.process.take() {
					self.last_output = handle.output_lines();
					handle.kill().await;
				}
				self.transition(ServiceState::Faulted);
				Err(e)
			}
		}
	}

	/// Stops the driver: close stdin, SIGTERM, then kill after the grace period.
	///
	/// A no-op on a service that was never started or is already stopped or
	/// faulted.
	pub async fn stop(&mut self) {
		match self.state {
			ServiceState::Created => {
				debug!(target = "winium", "stop requested before start, nothing to do");
				return;
			}
			ServiceState::Stopped | ServiceState::Faulted => return,
			ServiceState::Starting | ServiceState::Running | ServiceState::Stopping => {}
		}

		self.transition(ServiceState::Stopping);
		if let Some(handle) = self.process.take() {
			self.last_output = handle.output_lines();
			handle.shutdown(self.config.stop_grace_period).await;
		}
		self.transition(ServiceState::Stopped);
	}

	/// Polls the readiness endpoint until it answers, the process exits, or
	/// the startup timeout elapses. On failure the process is gone afterwards.
	async fn wait_until_ready(&mut self) -> Result<()> {
		let status_url = format!("{}status", self.service_url());
		let timeout = self.config.startup_timeout;
		let poll_interval = self.config.poll_interval;
		let deadline = Instant::now() + timeout;

		let client = reqwest::Client::builder()
			.no_proxy()
			.build()
			.map_err(|e| Error::LaunchFailed(format!("failed to create HTTP client: {}", e)))?;

		loop {
			if let Some(exited) = self.check_exited().await? {
				return Err(exited);
			}

			// A probe never outlives the startup deadline.
			let probe_timeout = PROBE_TIMEOUT.min(deadline.saturating_duration_since(Instant::now()));
			match client.get(&status_url).timeout(probe_timeout).send().await {
				Ok(response) if response.status().is_success() => return Ok(()),
				Ok(response) => {
					trace!(target = "winium", status = %response.status(), "driver not ready yet");
				}
				Err(e) => {
					trace!(target = "winium", error = %e, "driver not ready yet");
				}
			}

			let now = Instant::now();
			if now >= deadline {
				break;
			}
			tokio::time::sleep(poll_interval.min(deadline - now)).await;
		}

		// The process may have died during the final probe.
		if let Some(exited) = self.check_exited().await? {
			return Err(exited);
		}

		warn!(
			target = "winium",
			url = %self.service_url(),
			timeout_ms = timeout.as_millis() as u64,
			"driver did not become ready, killing"
		);
		if let Some(handle) = self.process.take() {
			self.last_output = handle.output_lines();
			handle.kill().await;
		}

		Err(Error::ServiceStartTimeout {
			url: self.service_url(),
			timeout,
		})
	}

	/// Returns the exit error and releases the handle if the process is gone.
	async fn check_exited(&mut self) -> Result<Option<Error>> {
		let Some(handle) = self.process.as_mut() else {
			return Ok(None);
		};
		let Some(status) = handle.try_wait()? else {
			return Ok(None);
		};

		let output = handle.collect_output().await;
		self.last_output = output.lines().map(str::to_string).collect();
		self.process = None;
		warn!(target = "winium", %status, "driver exited before becoming ready");

		Ok(Some(Error::ServiceProcessExited {
			code: status.code(),
			output,
		}))
	}

	fn transition(&mut self, next: ServiceState) {
		debug!(target = "winium", from = %self.state, to = %next, "driver service state");
		self.state = next;
	}
}

impl Drop for DriverService {
	fn drop(&mut self) {
		if let Some(handle) = self.process.as_mut() {
			warn!(
				target = "winium",
				pid = ?handle.pid(),
				"driver service dropped without stop, killing process"
			);
			handle.start_kill();
		}
	}
}

#[async_trait]
impl ServiceLifecycle for DriverService {
	async fn start(&mut self) -> Result<()> {
		DriverService::start(self).await
	}

	async fn stop(&mut self) {
		DriverService::stop(self).await
	}

	fn service_url(&self) -> String {
		DriverService::service_url(self)
	}
}

/// Driver that is started and stopped by someone else.
///
/// Session start and end do not touch any process.
#[derive(Debug, Clone)]
pub struct RemoteService {
	url: String,
}

impl RemoteService {
	pub fn new(url: impl Into<String>) -> Self {
		let mut url = url.into();
		if !url.ends_with('/') {
			url.push('/');
		}
		Self { url }
	}
}

#[async_trait]
impl ServiceLifecycle for RemoteService {
	async fn start(&mut self) -> Result<()> {
		Ok(())
	}

	async fn stop(&mut self) {}

	fn service_url(&self) -> String {
		self.url.clone()
	}
}

fn ensure_executable(config: &ServiceConfig) -> Result<()> {
	let path = config.executable_path();
	if path.is_file() {
		return Ok(());
	}
	Err(Error::DriverExecutableNotFound {
		path,
		download_url: config.download_url.clone(),
	})
}
