//! Error types for the Winium runtime.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::service::ServiceState;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a driver or dispatching commands.
#[derive(Debug, Error)]
pub enum Error {
	/// Driver executable does not exist at the resolved path.
	#[error("Driver executable not found at {}. Download it from {download_url}", path.display())]
	DriverExecutableNotFound { path: PathBuf, download_url: String },

	/// Driver never answered its readiness probe.
	#[error("Driver at {url} did not become ready within {}ms", timeout.as_millis())]
	ServiceStartTimeout { url: String, timeout: Duration },

	/// Driver process exited before it became ready.
	#[error("Driver process exited before becoming ready ({}){}", exit_code_label(*code), output_suffix(output))]
	ServiceProcessExited { code: Option<i32>, output: String },

	/// No free local port could be obtained.
	#[error("Failed to allocate a free port: {0}")]
	PortAllocation(#[source] std::io::Error),

	/// Invalid argument provided to an operation.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// Start requested on a service that already stopped or faulted.
	#[error("Driver service is {0} and cannot be restarted; create a new service")]
	ServiceTerminated(ServiceState),

	/// The OS refused to spawn the driver process.
	#[error("Failed to launch driver: {0}")]
	LaunchFailed(String),

	/// Command name has no entry in the command registry.
	#[error("Unknown command: {0}")]
	UnknownCommand(String),

	/// URL template placeholder had no matching parameter.
	#[error("Command '{command}' is missing parameter '{name}'")]
	MissingParameter { command: String, name: String },

	/// HTTP transport error.
	#[error(transparent)]
	Http(#[from] reqwest::Error),

	/// Driver reported a protocol-level failure.
	#[error("Remote error (status {status}): {message}")]
	Remote { status: i64, message: String },

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// URL parse error.
	#[error("Invalid URL: {0}")]
	Url(#[from] url::ParseError),
}

impl Error {
	/// Returns true for failures that happened while starting the driver.
	pub fn is_startup_failure(&self) -> bool {
		matches!(
			self,
			Error::DriverExecutableNotFound { .. }
				| Error::ServiceStartTimeout { .. }
				| Error::ServiceProcessExited { .. }
				| Error::PortAllocation(_)
				| Error::LaunchFailed(_)
				| Error::ServiceTerminated(_)
		)
	}
}

fn exit_code_label(code: Option<i32>) -> String {
	match code {
		Some(code) => format!("exit code {code}"),
		None => "terminated by signal".to_string(),
	}
}

fn output_suffix(output: &str) -> String {
	if output.trim().is_empty() {
		String::new()
	} else {
		format!(". Output:\n{}", output.trim_end())
	}
}
