use std::fmt;

/// Lifecycle state of a [`DriverService`](super::DriverService).
///
/// Advances `Created → Starting → Running → Stopping → Stopped`, or
/// `Starting → Faulted` when the driver times out or exits early. `Stopped`
/// and `Faulted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
	Created,
	Starting,
	Running,
	Stopping,
	Stopped,
	Faulted,
}

impl ServiceState {
	pub fn is_terminal(&self) -> bool {
		matches!(self, ServiceState::Stopped | ServiceState::Faulted)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ServiceState::Created => "created",
			ServiceState::Starting => "starting",
			ServiceState::Running => "running",
			ServiceState::Stopping => "stopping",
			ServiceState::Stopped => "stopped",
			ServiceState::Faulted => "faulted",
		}
	}
}

impl fmt::Display for ServiceState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
