//! Session-bound command dispatch.
//!
//! [`SessionDispatcher`] ties a driver process to a session: `newSession`
//! starts the process before the command is sent, `quit` stops it after the
//! command was sent whatever the outcome. Every other command passes straight
//! through to the wrapped [`CommandExecutor`].

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use winium_protocol::{Command, CommandInfo, CommandRegistry, Options, Response, ToCapabilities};

use crate::error::{Error, Result};
use crate::executor::{CommandExecutor, HttpCommandExecutor};
use crate::service::{DriverService, RemoteService, ServiceBuilder, ServiceLifecycle};

/// Routes commands to a driver whose process lives exactly as long as the session.
///
/// The command registry is owned by the dispatcher and mutated through
/// `&mut self`, so registration has to finish before the dispatcher is shared.
#[derive(Debug)]
pub struct SessionDispatcher<S = DriverService, E = HttpCommandExecutor> {
	service: S,
	executor: E,
	registry: CommandRegistry,
}

impl<S, E> SessionDispatcher<S, E>
where
	S: ServiceLifecycle,
	E: CommandExecutor,
{
	/// Wraps `service` and `executor` with the base and extended Winium commands.
	pub fn new(service: S, executor: E) -> Self {
		Self::with_registry(service, executor, CommandRegistry::with_base_commands())
	}

	/// Like [`new`](Self::new) but starting from `registry`. Extended commands
	/// are layered on top without replacing entries it already has.
	pub fn with_registry(service: S, executor: E, mut registry: CommandRegistry) -> Self {
		registry.register_extended_commands();
		Self {
			service,
			executor,
			registry,
		}
	}

	pub fn registry(&self) -> &CommandRegistry {
		&self.registry
	}

	/// Registers `info` under `name` unless the name is taken.
	///
	/// Returns `true` if the command was added.
	pub fn try_add_command(&mut self, name: impl Into<String>, info: CommandInfo) -> bool {
		self.registry.try_add_command(name, info)
	}

	pub fn service(&self) -> &S {
		&self.service
	}

	pub fn service_mut(&mut self) -> &mut S {
		&mut self.service
	}

	pub fn executor(&self) -> &E {
		&self.executor
	}

	pub fn into_service(self) -> S {
		self.service
	}

	/// Executes `command`.
	///
	/// - `newSession` starts the service first; if that fails nothing is sent.
	/// - `quit` is sent, then the service is stopped exactly once, even when
	///   sending failed. The send result is returned afterwards.
	/// - Anything else is forwarded unchanged.
	///
	/// # Errors
	///
	/// - [`Error::InvalidArgument`] for a command without a name
	/// - [`Error::UnknownCommand`] for a name missing from the registry
	/// - start failures from the service for `newSession`
	/// - executor errors, unmodified
	pub async fn execute(&mut self, command: Command) -> Result<Response> {
		if command.name.trim().is_empty() {
			return Err(Error::InvalidArgument("command name may not be empty".to_string()));
		}

		let info = self.registry.get(&command.name);

		if command.is_new_session() {
			if info.is_none() {
				return Err(Error::UnknownCommand(command.name));
			}
			self.service.start().await?;
		}

		let result = match info {
			Some(info) => self.executor.execute(info, &command).await,
			None => Err(Error::UnknownCommand(command.name.clone())),
		};

		if command.is_quit() {
			if let Err(e) = &result {
				warn!(target = "winium", error = %e, "quit failed, stopping driver anyway");
			}
			self.service.stop().await;
		} else {
			debug!(target = "winium", command = %command.name, ok = result.is_ok(), "command dispatched");
		}

		result
	}

	/// Creates a session with `options` and returns its id.
	pub async fn new_session(&mut self, options: &impl ToCapabilities) -> Result<String> {
		let response = self
			.execute(Command::new_session(&options.to_capabilities()))
			.await?;
		response
			.session_id
			.ok_or_else(|| Error::Remote {
				status: response.status,
				message: format!("newSession returned no session id: {}", response.value),
			})
	}

	/// Ends `session_id`, stopping the service.
	pub async fn quit(&mut self, session_id: &str) -> Result<()> {
		self.execute(Command::quit(session_id)).await.map(|_| ())
	}

	/// Runs a command against `session_id` and returns its `value`.
	pub async fn call(
		&mut self,
		session_id: &str,
		name: &str,
		params: impl IntoIterator<Item = (&str, Value)>,
	) -> Result<Value> {
		let mut command = Command::new(name).with_session(session_id);
		for (key, value) in params {
			command = command.with_param(key, value);
		}
		self.execute(command).await.map(|r| r.value)
	}
}

impl SessionDispatcher<DriverService, HttpCommandExecutor> {
	/// Dispatcher for `service`, sending commands to its URL.
	pub fn for_service(service: DriverService, command_timeout: Duration) -> Result<Self> {
		let executor = HttpCommandExecutor::new(&service.service_url(), command_timeout)?;
		Ok(Self::new(service, executor))
	}

	/// Dispatcher for the backend `options` target, with the driver found in
	/// `driver_directory` and a freshly allocated port.
	pub fn for_options(
		options: &Options,
		driver_directory: impl Into<PathBuf>,
		command_timeout: Duration,
	) -> Result<Self> {
		let service = ServiceBuilder::new(options.backend())
			.driver_directory(driver_directory)
			.build()?;
		Self::for_service(service, command_timeout)
	}
}

impl SessionDispatcher<RemoteService, HttpCommandExecutor> {
	/// Dispatcher for a driver already running at `url`; no process is managed.
	pub fn remote(url: &str, command_timeout: Duration) -> Result<Self> {
		let service = RemoteService::new(url);
		let executor = HttpCommandExecutor::new(&service.service_url(), command_timeout)?;
		Ok(Self::new(service, executor))
	}
}
