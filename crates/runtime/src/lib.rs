//! Winium Runtime - driver lifecycle and session-bound dispatch
//!
//! This crate launches a local Winium driver executable and binds its
//! lifetime to an automation session:
//!
//! - **Port allocation**: [`find_free_port`] picks the port the driver binds
//! - **Driver service**: [`DriverService`] spawns the process, waits for
//!   `/status`, and shuts it down
//! - **Executor**: [`HttpCommandExecutor`] sends JSON wire protocol commands
//! - **Dispatcher**: [`SessionDispatcher`] starts the driver on `newSession`
//!   and stops it on `quit`
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ SessionDispatcher  │  newSession → start, quit → stop
//! │  ┌──────────────┐  │
//! │  │ Registry     │  │  name → verb + URL template
//! │  └──────────────┘  │
//! └───┬────────────┬───┘
//!     │            │
//! ┌───▼─────┐ ┌────▼──────────────┐
//! │ Service │ │ CommandExecutor   │  HTTP to http://127.0.0.1:<port>/
//! └─────────┘ └───────────────────┘
//! ```
//!
//! Usage is single-threaded per session: every mutating operation takes
//! `&mut self`.

pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod port;
pub mod service;

pub use dispatcher::SessionDispatcher;
pub use error::{Error, Result};
pub use executor::{CommandExecutor, DEFAULT_COMMAND_TIMEOUT, HttpCommandExecutor};
pub use port::find_free_port;
pub use service::{
	DriverService, RemoteService, ServiceBuilder, ServiceConfig, ServiceLifecycle, ServiceState,
};
pub use winium_protocol as protocol;
