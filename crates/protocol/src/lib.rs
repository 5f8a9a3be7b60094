//! Winium protocol data.
//!
//! Static, logic-light types shared by the runtime and the CLI:
//!
//! - **Commands**: [`Command`], [`CommandInfo`], [`Response`] and the
//!   [`CommandRegistry`] holding the base and extended Winium command tables
//! - **Backends**: [`Backend`] selects driver executable and download URL
//! - **Capabilities**: per-backend options and the minimal [`CapabilitySet`]
//!   they produce

pub mod backend;
pub mod capabilities;
pub mod command;
pub mod registry;

pub use backend::Backend;
pub use capabilities::{
	CapabilitySet, DesktopOptions, KeyboardSimulatorType, Options, SilverlightOptions,
	StoreAppsOptions, ToCapabilities,
};
pub use command::{Command, CommandInfo, HttpMethod, NEW_SESSION, QUIT, Response};
pub use registry::{CommandRegistry, EXTENDED_COMMANDS};
