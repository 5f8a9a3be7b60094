//! Capability payloads sent with `newSession`.
//!
//! Each backend has its own options type. Every field is optional and only
//! fields the caller set end up in the [`CapabilitySet`]; unset fields are
//! omitted entirely rather than sent as `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::backend::Backend;

pub const APP: &str = "app";
pub const ARGS: &str = "args";
pub const DEBUG_CONNECT_TO_RUNNING_APP: &str = "debugConnectToRunningApp";
pub const KEYBOARD_SIMULATOR: &str = "keyboardSimulator";
pub const LAUNCH_DELAY: &str = "launchDelay";
pub const DEVICE_NAME: &str = "deviceName";
pub const INNER_PORT: &str = "innerPort";
pub const LAUNCH_TIMEOUT: &str = "launchTimeout";
pub const FILES: &str = "files";
pub const DEPENDENCIES: &str = "dependencies";

/// Flat key/value capability payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(Map<String, Value>);

impl CapabilitySet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		self.0.insert(key.into(), value.into());
	}

	/// Inserts `value` under `key` only when it is `Some`.
	pub fn insert_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
		if let Some(value) = value {
			self.insert(key, value);
		}
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn to_value(&self) -> Value {
		Value::Object(self.0.clone())
	}
}

/// Converts typed options into a minimal [`CapabilitySet`].
pub trait ToCapabilities {
	fn to_capabilities(&self) -> CapabilitySet;
}

/// How the desktop driver synthesises keyboard input.
///
/// Sent as its numeric value, which is what the driver deserialises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyboardSimulatorType {
	BasedOnWindowsFormsSendKeysClass = 0,
	BasedOnInputSimulatorLib = 1,
}

impl From<KeyboardSimulatorType> for Value {
	fn from(kind: KeyboardSimulatorType) -> Self {
		Value::from(kind as u8)
	}
}

/// Options for the desktop driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesktopOptions {
	pub application_path: Option<String>,
	pub arguments: Option<String>,
	pub debug_connect_to_running_app: Option<bool>,
	pub keyboard_simulator: Option<KeyboardSimulatorType>,
	/// Milliseconds to wait after launching the application.
	pub launch_delay: Option<u32>,
}

impl DesktopOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_application_path(mut self, path: impl Into<String>) -> Self {
		self.application_path = Some(path.into());
		self
	}

	pub fn with_arguments(mut self, args: impl Into<String>) -> Self {
		self.arguments = Some(args.into());
		self
	}

	pub fn with_debug_connect_to_running_app(mut self, attach: bool) -> Self {
		self.debug_connect_to_running_app = Some(attach);
		self
	}

	pub fn with_keyboard_simulator(mut self, kind: KeyboardSimulatorType) -> Self {
		self.keyboard_simulator = Some(kind);
		self
	}

	pub fn with_launch_delay(mut self, millis: u32) -> Self {
		self.launch_delay = Some(millis);
		self
	}
}

impl ToCapabilities for DesktopOptions {
	fn to_capabilities(&self) -> CapabilitySet {
		let mut caps = CapabilitySet::new();
		caps.insert_opt(APP, self.application_path.clone());
		caps.insert_opt(ARGS, self.arguments.clone().filter(|a| !a.is_empty()));
		caps.insert_opt(DEBUG_CONNECT_TO_RUNNING_APP, self.debug_connect_to_running_app);
		caps.insert_opt(KEYBOARD_SIMULATOR, self.keyboard_simulator);
		caps.insert_opt(LAUNCH_DELAY, self.launch_delay);
		caps
	}
}

/// Options for the Store apps driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreAppsOptions {
	pub application_path: Option<String>,
	pub debug_connect_to_running_app: Option<bool>,
	/// Extra packages to install alongside the application.
	pub dependencies: Option<Vec<String>>,
	pub device_name: Option<String>,
	/// Files to deploy, local path to device path.
	pub files: Option<BTreeMap<String, String>>,
	pub launch_delay: Option<u32>,
	pub launch_timeout: Option<u32>,
}

impl StoreAppsOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_application_path(mut self, path: impl Into<String>) -> Self {
		self.application_path = Some(path.into());
		self
	}

	pub fn with_debug_connect_to_running_app(mut self, attach: bool) -> Self {
		self.debug_connect_to_running_app = Some(attach);
		self
	}

	pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.dependencies = Some(deps.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
		self.device_name = Some(name.into());
		self
	}

	pub fn with_file(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
		self.files
			.get_or_insert_with(BTreeMap::new)
			.insert(source.into(), target.into());
		self
	}

	pub fn with_launch_delay(mut self, millis: u32) -> Self {
		self.launch_delay = Some(millis);
		self
	}

	pub fn with_launch_timeout(mut self, millis: u32) -> Self {
		self.launch_timeout = Some(millis);
		self
	}
}

impl ToCapabilities for StoreAppsOptions {
	fn to_capabilities(&self) -> CapabilitySet {
		let mut caps = CapabilitySet::new();
		caps.insert_opt(APP, self.application_path.clone());
		if let Some(files) = self.files.as_ref().filter(|f| !f.is_empty()) {
			let files: Map<String, Value> = files
				.iter()
				.map(|(k, v)| (k.clone(), Value::from(v.as_str())))
				.collect();
			caps.insert(FILES, files);
		}
		caps.insert_opt(DEBUG_CONNECT_TO_RUNNING_APP, self.debug_connect_to_running_app);
		caps.insert_opt(DEVICE_NAME, self.device_name.clone().filter(|d| !d.is_empty()));
		caps.insert_opt(LAUNCH_TIMEOUT, self.launch_timeout);
		caps.insert_opt(LAUNCH_DELAY, self.launch_delay);
		caps.insert_opt(DEPENDENCIES, self.dependencies.clone().filter(|d| !d.is_empty()));
		caps
	}
}

/// Options for the Windows Phone Silverlight driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SilverlightOptions {
	pub application_path: Option<String>,
	pub debug_connect_to_running_app: Option<bool>,
	pub device_name: Option<String>,
	/// Port of the automation server inside the app on the device.
	pub inner_port: Option<u16>,
	pub launch_delay: Option<u32>,
	pub launch_timeout: Option<u32>,
}

impl SilverlightOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_application_path(mut self, path: impl Into<String>) -> Self {
		self.application_path = Some(path.into());
		self
	}

	pub fn with_debug_connect_to_running_app(mut self, attach: bool) -> Self {
		self.debug_connect_to_running_app = Some(attach);
		self
	}

	pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
		self.device_name = Some(name.into());
		self
	}

	pub fn with_inner_port(mut self, port: u16) -> Self {
		self.inner_port = Some(port);
		self
	}

	pub fn with_launch_delay(mut self, millis: u32) -> Self {
		self.launch_delay = Some(millis);
		self
	}

	pub fn with_launch_timeout(mut self, millis: u32) -> Self {
		self.launch_timeout = Some(millis);
		self
	}
}

impl ToCapabilities for SilverlightOptions {
	fn to_capabilities(&self) -> CapabilitySet {
		let mut caps = CapabilitySet::new();
		caps.insert_opt(APP, self.application_path.clone());
		caps.insert_opt(DEBUG_CONNECT_TO_RUNNING_APP, self.debug_connect_to_running_app);
		caps.insert_opt(DEVICE_NAME, self.device_name.clone().filter(|d| !d.is_empty()));
		caps.insert_opt(LAUNCH_TIMEOUT, self.launch_timeout);
		caps.insert_opt(LAUNCH_DELAY, self.launch_delay);
		caps.insert_opt(INNER_PORT, self.inner_port);
		caps
	}
}

/// Options for any backend, tagged with the backend they target.
#[derive(Debug, Clone, PartialEq)]
pub enum Options {
	Desktop(DesktopOptions),
	StoreApps(StoreAppsOptions),
	Silverlight(SilverlightOptions),
}

impl Options {
	/// Backend whose driver understands these options.
	pub fn backend(&self) -> Backend {
		match self {
			Options::Desktop(_) => Backend::Desktop,
			Options::StoreApps(_) => Backend::StoreApps,
			Options::Silverlight(_) => Backend::Silverlight,
		}
	}
}

impl ToCapabilities for Options {
	fn to_capabilities(&self) -> CapabilitySet {
		match self {
			Options::Desktop(o) => o.to_capabilities(),
			Options::StoreApps(o) => o.to_capabilities(),
			Options::Silverlight(o) => o.to_capabilities(),
		}
	}
}

impl From<DesktopOptions> for Options {
	fn from(o: DesktopOptions) -> Self {
		Options::Desktop(o)
	}
}

impl From<StoreAppsOptions> for Options {
	fn from(o: StoreAppsOptions) -> Self {
		Options::StoreApps(o)
	}
}

impl From<SilverlightOptions> for Options {
	fn from(o: SilverlightOptions) -> Self {
		Options::Silverlight(o)
	}
}
