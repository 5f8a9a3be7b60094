//! Named command table.
//!
//! Names are unique and the first registration wins: [`CommandRegistry::try_add_command`]
//! never replaces an existing entry. The extended Winium commands are layered
//! on top of the base protocol through the same call.

use std::collections::HashMap;

use crate::command::{CommandInfo, NEW_SESSION, QUIT};

/// Base remote-automation commands as `(name, verb, template)`.
const BASE_COMMANDS: &[(&str, &str, &str)] = &[
	(NEW_SESSION, "POST", "/session"),
	(QUIT, "DELETE", "/session/{sessionId}"),
	("status", "GET", "/status"),
	("getSessions", "GET", "/sessions"),
	("getSessionCapabilities", "GET", "/session/{sessionId}"),
	("findElement", "POST", "/session/{sessionId}/element"),
	("findElements", "POST", "/session/{sessionId}/elements"),
	("findChildElement", "POST", "/session/{sessionId}/element/{id}/element"),
	("findChildElements", "POST", "/session/{sessionId}/element/{id}/elements"),
	("getActiveElement", "POST", "/session/{sessionId}/element/active"),
	("clickElement", "POST", "/session/{sessionId}/element/{id}/click"),
	("clearElement", "POST", "/session/{sessionId}/element/{id}/clear"),
	("sendKeysToElement", "POST", "/session/{sessionId}/element/{id}/value"),
	("sendKeysToActiveElement", "POST", "/session/{sessionId}/keys"),
	("getElementText", "GET", "/session/{sessionId}/element/{id}/text"),
	("getElementAttribute", "GET", "/session/{sessionId}/element/{id}/attribute/{name}"),
	("isElementSelected", "GET", "/session/{sessionId}/element/{id}/selected"),
	("isElementEnabled", "GET", "/session/{sessionId}/element/{id}/enabled"),
	("isElementDisplayed", "GET", "/session/{sessionId}/element/{id}/displayed"),
	("getElementLocation", "GET", "/session/{sessionId}/element/{id}/location"),
	("getElementSize", "GET", "/session/{sessionId}/element/{id}/size"),
	("getTitle", "GET", "/session/{sessionId}/title"),
	("getPageSource", "GET", "/session/{sessionId}/source"),
	("screenshot", "GET", "/session/{sessionId}/screenshot"),
	("getCurrentWindowHandle", "GET", "/session/{sessionId}/window_handle"),
	("getWindowHandles", "GET", "/session/{sessionId}/window_handles"),
	("switchToWindow", "POST", "/session/{sessionId}/window"),
	("close", "DELETE", "/session/{sessionId}/window"),
	("executeScript", "POST", "/session/{sessionId}/execute"),
	("mouseMoveTo", "POST", "/session/{sessionId}/moveto"),
	("mouseClick", "POST", "/session/{sessionId}/click"),
	("mouseDoubleClick", "POST", "/session/{sessionId}/doubleclick"),
	("mouseButtonDown", "POST", "/session/{sessionId}/buttondown"),
	("mouseButtonUp", "POST", "/session/{sessionId}/buttonup"),
	("setTimeout", "POST", "/session/{sessionId}/timeouts"),
	("implicitlyWait", "POST", "/session/{sessionId}/timeouts/implicit_wait"),
];

/// Winium control commands (grid, list box, menu, combo box).
pub const EXTENDED_COMMANDS: &[(&str, &str)] = &[
	("findDataGridCell", "/session/{sessionId}/element/{id}/datagrid/cell/{row}/{column}"),
	("getDataGridColumnCount", "/session/{sessionId}/element/{id}/datagrid/column/count"),
	("getDataGridRowCount", "/session/{sessionId}/element/{id}/datagrid/row/count"),
	("scrollToDataGridCell", "/session/{sessionId}/element/{id}/datagrid/scroll/{row}/{column}"),
	("selectDataGridCell", "/session/{sessionId}/element/{id}/datagrid/select/{row}/{column}"),
	("scrollToListBoxItem", "/session/{sessionId}/element/{id}/listbox/scroll"),
	("findMenuItem", "/session/{sessionId}/element/{id}/menu/item/{path}"),
	("selectMenuItem", "/session/{sessionId}/element/{id}/menu/select/{path}"),
	("isComboBoxExpanded", "/session/{sessionId}/element/{id}/combobox/expanded"),
	("expandComboBox", "/session/{sessionId}/element/{id}/combobox/expand"),
	("collapseComboBox", "/session/{sessionId}/element/{id}/combobox/collapse"),
	("findComboBoxSelectedItem", "/session/{sessionId}/element/{id}/combobox/items/selected"),
	("scrollToComboBoxItem", "/session/{sessionId}/element/{id}/combobox/scroll"),
];

/// Mapping from command name to [`CommandInfo`].
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
	commands: HashMap<String, CommandInfo>,
}

impl CommandRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a registry holding the base protocol commands.
	pub fn with_base_commands() -> Self {
		let mut registry = Self::new();
		for (name, method, template) in BASE_COMMANDS {
			let info = match *method {
				"GET" => CommandInfo::get(*template),
				"DELETE" => CommandInfo::delete(*template),
				_ => CommandInfo::post(*template),
			};
			registry.try_add_command(*name, info);
		}
		registry
	}

	/// Creates a registry holding the base and the extended Winium commands.
	pub fn winium() -> Self {
		let mut registry = Self::with_base_commands();
		registry.register_extended_commands();
		registry
	}

	/// Adds the grid/list box/menu/combo box commands, leaving any entry
	/// already registered under the same name untouched.
	pub fn register_extended_commands(&mut self) {
		for (name, template) in EXTENDED_COMMANDS {
			self.try_add_command(*name, CommandInfo::post(*template));
		}
	}

	/// Inserts `info` under `name` unless the name is taken.
	///
	/// Returns `true` if the entry was inserted.
	pub fn try_add_command(&mut self, name: impl Into<String>, info: CommandInfo) -> bool {
		let name = name.into();
		if self.commands.contains_key(&name) {
			return false;
		}
		self.commands.insert(name, info);
		true
	}

	pub fn get(&self, name: &str) -> Option<&CommandInfo> {
		self.commands.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.commands.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.commands.len()
	}

	pub fn is_empty(&self) -> bool {
		self.commands.is_empty()
	}

	/// Entries sorted by name.
	pub fn sorted(&self) -> Vec<(&str, &CommandInfo)> {
		let mut entries: Vec<_> = self.commands.iter().map(|(k, v)| (k.as_str(), v)).collect();
		entries.sort_by(|a, b| a.0.cmp(b.0));
		entries
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::command::HttpMethod;

	#[test]
	fn try_add_keeps_first_registration() {
		let mut registry = CommandRegistry::new();
		assert!(registry.try_add_command("custom", CommandInfo::post("/first")));
		assert!(!registry.try_add_command("custom", CommandInfo::get("/second")));

		let info = registry.get("custom").unwrap();
		assert_eq!(info.path_template, "/first");
		assert_eq!(info.method, HttpMethod::Post);
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn winium_registry_has_all_extended_commands_as_post() {
		let registry = CommandRegistry::winium();
		assert_eq!(EXTENDED_COMMANDS.len(), 13);
		for (name, template) in EXTENDED_COMMANDS {
			let info = registry.get(name).unwrap_or_else(|| panic!("missing {name}"));
			assert_eq!(info.method, HttpMethod::Post);
			assert_eq!(&info.path_template, template);
			assert!(info.path_template.starts_with("/session/{sessionId}/element/{id}/"));
		}
	}

	#[test]
	fn extended_commands_do_not_override_existing_entries() {
		let mut registry = CommandRegistry::with_base_commands();
		registry.try_add_command("expandComboBox", CommandInfo::get("/custom/expand"));
		registry.register_extended_commands();
		assert_eq!(registry.get("expandComboBox").unwrap().path_template, "/custom/expand");
	}

	#[test]
	fn base_commands_route_session_lifecycle() {
		let registry = CommandRegistry::with_base_commands();
		assert_eq!(registry.get(NEW_SESSION), Some(&CommandInfo::post("/session")));
		assert_eq!(registry.get(QUIT), Some(&CommandInfo::delete("/session/{sessionId}")));
		assert!(!registry.contains("findDataGridCell"));
	}

	#[test]
	fn sorted_is_ordered_by_name() {
		let registry = CommandRegistry::winium();
		let names: Vec<_> = registry.sorted().into_iter().map(|(n, _)| n).collect();
		let mut expected = names.clone();
		expected.sort();
		assert_eq!(names, expected);
		assert_eq!(names.len(), registry.len());
	}
}
