//! Commands, command routing info and responses of the JSON wire protocol.
//!
//! A [`Command`] is what a caller wants done (a name plus parameters). A
//! [`CommandInfo`] is how the server expects to receive it (an HTTP verb plus
//! a URL template). The [`CommandRegistry`](crate::CommandRegistry) maps the
//! former to the latter.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::capabilities::CapabilitySet;

/// Name of the command that creates a session.
pub const NEW_SESSION: &str = "newSession";

/// Name of the command that ends a session.
pub const QUIT: &str = "quit";

/// Placeholder filled from [`Command::session_id`] rather than from parameters.
pub const SESSION_ID_PLACEHOLDER: &str = "sessionId";

/// HTTP verb used to send a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	Get,
	Post,
	Delete,
}

impl HttpMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Delete => "DELETE",
		}
	}
}

impl fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Verb and URL template for one named command.
///
/// Templates use `{name}` placeholders, e.g.
/// `/session/{sessionId}/element/{id}/datagrid/cell/{row}/{column}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
	pub method: HttpMethod,
	pub path_template: String,
}

impl CommandInfo {
	pub fn new(method: HttpMethod, path_template: impl Into<String>) -> Self {
		Self {
			method,
			path_template: path_template.into(),
		}
	}

	pub fn get(path_template: impl Into<String>) -> Self {
		Self::new(HttpMethod::Get, path_template)
	}

	pub fn post(path_template: impl Into<String>) -> Self {
		Self::new(HttpMethod::Post, path_template)
	}

	pub fn delete(path_template: impl Into<String>) -> Self {
		Self::new(HttpMethod::Delete, path_template)
	}

	/// Placeholder names in template order.
	pub fn placeholders(&self) -> Vec<&str> {
		let mut names = Vec::new();
		let mut rest = self.path_template.as_str();
		while let Some(start) = rest.find('{') {
			let Some(len) = rest[start + 1..].find('}') else {
				break;
			};
			names.push(&rest[start + 1..start + 1 + len]);
			rest = &rest[start + 1 + len + 1..];
		}
		names
	}

	/// Fills the template from `command`, returning the request path and the
	/// parameters left over for the request body.
	///
	/// `{sessionId}` comes from [`Command::session_id`]; every other
	/// placeholder consumes the parameter of the same name. String values are
	/// inserted verbatim, other JSON values by their JSON text.
	///
	/// # Errors
	///
	/// Returns the name of the first placeholder that has no value.
	pub fn resolve(&self, command: &Command) -> Result<(String, Map<String, Value>), String> {
		let mut body = command.parameters.clone();
		let mut path = String::with_capacity(self.path_template.len());
		let mut rest = self.path_template.as_str();

		while let Some(start) = rest.find('{') {
			let Some(len) = rest[start + 1..].find('}') else {
				break;
			};
			path.push_str(&rest[..start]);
			let name = &rest[start + 1..start + 1 + len];

			let value = if name == SESSION_ID_PLACEHOLDER {
				command.session_id.clone()
			} else {
				body.remove(name).map(|v| match v {
					Value::String(s) => s,
					other => other.to_string(),
				})
			};
			match value {
				Some(v) => path.push_str(&v),
				None => return Err(name.to_string()),
			}

			rest = &rest[start + 1 + len + 1..];
		}
		path.push_str(rest);

		Ok((path, body))
	}
}

/// A named command with its runtime parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
	#[serde(default)]
	pub parameters: Map<String, Value>,
}

impl Command {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			session_id: None,
			parameters: Map::new(),
		}
	}

	/// `newSession` carrying `caps` as desired capabilities.
	pub fn new_session(caps: &CapabilitySet) -> Self {
		Self::new(NEW_SESSION).with_param("desiredCapabilities", caps.to_value())
	}

	/// `quit` for the given session.
	pub fn quit(session_id: impl Into<String>) -> Self {
		Self::new(QUIT).with_session(session_id)
	}

	pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
		self.session_id = Some(session_id.into());
		self
	}

	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.parameters.insert(name.into(), value.into());
		self
	}

	pub fn is_new_session(&self) -> bool {
		self.name == NEW_SESSION
	}

	pub fn is_quit(&self) -> bool {
		self.name == QUIT
	}
}

/// Server reply in JSON wire protocol shape.
///
/// `status` is `0` on success; anything else is a protocol-level failure
/// whose message lives in `value.message`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
	#[serde(default)]
	pub status: i64,
	#[serde(default)]
	pub value: Value,
}

impl Response {
	pub fn is_success(&self) -> bool {
		self.status == 0
	}

	/// Error message carried in `value.message`, if any.
	pub fn error_message(&self) -> Option<&str> {
		self.value.get("message").and_then(Value::as_str)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn placeholders_are_listed_in_order() {
		let info = CommandInfo::post("/session/{sessionId}/element/{id}/datagrid/cell/{row}/{column}");
		assert_eq!(info.placeholders(), vec!["sessionId", "id", "row", "column"]);
	}

	#[test]
	fn resolve_consumes_path_parameters() {
		let info = CommandInfo::post("/session/{sessionId}/element/{id}/datagrid/cell/{row}/{column}");
		let command = Command::new("findDataGridCell")
			.with_session("s-1")
			.with_param("id", "grid-7")
			.with_param("row", 3)
			.with_param("column", 1)
			.with_param("extra", true);

		let (path, body) = info.resolve(&command).unwrap();
		assert_eq!(path, "/session/s-1/element/grid-7/datagrid/cell/3/1");
		assert_eq!(body.len(), 1);
		assert_eq!(body["extra"], json!(true));
	}

	#[test]
	fn resolve_reports_missing_placeholder() {
		let info = CommandInfo::post("/session/{sessionId}/element/{id}/menu/item/{path}");
		let command = Command::new("findMenuItem").with_session("s").with_param("id", "m");
		assert_eq!(info.resolve(&command).unwrap_err(), "path");
	}

	#[test]
	fn resolve_without_session_fails_on_session_placeholder() {
		let info = CommandInfo::delete("/session/{sessionId}");
		assert_eq!(info.resolve(&Command::new(QUIT)).unwrap_err(), "sessionId");
	}

	#[test]
	fn new_session_wraps_desired_capabilities() {
		let mut caps = CapabilitySet::new();
		caps.insert("app", "notepad.exe");
		let command = Command::new_session(&caps);
		assert!(command.is_new_session());
		assert_eq!(command.parameters["desiredCapabilities"], json!({"app": "notepad.exe"}));
	}

	#[test]
	fn response_reads_wire_shape() {
		let response: Response = serde_json::from_value(json!({
			"sessionId": "abc",
			"status": 7,
			"value": {"message": "no such element"}
		}))
		.unwrap();
		assert!(!response.is_success());
		assert_eq!(response.session_id.as_deref(), Some("abc"));
		assert_eq!(response.error_message(), Some("no such element"));
	}
}
