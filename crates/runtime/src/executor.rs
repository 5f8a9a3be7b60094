//! Generic command execution over HTTP.
//!
//! The dispatcher hands every command to a [`CommandExecutor`] together with
//! its resolved [`CommandInfo`]. [`HttpCommandExecutor`] is the JSON-over-HTTP
//! implementation; tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;
use winium_protocol::{Command, CommandInfo, HttpMethod, Response};

use crate::error::{Error, Result};

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Sends one command and returns the driver's response.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
	async fn execute(&self, info: &CommandInfo, command: &Command) -> Result<Response>;
}

/// [`CommandExecutor`] speaking the JSON wire protocol via `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpCommandExecutor {
	base_url: Url,
	client: reqwest::Client,
}

impl HttpCommandExecutor {
	/// Creates an executor sending to `base_url`.
	///
	/// # Errors
	///
	/// Returns [`Error::Url`] for an unparsable URL and [`Error::Http`] if the
	/// HTTP client cannot be built.
	pub fn new(base_url: &str, command_timeout: Duration) -> Result<Self> {
		let base_url = Url::parse(base_url)?;
		let client = reqwest::Client::builder()
			.timeout(command_timeout)
			.no_proxy()
			.build()?;
		Ok(Self { base_url, client })
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Appends `path` to the base URL's path, keeping any prefix such as `/wd/hub`.
	fn url_for(&self, path: &str) -> Url {
		let mut url = self.base_url.clone();
		let joined = format!("{}{}", self.base_url.path().trim_end_matches('/'), path);
		url.set_path(&joined);
		url
	}
}

#[async_trait]
impl CommandExecutor for HttpCommandExecutor {
	async fn execute(&self, info: &CommandInfo, command: &Command) -> Result<Response> {
		let (path, body) = info.resolve(command).map_err(|name| Error::MissingParameter {
			command: command.name.clone(),
			name,
		})?;
		let url = self.url_for(&path);

		debug!(
			target = "winium",
			command = %command.name,
			method = %info.method,
			url = %url,
			"sending command"
		);

		let request = match info.method {
			HttpMethod::Get => self.client.get(url),
			HttpMethod::Delete => self.client.delete(url),
			HttpMethod::Post => self.client.post(url).json(&Value::Object(body)),
		};

		let response = request.send().await?;
		let http_status = response.status();
		let bytes = response.bytes().await?;

		let parsed = if bytes.is_empty() {
			None
		} else {
			match serde_json::from_slice::<Value>(&bytes) {
				Ok(value) => Some(value),
				Err(_) if !http_status.is_success() => {
					return Err(Error::Remote {
						status: i64::from(http_status.as_u16()),
						message: String::from_utf8_lossy(&bytes).trim().to_string(),
					});
				}
				Err(e) => return Err(Error::Json(e)),
			}
		};

		let mut reply = match parsed {
			Some(value) => parse_response(value)?,
			None => Response::default(),
		};

		if !http_status.is_success() || !reply.is_success() {
			let status = if reply.status != 0 {
				reply.status
			} else {
				i64::from(http_status.as_u16())
			};
			let message = reply
				.error_message()
				.map(str::to_string)
				.or_else(|| reply.value.get("error").and_then(Value::as_str).map(str::to_string))
				.unwrap_or_else(|| http_status.to_string());
			return Err(Error::Remote { status, message });
		}

		if reply.session_id.is_none() {
			reply.session_id = command.session_id.clone();
		}
		Ok(reply)
	}
}

/// Accepts both the legacy `{sessionId, status, value}` shape and the
/// `{value: {sessionId, ...}}` shape used for new sessions by newer drivers.
fn parse_response(value: Value) -> Result<Response> {
	if !value.is_object() {
		return Ok(Response {
			value,
			..Response::default()
		});
	}

	let mut response: Response = serde_json::from_value(value)?;
	if response.session_id.is_none() {
		response.session_id = response
			.value
			.get("sessionId")
			.and_then(Value::as_str)
			.map(str::to_string);
	}
	Ok(response)
}
