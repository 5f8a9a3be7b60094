//! Shared helpers for driver integration tests.
//!
//! The "driver" is a shell script that only sleeps; the HTTP side of the
//! driver is an axum app bound to the port the service was configured with.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use winium_runtime::{ServiceConfig, find_free_port};

pub const DRIVER_NAME: &str = "fake-driver";

/// Writes an executable `/bin/sh` script named [`DRIVER_NAME`] into `dir`.
pub fn write_fake_driver(dir: &Path, body: &str) -> PathBuf {
	let path = dir.join(DRIVER_NAME);
	fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
	let mut perms = fs::metadata(&path).unwrap().permissions();
	perms.set_mode(0o755);
	fs::set_permissions(&path, perms).unwrap();
	path
}

/// Config for the fake driver with short timings.
pub fn fast_config(dir: &Path) -> ServiceConfig {
	let mut config = ServiceConfig::new(dir, DRIVER_NAME, find_free_port().unwrap(), "https://example.invalid");
	config.startup_timeout = Duration::from_secs(10);
	config.poll_interval = Duration::from_millis(50);
	config.stop_grace_period = Duration::from_millis(500);
	config
}

/// True if `pid` exists and is not a zombie waiting to be reaped.
pub fn process_alive(pid: u32) -> bool {
	use nix::sys::signal::kill;
	use nix::unistd::Pid;

	if kill(Pid::from_raw(pid as i32), None).is_err() {
		return false;
	}
	match fs::read_to_string(format!("/proc/{pid}/stat")) {
		// Field 3 is the state; the command name before it is parenthesized.
		Ok(stat) => !matches!(stat.rsplit(')').next().map(str::trim_start), Some(rest) if rest.starts_with('Z')),
		Err(_) => true,
	}
}

/// Requests seen by [`MockDriver`], excluding readiness probes.
#[derive(Default)]
pub struct MockDriver {
	requests: Mutex<Vec<String>>,
	status_probes: AtomicUsize,
	fail_quit: bool,
}

impl MockDriver {
	pub fn requests(&self) -> Vec<String> {
		self.requests.lock().clone()
	}

	pub fn status_probes(&self) -> usize {
		self.status_probes.load(Ordering::SeqCst)
	}

	fn record(&self, line: impl Into<String>) {
		self.requests.lock().push(line.into());
	}
}

/// Serves a minimal JSON wire protocol on `127.0.0.1:port`.
pub async fn spawn_mock_driver(port: u16, fail_quit: bool) -> Arc<MockDriver> {
	let state = Arc::new(MockDriver {
		fail_quit,
		..MockDriver::default()
	});

	let app = Router::new()
		.route("/status", get(status))
		.route("/session", post(new_session))
		.route("/session/{session}", delete(quit))
		.route("/session/{session}/element/{element}/datagrid/row/count", post(row_count))
		.route("/session/{session}/element/{element}/menu/select/{path}", post(select_menu_item))
		.with_state(Arc::clone(&state));

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap();
	tokio::spawn(async move {
		let _ = axum::serve(listener, app).await;
	});
	state
}

async fn status(State(state): State<Arc<MockDriver>>) -> Json<Value> {
	state.status_probes.fetch_add(1, Ordering::SeqCst);
	Json(json!({"status": 0, "value": {"build": {"version": "mock"}}}))
}

async fn new_session(State(state): State<Arc<MockDriver>>, Json(body): Json<Value>) -> Json<Value> {
	state.record(format!("POST /session {}", body["desiredCapabilities"]));
	Json(json!({"sessionId": "mock-session", "status": 0, "value": body["desiredCapabilities"]}))
}

async fn quit(
	State(state): State<Arc<MockDriver>>,
	UrlPath(session): UrlPath<String>,
) -> (StatusCode, Json<Value>) {
	state.record(format!("DELETE /session/{session}"));
	if state.fail_quit {
		return (
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(json!({"sessionId": session, "status": 13, "value": {"message": "quit exploded"}})),
		);
	}
	(StatusCode::OK, Json(json!({"sessionId": session, "status": 0, "value": null})))
}

async fn row_count(
	State(state): State<Arc<MockDriver>>,
	UrlPath((session, element)): UrlPath<(String, String)>,
) -> Json<Value> {
	state.record(format!("POST /session/{session}/element/{element}/datagrid/row/count"));
	Json(json!({"sessionId": session, "status": 0, "value": 12}))
}

async fn select_menu_item(
	State(state): State<Arc<MockDriver>>,
	UrlPath((session, element, path)): UrlPath<(String, String, String)>,
) -> Json<Value> {
	state.record(format!("POST /session/{session}/element/{element}/menu/select/{path}"));
	Json(json!({"sessionId": session, "status": 0, "value": null}))
}
