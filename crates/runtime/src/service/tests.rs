use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use super::*;
use crate::port::find_free_port;

#[cfg(unix)]
fn write_fake_driver(dir: &Path, name: &str, body: &str) {
	let path = dir.join(name);
	fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
	let mut perms = fs::metadata(&path).unwrap().permissions();
	perms.set_mode(0o755);
	fs::set_permissions(&path, perms).unwrap();
}

fn config_in(dir: &Path, name: &str) -> ServiceConfig {
	let mut config = ServiceConfig::new(dir, name, find_free_port().unwrap(), "https://example.invalid/releases");
	config.poll_interval = Duration::from_millis(50);
	config.stop_grace_period = Duration::from_millis(500);
	config
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
	use nix::sys::signal::kill;
	use nix::unistd::Pid;

	kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[test]
fn missing_executable_fails_at_construction() {
	let temp = TempDir::new().unwrap();
	let err = DriverService::new(config_in(temp.path(), "Winium.Desktop.Driver.exe")).unwrap_err();
	match err {
		Error::DriverExecutableNotFound { path, download_url } => {
			assert!(path.ends_with("Winium.Desktop.Driver.exe"));
			assert_eq!(download_url, "https://example.invalid/releases");
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[test]
fn for_backend_reports_backend_download_url() {
	let temp = TempDir::new().unwrap();
	let err = DriverService::for_backend(Backend::Silverlight, temp.path()).unwrap_err();
	assert!(
		err.to_string().contains(Backend::Silverlight.download_url()),
		"{err}"
	);
}

#[cfg(unix)]
#[tokio::test]
async fn start_fails_fast_when_executable_disappears() {
	let temp = TempDir::new().unwrap();
	write_fake_driver(temp.path(), "driver", "exec sleep 30");
	let mut config = config_in(temp.path(), "driver");
	config.startup_timeout = Duration::from_secs(30);
	let mut service = DriverService::new(config).unwrap();

	fs::remove_file(temp.path().join("driver")).unwrap();

	let started = Instant::now();
	let err = service.start().await.unwrap_err();
	assert!(matches!(err, Error::DriverExecutableNotFound { .. }), "{err:?}");
	assert!(started.elapsed() < Duration::from_secs(1));
	assert_eq!(service.state(), ServiceState::Created);
	assert!(service.pid().is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn stop_before_start_is_noop() {
	let temp = TempDir::new().unwrap();
	write_fake_driver(temp.path(), "driver", "exec sleep 30");
	let mut service = DriverService::new(config_in(temp.path(), "driver")).unwrap();

	service.stop().await;
	service.stop().await;
	assert_eq!(service.state(), ServiceState::Created);
	assert!(!service.is_running());
}

#[cfg(unix)]
#[tokio::test]
async fn early_exit_faults_with_code_and_output() {
	let temp = TempDir::new().unwrap();
	write_fake_driver(temp.path(), "driver", "echo \"cannot bind $1\" >&2\nexit 3");
	let mut config = config_in(temp.path(), "driver");
	config.startup_timeout = Duration::from_secs(30);
	let port = config.port;
	let mut service = DriverService::new(config).unwrap();

	let started = Instant::now();
	let err = service.start().await.unwrap_err();
	assert!(started.elapsed() < Duration::from_secs(10), "exit should be detected before the timeout");

	match err {
		Error::ServiceProcessExited { code, output } => {
			assert_eq!(code, Some(3));
			assert!(output.contains(&format!("cannot bind --port={port}")), "output: {output}");
		}
		other => panic!("unexpected error: {other:?}"),
	}
	assert_eq!(service.state(), ServiceState::Faulted);
	assert!(service.pid().is_none());
	assert!(!service.captured_output().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn unresponsive_driver_times_out_and_is_killed() {
	let temp = TempDir::new().unwrap();
	write_fake_driver(temp.path(), "driver", "exec sleep 30");
	let mut config = config_in(temp.path(), "driver");
	config.startup_timeout = Duration::from_millis(600);
	let mut service = DriverService::new(config).unwrap();

	let started = Instant::now();
	let start = service.start();
	let err = start.await.unwrap_err();
	let elapsed = started.elapsed();

	assert!(matches!(err, Error::ServiceStartTimeout { .. }), "{err:?}");
	assert!(elapsed >= Duration::from_millis(600), "returned after {elapsed:?}");
	assert!(elapsed < Duration::from_secs(5), "returned after {elapsed:?}");
	assert_eq!(service.state(), ServiceState::Faulted);
	assert!(service.pid().is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn timed_out_process_does_not_outlive_start() {
	let temp = TempDir::new().unwrap();
	let pid_file = temp.path().join("pid");
	write_fake_driver(
		temp.path(),
		"driver",
		&format!("echo $$ > {}\nexec sleep 30", pid_file.display()),
	);
	let mut config = config_in(temp.path(), "driver");
	config.startup_timeout = Duration::from_millis(400);
	let mut service = DriverService::new(config).unwrap();

	assert!(service.start().await.is_err());

	let pid: u32 = fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
	assert!(!process_alive(pid), "driver process {pid} still alive");
}

#[cfg(unix)]
#[tokio::test]
async fn faulted_service_cannot_restart() {
	let temp = TempDir::new().unwrap();
	write_fake_driver(temp.path(), "driver", "exit 1");
	let mut service = DriverService::new(config_in(temp.path(), "driver")).unwrap();

	assert!(service.start().await.is_err());
	let err = service.start().await.unwrap_err();
	assert!(matches!(err, Error::ServiceTerminated(ServiceState::Faulted)), "{err:?}");

	service.stop().await;
	assert_eq!(service.state(), ServiceState::Faulted);
}

#[cfg(unix)]
#[tokio::test]
async fn command_line_reflects_setters() {
	let temp = TempDir::new().unwrap();
	write_fake_driver(temp.path(), "driver", "exit 0");
	let mut service = DriverService::new(config_in(temp.path(), "driver")).unwrap();
	service.set_silent(true);
	service.set_verbose(true);
	service.set_log_path(Some("/tmp/winium.log".into()));

	let (program, args) = service.command_line();
	assert_eq!(program, temp.path().join("driver"));
	assert_eq!(
		args,
		vec![
			format!("--port={}", service.port()),
			"--silent".to_string(),
			"--verbose".to_string(),
			"--log-path=/tmp/winium.log".to_string(),
		]
	);
}

#[tokio::test]
async fn remote_service_is_inert() {
	let mut remote = RemoteService::new("http://10.0.0.5:9999");
	assert_eq!(ServiceLifecycle::service_url(&remote), "http://10.0.0.5:9999/");
	ServiceLifecycle::start(&mut remote).await.unwrap();
	ServiceLifecycle::stop(&mut remote).await;
}

#[cfg(unix)]
#[tokio::test]
async fn stalled_listener_does_not_stretch_startup_timeout() {
	let temp = TempDir::new().unwrap();
	write_fake_driver(temp.path(), "driver", "exec sleep 30");
	let mut config = config_in(temp.path(), "driver");
	config.startup_timeout = Duration::from_millis(200);
	// Accepts connections through the backlog but never answers.
	let _listener = std::net::TcpListener::bind(("127.0.0.1", config.port)).unwrap();
	let mut service = DriverService::new(config).unwrap();

	let started = Instant::now();
	let err = service.start().await.unwrap_err();
	let elapsed = started.elapsed();

	assert!(matches!(err, Error::ServiceStartTimeout { .. }), "{err:?}");
	assert!(elapsed >= Duration::from_millis(200), "returned after {elapsed:?}");
	assert!(elapsed < Duration::from_millis(700), "returned after {elapsed:?}");
	assert_eq!(service.state(), ServiceState::Faulted);
}
