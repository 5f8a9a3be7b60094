//! Spawned driver process and its captured output.

use std::collections::VecDeque;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Lines kept from the driver's stdout and stderr combined.
const OUTPUT_CAPACITY: usize = 256;

/// How long to wait for the pipe drainers once the child has exited.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

type OutputBuffer = Arc<Mutex<VecDeque<String>>>;

/// Exclusively owned handle to a running driver process.
///
/// Both output pipes are drained into a bounded line buffer so the child never
/// blocks on a full pipe. On unix the child leads its own process group, so
/// anything it spawns is signalled together with it.
#[derive(Debug)]
pub(crate) struct ProcessHandle {
	child: Child,
	/// Pid at spawn time; for logging and the process group id only.
	pid: Option<u32>,
	output: OutputBuffer,
	drainers: Vec<JoinHandle<()>>,
}

impl ProcessHandle {
	/// Takes ownership of `child` and starts draining its piped output.
	pub(crate) fn new(mut child: Child) -> Self {
		let output: OutputBuffer = Arc::new(Mutex::new(VecDeque::new()));
		let mut drainers = Vec::with_capacity(2);

		if let Some(stdout) = child.stdout.take() {
			drainers.push(tokio::spawn(drain(stdout, "stdout", Arc::clone(&output))));
		}
		if let Some(stderr) = child.stderr.take() {
			drainers.push(tokio::spawn(drain(stderr, "stderr", Arc::clone(&output))));
		}

		Self {
			pid: child.id(),
			child,
			output,
			drainers,
		}
	}

	/// Current pid, `None` once the process has been reaped.
	pub(crate) fn pid(&self) -> Option<u32> {
		self.child.id()
	}

	/// Exit status if the process has already exited.
	pub(crate) fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
		self.child.try_wait()
	}

	/// Captured output lines, oldest first.
	pub(crate) fn output_lines(&self) -> Vec<String> {
		self.output.lock().iter().cloned().collect()
	}

	/// Waits briefly for the drainers to hit EOF, then returns all captured output.
	pub(crate) async fn collect_output(&mut self) -> String {
		self.join_drainers().await;
		self.output_lines().join("\n")
	}

	/// Kills the process group and reaps the process.
	pub(crate) async fn kill(mut self) {
		self.kill_group();
		if let Err(e) = self.child.kill().await {
			warn!(target = "winium", pid = ?self.pid, error = %e, "failed to kill driver process");
		}
		self.join_drainers().await;
	}

	/// Asks the process to exit, escalating to a kill after `grace`.
	///
	/// Closing stdin comes first, then SIGTERM on unix. A process still alive
	/// when the grace period ends is killed.
	pub(crate) async fn shutdown(mut self, grace: Duration) {
		drop(self.child.stdin.take());

		// A child reaped earlier (by `try_wait`) may have had its pid reused, so
		// its group is only signalled if it is still ours.
		#[cfg_attr(not(unix), allow(unused_variables))]
		let unreaped = self.child.id().is_some();
		#[cfg(unix)]
		if unreaped {
			self.signal_group(nix::sys::signal::Signal::SIGTERM);
		}

		match tokio::time::timeout(grace, self.child.wait()).await {
			Ok(Ok(status)) => {
				debug!(target = "winium", pid = ?self.pid, %status, "driver process exited");
			}
			Ok(Err(e)) => {
				warn!(target = "winium", pid = ?self.pid, error = %e, "failed to wait for driver process");
				let _ = self.child.start_kill();
			}
			Err(_) => {
				warn!(
					target = "winium",
					pid = ?self.pid,
					grace_ms = grace.as_millis() as u64,
					"driver process ignored shutdown request, killing"
				);
				if let Err(e) = self.child.kill().await {
					warn!(target = "winium", pid = ?self.pid, error = %e, "failed to kill driver process");
				}
			}
		}

		// Leftover children of the driver.
		#[cfg(unix)]
		if unreaped {
			self.signal_group(nix::sys::signal::Signal::SIGKILL);
		}
		self.join_drainers().await;
	}

	/// Non-blocking kill for drop paths.
	pub(crate) fn start_kill(&mut self) {
		self.kill_group();
		let _ = self.child.start_kill();
	}

	/// SIGKILL to the whole group, unless the child was already reaped.
	fn kill_group(&self) {
		#[cfg(unix)]
		if self.child.id().is_some() {
			self.signal_group(nix::sys::signal::Signal::SIGKILL);
		}
	}

	#[cfg(unix)]
	fn signal_group(&self, signal: nix::sys::signal::Signal) {
		use nix::sys::signal::killpg;
		use nix::unistd::Pid;

		let Some(pgid) = self.pid else {
			return;
		};
		if let Err(e) = killpg(Pid::from_raw(pgid as i32), signal) {
			trace!(target = "winium", pgid, %signal, error = %e, "signal not delivered to process group");
		}
	}

	async fn join_drainers(&mut self) {
		for drainer in self.drainers.drain(..) {
			let abort = drainer.abort_handle();
			if tokio::time::timeout(DRAIN_TIMEOUT, drainer).await.is_err() {
				abort.abort();
			}
		}
	}
}

async fn drain<R>(stream: R, name: &'static str, output: OutputBuffer)
where
	R: AsyncRead + Unpin,
{
	let mut lines = BufReader::new(stream).lines();
	loop {
		match lines.next_line().await {
			Ok(Some(line)) => {
				debug!(target = "winium.driver", stream = name, "{line}");
				let mut buf = output.lock();
				if buf.len() == OUTPUT_CAPACITY {
					buf.pop_front();
				}
				buf.push_back(line);
			}
			Ok(None) => break,
			Err(e) => {
				debug!(target = "winium.driver", stream = name, error = %e, "stopped reading driver output");
				break;
			}
		}
	}
}
