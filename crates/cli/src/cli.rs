use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use winium_protocol::{
	Backend, DesktopOptions, KeyboardSimulatorType, Options, SilverlightOptions, StoreAppsOptions,
};

#[derive(Parser, Debug)]
#[command(name = "winium")]
#[command(about = "Run Winium drivers and build their session capabilities")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Start a driver and keep it running until Ctrl-C
	Serve(ServeArgs),

	/// Print the desired capabilities for a backend as JSON
	#[command(subcommand)]
	Capabilities(CapabilitiesCommand),

	/// List every command a session dispatcher routes, sorted by name
	Commands,
}

/// Driver backend (CLI wrapper for [`Backend`])
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CliBackend {
	#[default]
	Desktop,
	StoreApps,
	Silverlight,
}

impl From<CliBackend> for Backend {
	fn from(backend: CliBackend) -> Self {
		match backend {
			CliBackend::Desktop => Backend::Desktop,
			CliBackend::StoreApps => Backend::StoreApps,
			CliBackend::Silverlight => Backend::Silverlight,
		}
	}
}

#[derive(Args, Debug)]
pub struct ServeArgs {
	/// Driver backend to launch
	#[arg(short, long, value_enum, default_value = "desktop")]
	pub backend: CliBackend,

	/// Directory holding the driver executable
	#[arg(long, value_name = "DIR", conflicts_with = "driver")]
	pub driver_dir: Option<PathBuf>,

	/// Full path to the driver executable
	#[arg(long, value_name = "FILE")]
	pub driver: Option<PathBuf>,

	/// Port for the driver (default: a free local port)
	#[arg(short, long)]
	pub port: Option<u16>,

	/// Pass --silent to the driver
	#[arg(long)]
	pub silent: bool,

	/// Pass --verbose to the driver
	#[arg(long)]
	pub verbose_driver: bool,

	/// Driver log file
	#[arg(long, value_name = "FILE")]
	pub log_path: Option<PathBuf>,

	/// Seconds to wait for the driver to answer /status
	#[arg(long, value_name = "SECS")]
	pub startup_timeout: Option<u64>,

	/// Extra arguments appended to the driver command line
	#[arg(last = true)]
	pub driver_args: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum CapabilitiesCommand {
	/// Winium.Desktop: classic Windows applications
	Desktop(DesktopArgs),

	/// Winium.StoreApps: Windows Store apps on an emulator
	StoreApps(StoreAppsArgs),

	/// Winium for Silverlight apps on Windows Phone
	Silverlight(SilverlightArgs),
}

#[derive(Args, Debug)]
pub struct CommonAppArgs {
	/// Application to launch
	#[arg(long, value_name = "PATH")]
	pub app: Option<String>,

	/// Attach to an already running application
	#[arg(long)]
	pub attach: bool,

	/// Milliseconds to wait after launching the application
	#[arg(long, value_name = "MS")]
	pub launch_delay: Option<u32>,
}

#[derive(Args, Debug)]
pub struct DesktopArgs {
	#[command(flatten)]
	pub common: CommonAppArgs,

	/// Command-line arguments for the application
	#[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
	pub args: Option<String>,

	/// Keyboard simulator used for key input
	#[arg(long, value_enum)]
	pub keyboard_simulator: Option<CliKeyboardSimulator>,
}

#[derive(Args, Debug)]
pub struct StoreAppsArgs {
	#[command(flatten)]
	pub common: CommonAppArgs,

	/// Emulator name prefix
	#[arg(long, value_name = "NAME")]
	pub device_name: Option<String>,

	/// Milliseconds to wait for the emulator to boot
	#[arg(long, value_name = "MS")]
	pub launch_timeout: Option<u32>,

	/// File to deploy, as SOURCE=TARGET
	#[arg(long = "file", value_name = "SOURCE=TARGET", value_parser = parse_file_mapping)]
	pub files: Vec<(String, String)>,

	/// Dependency package installed before the app
	#[arg(long = "dependency", value_name = "PATH")]
	pub dependencies: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SilverlightArgs {
	#[command(flatten)]
	pub common: CommonAppArgs,

	/// Emulator name prefix
	#[arg(long, value_name = "NAME")]
	pub device_name: Option<String>,

	/// Milliseconds to wait for the emulator to boot
	#[arg(long, value_name = "MS")]
	pub launch_timeout: Option<u32>,

	/// Port the automation server inside the app listens on
	#[arg(long)]
	pub inner_port: Option<u16>,
}

/// Keyboard simulator (CLI wrapper for [`KeyboardSimulatorType`])
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliKeyboardSimulator {
	/// System.Windows.Forms.SendKeys
	SendKeys,
	/// InputSimulator library
	InputSimulator,
}

impl From<CliKeyboardSimulator> for KeyboardSimulatorType {
	fn from(kind: CliKeyboardSimulator) -> Self {
		match kind {
			CliKeyboardSimulator::SendKeys => KeyboardSimulatorType::BasedOnWindowsFormsSendKeysClass,
			CliKeyboardSimulator::InputSimulator => KeyboardSimulatorType::BasedOnInputSimulatorLib,
		}
	}
}

fn parse_file_mapping(raw: &str) -> Result<(String, String), String> {
	match raw.split_once('=') {
		Some((source, target)) if !source.is_empty() && !target.is_empty() => {
			Ok((source.to_string(), target.to_string()))
		}
		_ => Err(format!("expected SOURCE=TARGET, got '{raw}'")),
	}
}

impl CapabilitiesCommand {
	/// Options described by the flags; only flags that were given are set.
	pub fn to_options(&self) -> Options {
		match self {
			Self::Desktop(args) => {
				let mut options = DesktopOptions::new();
				if let Some(app) = &args.common.app {
					options = options.with_application_path(app.as_str());
				}
				if let Some(app_args) = &args.args {
					options = options.with_arguments(app_args.as_str());
				}
				if args.common.attach {
					options = options.with_debug_connect_to_running_app(true);
				}
				if let Some(kind) = args.keyboard_simulator {
					options = options.with_keyboard_simulator(kind.into());
				}
				if let Some(delay) = args.common.launch_delay {
					options = options.with_launch_delay(delay);
				}
				options.into()
			}
			Self::StoreApps(args) => {
				let mut options = StoreAppsOptions::new();
				if let Some(app) = &args.common.app {
					options = options.with_application_path(app.as_str());
				}
				if args.common.attach {
					options = options.with_debug_connect_to_running_app(true);
				}
				if let Some(name) = &args.device_name {
					options = options.with_device_name(name.as_str());
				}
				for (source, target) in &args.files {
					options = options.with_file(source.as_str(), target.as_str());
				}
				if !args.dependencies.is_empty() {
					options = options.with_dependencies(args.dependencies.iter().map(String::as_str));
				}
				if let Some(timeout) = args.launch_timeout {
					options = options.with_launch_timeout(timeout);
				}
				if let Some(delay) = args.common.launch_delay {
					options = options.with_launch_delay(delay);
				}
				options.into()
			}
			Self::Silverlight(args) => {
				let mut options = SilverlightOptions::new();
				if let Some(app) = &args.common.app {
					options = options.with_application_path(app.as_str());
				}
				if args.common.attach {
					options = options.with_debug_connect_to_running_app(true);
				}
				if let Some(name) = &args.device_name {
					options = options.with_device_name(name.as_str());
				}
				if let Some(port) = args.inner_port {
					options = options.with_inner_port(port);
				}
				if let Some(timeout) = args.launch_timeout {
					options = options.with_launch_timeout(timeout);
				}
				if let Some(delay) = args.common.launch_delay {
					options = options.with_launch_delay(delay);
				}
				options.into()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;
	use serde_json::json;
	use winium_protocol::ToCapabilities;

	use super::*;

	#[test]
	fn cli_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn serve_parses_driver_flags() {
		let cli = Cli::try_parse_from([
			"winium",
			"-vv",
			"serve",
			"--backend",
			"store-apps",
			"--port",
			"9999",
			"--silent",
			"--log-path",
			"driver.log",
			"--",
			"--extra",
		])
		.unwrap();

		assert_eq!(cli.verbose, 2);
		let Commands::Serve(args) = cli.command else {
			panic!("expected serve");
		};
		assert_eq!(args.backend, CliBackend::StoreApps);
		assert_eq!(args.port, Some(9999));
		assert!(args.silent);
		assert!(!args.verbose_driver);
		assert_eq!(args.log_path, Some(PathBuf::from("driver.log")));
		assert_eq!(args.driver_args, vec!["--extra".to_string()]);
	}

	#[test]
	fn driver_and_driver_dir_conflict() {
		let result = Cli::try_parse_from(["winium", "serve", "--driver", "a.exe", "--driver-dir", "bin"]);
		assert!(result.is_err());
	}

	#[test]
	fn desktop_capabilities_only_carry_given_flags() {
		let cli = Cli::try_parse_from([
			"winium",
			"capabilities",
			"desktop",
			"--app",
			"notepad.exe",
			"--launch-delay",
			"100",
		])
		.unwrap();
		let Commands::Capabilities(command) = cli.command else {
			panic!("expected capabilities");
		};

		let caps = command.to_options().to_capabilities();
		assert_eq!(caps.to_value(), json!({"app": "notepad.exe", "launchDelay": 100}));
	}

	#[test]
	fn store_apps_files_parse_as_mapping() {
		let cli = Cli::try_parse_from([
			"winium",
			"capabilities",
			"store-apps",
			"--file",
			"local.txt=remote.txt",
			"--dependency",
			"dep.appx",
		])
		.unwrap();
		let Commands::Capabilities(command) = cli.command else {
			panic!("expected capabilities");
		};

		let options = command.to_options();
		assert_eq!(options.backend(), Backend::StoreApps);
		let caps = options.to_capabilities();
		assert_eq!(caps.get("files"), Some(&json!({"local.txt": "remote.txt"})));
		assert_eq!(caps.get("dependencies"), Some(&json!(["dep.appx"])));
	}

	#[test]
	fn malformed_file_mapping_is_rejected() {
		assert!(parse_file_mapping("no-separator").is_err());
		assert!(parse_file_mapping("=target").is_err());
	}
}
