//! Driver backends and their static data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// UI technology served by a Winium driver executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
	/// Classic Windows desktop applications (WinForms, WPF).
	Desktop,
	/// Windows Store apps.
	StoreApps,
	/// Windows Phone Silverlight apps.
	Silverlight,
}

impl Backend {
	pub const ALL: [Backend; 3] = [Backend::Desktop, Backend::StoreApps, Backend::Silverlight];

	/// File name of the driver executable.
	pub fn executable_file_name(&self) -> &'static str {
		match self {
			Backend::Desktop => "Winium.Desktop.Driver.exe",
			Backend::StoreApps => "Winium.StoreApps.Driver.exe",
			Backend::Silverlight => "WindowsPhoneDriver.OuterDriver.exe",
		}
	}

	/// Where to download the driver from; only used in diagnostics.
	pub fn download_url(&self) -> &'static str {
		match self {
			Backend::Desktop => "https://github.com/2gis/Winium.Desktop/releases",
			Backend::StoreApps => "https://github.com/2gis/Winium.StoreApps/releases",
			Backend::Silverlight => "https://github.com/2gis/winphonedriver/releases",
		}
	}

	pub fn docs_url(&self) -> &'static str {
		match self {
			Backend::Desktop => "https://github.com/2gis/Winium.Desktop",
			Backend::StoreApps => "https://github.com/2gis/Winium.StoreApps",
			Backend::Silverlight => "https://github.com/2gis/winphonedriver",
		}
	}

	/// Environment variable that overrides the driver executable location.
	pub fn executable_env_var(&self) -> &'static str {
		match self {
			Backend::Desktop => "WINIUM_DESKTOP_DRIVER",
			Backend::StoreApps => "WINIUM_STOREAPPS_DRIVER",
			Backend::Silverlight => "WINIUM_SILVERLIGHT_DRIVER",
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Backend::Desktop => "desktop",
			Backend::StoreApps => "store-apps",
			Backend::Silverlight => "silverlight",
		}
	}
}

impl fmt::Display for Backend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Backend {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"desktop" => Ok(Backend::Desktop),
			"store-apps" | "storeapps" => Ok(Backend::StoreApps),
			"silverlight" | "phone" => Ok(Backend::Silverlight),
			other => Err(format!(
				"unknown backend '{other}' (expected desktop, store-apps or silverlight)"
			)),
		}
	}
}
