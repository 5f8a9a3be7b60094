use anyhow::Result;
use serde_json::json;
use winium_protocol::ToCapabilities;

use crate::cli::CapabilitiesCommand;

pub fn execute(command: &CapabilitiesCommand) -> Result<()> {
	let options = command.to_options();
	let payload = json!({
		"backend": options.backend().as_str(),
		"desiredCapabilities": options.to_capabilities().to_value(),
	});
	println!("{}", serde_json::to_string_pretty(&payload)?);
	Ok(())
}
