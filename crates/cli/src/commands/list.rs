use anyhow::Result;
use winium_protocol::CommandRegistry;

pub fn execute() -> Result<()> {
	let registry = CommandRegistry::winium();
	let width = registry.sorted().iter().map(|(name, _)| name.len()).max().unwrap_or(0);

	for (name, info) in registry.sorted() {
		println!("{name:<width$}  {:<6} {}", info.method.as_str(), info.path_template);
	}
	Ok(())
}
