mod capabilities;
mod list;
mod serve;

use anyhow::Result;

use crate::cli::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> Result<()> {
	match cli.command {
		Commands::Serve(args) => serve::execute(args).await,
		Commands::Capabilities(command) => capabilities::execute(&command),
		Commands::Commands => list::execute(),
	}
}
