use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{info, warn};
use winium_protocol::Backend;
use winium_runtime::{DriverService, ServiceBuilder};

use crate::cli::ServeArgs;

const LIVENESS_INTERVAL: Duration = Duration::from_secs(1);

pub async fn execute(args: ServeArgs) -> Result<()> {
	let backend = Backend::from(args.backend);
	let mut service = builder_for(args)
		.build()
		.with_context(|| format!("cannot create {backend} driver service"))?;

	service
		.start()
		.await
		.with_context(|| format!("{backend} driver failed to start"))?;

	let ready = json!({
		"backend": backend.as_str(),
		"url": service.service_url(),
		"port": service.port(),
		"pid": service.pid(),
	});
	println!("{ready}");
	info!(target = "winium_cli", url = %service.service_url(), "serving until Ctrl-C");

	let outcome = wait_for_shutdown(&mut service).await;
	service.stop().await;
	outcome
}

fn builder_for(args: ServeArgs) -> ServiceBuilder {
	let mut builder = ServiceBuilder::new(args.backend.into());
	if let Some(dir) = args.driver_dir {
		builder = builder.driver_directory(dir);
	}
	if let Some(driver) = args.driver {
		builder = builder.driver_executable(driver);
	}
	if let Some(port) = args.port {
		builder = builder.port(port);
	}
	// Unset flags keep the WINIUM_DRIVER_* environment defaults.
	if args.silent {
		builder = builder.silent(true);
	}
	if args.verbose_driver {
		builder = builder.verbose(true);
	}
	if let Some(path) = args.log_path {
		builder = builder.log_path(path);
	}
	if let Some(secs) = args.startup_timeout {
		builder = builder.startup_timeout(Duration::from_secs(secs));
	}
	builder.args(args.driver_args)
}

/// Returns on Ctrl-C, or with an error once the driver exits by itself.
async fn wait_for_shutdown(service: &mut DriverService) -> Result<()> {
	let ctrl_c = tokio::signal::ctrl_c();
	tokio::pin!(ctrl_c);
	let mut liveness = tokio::time::interval(LIVENESS_INTERVAL);

	loop {
		tokio::select! {
			result = &mut ctrl_c => {
				result.context("failed to listen for Ctrl-C")?;
				info!(target = "winium_cli", "interrupted, stopping driver");
				return Ok(());
			}
			_ = liveness.tick() => {
				if !service.is_running() {
					let output = service.captured_output();
					warn!(target = "winium_cli", lines = output.len(), "driver exited on its own");
					anyhow::bail!("driver exited unexpectedly:\n{}", output.join("\n"));
				}
			}
		}
	}
}
