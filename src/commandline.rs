use crate::configuration::Configuration;
use crate::context::ApplicationContext;
use crate::error::QueueviError;
use crate::resolver::ytdlp::YtDlpBackend;
use crate::server::run_server;
use crate::snapshot::FilePersistence;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser)]
pub struct Commandline {
	#[clap(short = 'c', long = "config-file", default_value = "configuration.toml")]
	pub configuration_file_path: String,
	#[clap(subcommand)]
	pub command: Option<BaseCommand>,
}

#[derive(clap::Parser)]
pub enum BaseCommand {
	/// Run the watch-party server
	Run,
	/// Print the configuration
	Configuration,
}

impl Default for BaseCommand {
	fn default() -> Self {
		Self::Run
	}
}

impl Commandline {
	pub async fn run(self) -> Result<(), QueueviError> {
		let configuration = Configuration::from_file(&self.configuration_file_path)?;

		tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::new(&configuration.log_filters))
			.init();

		match self.command.unwrap_or_default() {
			BaseCommand::Run => {
				let persistence = FilePersistence::new(&configuration.snapshot_file);
				let backend = Arc::new(YtDlpBackend::new(&configuration));
				let context = ApplicationContext::restore(configuration, backend, &persistence)?;

				info!(
					"Starting server on http://{}. Watch connections at 'ws://{}/watch'.",
					context.configuration.address, context.configuration.address
				);
				run_server(context.clone(), shutdown_signal()).await?;

				// Persisting happens on orderly shutdown only; a crashed
				// process keeps the previous snapshot.
				context.persist(&persistence)?;
				info!("Snapshot saved.");
			}
			BaseCommand::Configuration => println!("{configuration:?}"),
		}
		Ok(())
	}
}

async fn shutdown_signal() {
	if let Err(listen_error) = tokio::signal::ctrl_c().await {
		error!("Failed to listen for the shutdown signal: {listen_error}");
	}
}
