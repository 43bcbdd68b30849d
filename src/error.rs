use crate::configuration::ConfigurationError;
use crate::snapshot::SnapshotError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueviError {
	#[error("Failed to load configuration: {0}")]
	Configuration(#[from] ConfigurationError),
	#[error("Failed to parse commandline: {0}")]
	Commandline(#[from] clap::Error),
	#[error("Failed to restore or persist the playlist snapshot: {0}")]
	Snapshot(#[from] SnapshotError),
	#[error("IO error while serving requests: {0}")]
	Server(#[from] std::io::Error),
}
