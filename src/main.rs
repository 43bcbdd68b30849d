use crate::commandline::Commandline;
use crate::error::QueueviError;
use clap::Parser;

mod commandline;
mod configuration;
mod connection;
mod context;
mod error;
mod lifecycle;
mod message;
mod playlist;
mod resolver;
mod room;
mod server;
mod snapshot;
mod utils;

#[tokio::main]
async fn main() -> Result<(), QueueviError> {
	Commandline::parse().run().await
}
