use crate::playlist::media::MediaEntry;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
	#[error("The resolver tool did not finish in time.")]
	Timeout,
	#[error("{0}")]
	Failed(String),
}

/// Turns media references into playable entries. How the implementation
/// reaches the outside world (tool invocation, HTTP, filesystem probing) is
/// its own business; the engine only sees this seam.
#[async_trait]
pub trait MediaBackend: Send + Sync {
	/// Resolve a single external video id (or a `search:` query) into an entry.
	async fn resolve_video(&self, video_id: &str) -> Result<MediaEntry, BackendError>;

	/// List the video ids contained in an external collection, in collection order.
	async fn resolve_collection(&self, collection_id: &str) -> Result<Vec<String>, BackendError>;

	/// Describe a media file reachable from the server itself.
	async fn resolve_local(&self, path: &Path) -> Result<MediaEntry, BackendError>;
}
