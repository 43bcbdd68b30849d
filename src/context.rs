use crate::configuration::Configuration;
use crate::playlist::AddPosition;
use crate::playlist::error::InvalidAddPosition;
use crate::resolver::MediaResolver;
use crate::resolver::backend::MediaBackend;
use crate::resolver::error::ResolverError;
use crate::room::Room;
use crate::snapshot::{PersistenceSink, PlaylistSnapshot, Snapshot, SnapshotError};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Everything the request handlers share: the configuration, the room and
/// the media resolver.
#[derive(Clone)]
pub struct ApplicationContext {
	pub configuration: Configuration,
	pub room: Room,
	pub resolver: Arc<MediaResolver>,
}

#[derive(Error, Debug)]
pub enum AddMediaError {
	#[error(transparent)]
	Resolver(#[from] ResolverError),
	#[error(transparent)]
	InvalidPosition(#[from] InvalidAddPosition),
}

impl ApplicationContext {
	/// Build the context, restoring room and resolver state from the sink.
	/// A missing snapshot degrades to an empty playlist; an unreadable or
	/// undecodable one is a startup failure.
	pub fn restore(
		configuration: Configuration,
		backend: Arc<dyn MediaBackend>,
		sink: &dyn PersistenceSink,
	) -> Result<Self, SnapshotError> {
		let snapshot = match sink.load()? {
			Some(bytes) => Snapshot::decode(&bytes)?,
			None => {
				warn!("No previous snapshot found, starting with an empty playlist.");
				Snapshot::default()
			}
		};

		let room = Room::with_playlist(snapshot.playlist.into_playlist());
		let resolver = Arc::new(MediaResolver::restore(
			backend,
			snapshot.resolved_media,
			snapshot.resolved_collections,
		));

		Ok(Self {
			configuration,
			room,
			resolver,
		})
	}

	/// Resolve `reference` and insert the resulting entries at `position`.
	/// The position is validated before anything is resolved or mutated, so a
	/// bad request leaves both the cache and the playlist untouched.
	pub async fn add_media(&self, reference: &str, position: &str) -> Result<(), AddMediaError> {
		let position = AddPosition::try_from(position)?;
		let entries = self.resolver.resolve(reference).await?;
		self.room.add_entries(entries, position);
		Ok(())
	}

	pub fn snapshot(&self) -> Snapshot {
		Snapshot {
			playlist: self.room.with_playlist_state(PlaylistSnapshot::of),
			resolved_media: self.resolver.resolved_media(),
			resolved_collections: self.resolver.resolved_collections(),
		}
	}

	pub fn persist(&self, sink: &dyn PersistenceSink) -> Result<(), SnapshotError> {
		sink.save(&self.snapshot().encode()?)
	}
}
