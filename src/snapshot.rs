use crate::playlist::Playlist;
use crate::playlist::media::MediaEntry;
use crate::playlist::media_id::MediaId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that survives a restart: the playlist and the resolver's
/// resolved entries. Live connections, votes and in-flight resolutions are
/// deliberately absent.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
	pub playlist: PlaylistSnapshot,
	#[serde(default)]
	pub resolved_media: Vec<(String, MediaEntry)>,
	#[serde(default)]
	pub resolved_collections: Vec<(String, Vec<String>)>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistSnapshot {
	pub entries: BTreeMap<MediaId, MediaEntry>,
	pub order: Vec<MediaId>,
	pub current_index: isize,
	pub last_allocated_id: u64,
}

impl Default for PlaylistSnapshot {
	fn default() -> Self {
		Self {
			entries: BTreeMap::new(),
			order: Vec::new(),
			current_index: crate::playlist::NO_SELECTION,
			last_allocated_id: 0,
		}
	}
}

impl PlaylistSnapshot {
	pub fn of(playlist: &Playlist) -> Self {
		Self {
			entries: playlist.entries().clone(),
			order: playlist.order().to_vec(),
			current_index: playlist.current_index(),
			last_allocated_id: playlist.last_allocated_id(),
		}
	}

	pub fn into_playlist(self) -> Playlist {
		Playlist::restore(self.entries, self.order, self.current_index, self.last_allocated_id)
	}
}

impl Snapshot {
	pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
		Ok(serde_json::to_vec(self)?)
	}

	pub fn decode(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
		Ok(serde_json::from_slice(bytes)?)
	}
}

#[derive(Error, Debug)]
pub enum SnapshotError {
	#[error("Failed to encode or decode snapshot: {0}")]
	Codec(#[from] serde_json::Error),
	#[error("Failed to access the persisted snapshot: {0}")]
	Io(#[from] std::io::Error),
}

/// Where snapshot bytes go between process lifetimes. The codec neither knows
/// nor cares; file location and timing are the caller's concern.
pub trait PersistenceSink {
	fn save(&self, bytes: &[u8]) -> Result<(), SnapshotError>;
	/// `None` means nothing has been persisted yet.
	fn load(&self) -> Result<Option<Vec<u8>>, SnapshotError>;
}

pub struct FilePersistence {
	path: PathBuf,
}

impl FilePersistence {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl PersistenceSink for FilePersistence {
	fn save(&self, bytes: &[u8]) -> Result<(), SnapshotError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		Ok(fs::write(&self.path, bytes)?)
	}

	fn load(&self) -> Result<Option<Vec<u8>>, SnapshotError> {
		match fs::read(&self.path) {
			Ok(bytes) => Ok(Some(bytes)),
			Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
			Err(error) => Err(error.into()),
		}
	}
}
