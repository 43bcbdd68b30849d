use crate::playlist::media_id::MediaId;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlaylistError {
	/// The playlist order references an id that has no stored entry. This is
	/// unreachable through the playlist's own operations and indicates either
	/// a bug in them or a tampered snapshot. Callers must log it loudly and
	/// must never silently swallow it.
	#[error("Playlist order references {id} at index {index} but no such entry is stored.")]
	CorruptState { index: usize, id: MediaId },
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("'{0}' is not a valid playlist add position.")]
pub struct InvalidAddPosition(pub String);
