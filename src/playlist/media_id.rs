use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MediaId {
	id: u64,
}

impl From<u64> for MediaId {
	fn from(id: u64) -> Self {
		MediaId { id }
	}
}

impl From<MediaId> for u64 {
	fn from(media_id: MediaId) -> Self {
		media_id.id
	}
}

impl Display for MediaId {
	fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
		write!(formatter, "MediaId({})", self.id)
	}
}

/// Allocates playlist ids. Ids increase monotonically for the lifetime of the
/// playlist and are never handed out twice, even after the item they belonged
/// to has been removed.
#[derive(Debug, Default)]
pub struct MediaIdSequence {
	last_id: u64,
}

impl MediaIdSequence {
	/// A sequence that will never allocate `last_id` or anything below it again.
	pub fn seeded(last_id: u64) -> Self {
		Self { last_id }
	}

	pub fn next(&mut self) -> MediaId {
		self.last_id += 1;
		MediaId::from(self.last_id)
	}

	pub fn last_id(&self) -> u64 {
		self.last_id
	}

	/// Bump the sequence so that `id` can never be allocated again.
	pub fn ensure_covers(&mut self, id: MediaId) {
		self.last_id = self.last_id.max(id.into());
	}
}
