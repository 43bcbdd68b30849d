use crate::playlist::error::{InvalidAddPosition, PlaylistError};
use crate::playlist::media::MediaEntry;
use crate::playlist::media_id::{MediaId, MediaIdSequence};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub mod error;
pub mod media;
pub mod media_id;

/// Sentinel for "nothing is selected". Kept as a signed index so that index
/// transforms like "advance by one" naturally step from "nothing" to the
/// first item.
pub const NO_SELECTION: isize = -1;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddPosition {
	AppendToEnd,
	InsertAfterCurrent,
}

impl AddPosition {
	const ADD_TO_END: &'static str = "add-to-end";
	const QUEUE_NEXT: &'static str = "queue-next";
}

impl TryFrom<&str> for AddPosition {
	type Error = InvalidAddPosition;

	fn try_from(text: &str) -> Result<Self, Self::Error> {
		match text {
			Self::ADD_TO_END => Ok(AddPosition::AppendToEnd),
			Self::QUEUE_NEXT => Ok(AddPosition::InsertAfterCurrent),
			unknown => Err(InvalidAddPosition(unknown.to_string())),
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MoveDirection {
	/// Towards the end of the playlist.
	Forward,
	/// Towards the front of the playlist.
	Backward,
}

/// A media entry together with its playlist id, as handed out to queries.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PlaylistItem {
	pub id: MediaId,
	#[serde(flatten)]
	pub entry: MediaEntry,
}

/// The ordered queue of media shared by all viewers.
///
/// Invariants:
/// - every id in `order` has an entry in `entries`
/// - `order` contains no duplicate ids
/// - `current_index` is `NO_SELECTION` or a valid index into `order`
#[derive(Debug)]
pub struct Playlist {
	entries: BTreeMap<MediaId, MediaEntry>,
	order: Vec<MediaId>,
	current_index: isize,
	id_sequence: MediaIdSequence,
}

impl Default for Playlist {
	fn default() -> Self {
		Self {
			entries: BTreeMap::new(),
			order: Vec::new(),
			current_index: NO_SELECTION,
			id_sequence: MediaIdSequence::default(),
		}
	}
}

impl Playlist {
	/// Rebuild a playlist from restored parts. The id sequence is seeded with
	/// the maximum of the stored seed and the largest restored id, so manually
	/// edited snapshots can never cause id reuse.
	pub fn restore(
		entries: BTreeMap<MediaId, MediaEntry>,
		order: Vec<MediaId>,
		current_index: isize,
		id_sequence_seed: u64,
	) -> Self {
		let mut id_sequence = MediaIdSequence::seeded(id_sequence_seed);
		for id in entries.keys() {
			id_sequence.ensure_covers(*id);
		}
		Self {
			entries,
			order,
			current_index,
			id_sequence,
		}
	}

	/// Add an entry to the playlist, either at the end or directly behind the
	/// currently selected item. Returns the freshly allocated id.
	pub fn add(&mut self, entry: MediaEntry, position: AddPosition) -> MediaId {
		let id = self.id_sequence.next();
		self.entries.insert(id, entry);
		match position {
			AddPosition::AppendToEnd => self.order.push(id),
			AddPosition::InsertAfterCurrent => {
				let index = usize::try_from(self.current_index + 1).unwrap_or(0);
				self.order.insert(index.min(self.order.len()), id);
			}
		}
		id
	}

	/// The currently selected item, `None` if nothing is selected, or
	/// [`PlaylistError::CorruptState`] if the selected id has no entry.
	pub fn current_item(&self) -> Result<Option<PlaylistItem>, PlaylistError> {
		let Some(id) = self.id_at(self.current_index) else {
			return Ok(None);
		};
		match self.entries.get(&id) {
			Some(entry) => Ok(Some(PlaylistItem { id, entry: entry.clone() })),
			None => Err(PlaylistError::CorruptState {
				index: usize::try_from(self.current_index).unwrap_or_default(),
				id,
			}),
		}
	}

	/// Apply `transform` to the current index. A result outside of
	/// `[0, len)` deselects instead of clamping. Returns whether the
	/// selection actually changed.
	///
	/// This is the only way the selection moves; manual next/prev, jumps and
	/// auto-advance all go through here.
	pub fn update_index(&mut self, transform: impl FnOnce(isize) -> isize) -> bool {
		let previous = self.current_index;
		let requested = transform(previous);
		let new_index = if self.id_at(requested).is_some() {
			requested
		} else {
			NO_SELECTION
		};
		self.current_index = new_index;
		previous != new_index
	}

	/// Select the item with the given id. Returns whether the selection
	/// changed; an unknown id leaves the playlist untouched.
	pub fn jump_to(&mut self, id: MediaId) -> bool {
		match self.position_of(id) {
			Some(position) => self.update_index(|_| position),
			None => false,
		}
	}

	/// Swap every selected item with its neighbour in the move direction.
	///
	/// The scan runs from the trailing end for forward moves and from the
	/// leading end for backward moves; anything else would let a contiguous
	/// selected block collapse into itself mid-scan. A swap is skipped when
	/// the neighbour slot does not exist or the neighbour is itself selected,
	/// so a selected block moves as a unit. Returns whether anything moved.
	pub fn move_items(&mut self, ids: &BTreeSet<MediaId>, direction: MoveDirection) -> bool {
		let current_id = self.id_at(self.current_index);
		let mut changed = false;

		for scan in 0..self.order.len() {
			let index = match direction {
				MoveDirection::Forward => self.order.len() - 1 - scan,
				MoveDirection::Backward => scan,
			};
			if !ids.contains(&self.order[index]) {
				continue;
			}

			let neighbour_index = match direction {
				MoveDirection::Forward => index + 1,
				MoveDirection::Backward => {
					let Some(below) = index.checked_sub(1) else {
						continue;
					};
					below
				}
			};
			if neighbour_index >= self.order.len() || ids.contains(&self.order[neighbour_index]) {
				continue;
			}

			self.order.swap(index, neighbour_index);
			changed = true;
		}

		if changed {
			// The selection follows the item, not the slot it used to occupy.
			if let Some(id) = current_id {
				self.current_index = self.position_of(id).unwrap_or(NO_SELECTION);
			}
		}

		changed
	}

	/// Remove all items with the given ids. The selection follows the
	/// previously current item into the new order, or is cleared if that item
	/// was removed. Entries no longer referenced by the order are dropped.
	/// Returns whether anything was removed.
	pub fn remove_items(&mut self, ids: &BTreeSet<MediaId>) -> bool {
		let current_id = self.id_at(self.current_index);
		let length_before = self.order.len();
		self.order.retain(|id| !ids.contains(id));
		let changed = self.order.len() != length_before;

		let remaining: BTreeSet<MediaId> = self.order.iter().copied().collect();
		self.entries.retain(|id, _entry| remaining.contains(id));

		self.current_index = current_id
			.filter(|id| !ids.contains(id))
			.and_then(|id| self.position_of(id))
			.unwrap_or(NO_SELECTION);

		changed
	}

	/// All items in playlist order. Ids without a stored entry are skipped.
	pub fn items(&self) -> Vec<PlaylistItem> {
		self.order
			.iter()
			.filter_map(|id| {
				self.entries.get(id).map(|entry| PlaylistItem {
					id: *id,
					entry: entry.clone(),
				})
			})
			.collect()
	}

	pub fn position_of(&self, id: MediaId) -> Option<isize> {
		self.order
			.iter()
			.position(|candidate| *candidate == id)
			.and_then(|index| isize::try_from(index).ok())
	}

	pub fn current_index(&self) -> isize {
		self.current_index
	}

	pub fn has_selection(&self) -> bool {
		self.current_index != NO_SELECTION
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub(crate) fn entries(&self) -> &BTreeMap<MediaId, MediaEntry> {
		&self.entries
	}

	pub(crate) fn order(&self) -> &[MediaId] {
		&self.order
	}

	pub(crate) fn last_allocated_id(&self) -> u64 {
		self.id_sequence.last_id()
	}

	fn id_at(&self, index: isize) -> Option<MediaId> {
		let index = usize::try_from(index).ok()?;
		self.order.get(index).copied()
	}
}
