use crate::connection::sender::MessageSender;
use crate::message::broadcast::BroadcastMessage;
use crate::playlist::media::MediaEntry;
use crate::playlist::media_id::MediaId;
use crate::playlist::{AddPosition, MoveDirection, NO_SELECTION, Playlist, PlaylistItem};
use crate::room::advance::AdvanceVotes;
use crate::room::client_id::ClientId;
use crate::room::clients::Clients;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info};

pub mod advance;
pub mod client_id;
pub mod client_id_sequence;
pub mod clients;

/// The one shared watch-party room: playlist, advance votes and live
/// connections behind a single lock.
///
/// Every operation is one whole-operation critical section, so concurrent
/// callers can never observe or produce a torn playlist, and broadcasts are
/// only ever emitted for state that has already been applied.
#[derive(Clone, Default)]
pub struct Room {
	inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
	playlist: Playlist,
	votes: AdvanceVotes,
	clients: Clients,
}

impl Room {
	pub fn with_playlist(playlist: Playlist) -> Self {
		Self {
			inner: Arc::new(Mutex::new(State {
				playlist,
				votes: AdvanceVotes::default(),
				clients: Clients::default(),
			})),
		}
	}

	/// Register a live connection and return its id.
	pub fn connect(&self, message_sender: MessageSender) -> ClientId {
		let mut state = self.inner.lock();
		let client_id = state.clients.add(message_sender);
		info!("Client {client_id} connected.");
		client_id
	}

	pub fn disconnect(&self, client_id: ClientId) {
		let mut state = self.inner.lock();
		if state.clients.remove(client_id) {
			info!("Client {client_id} disconnected.");
			// The departed client no longer counts towards consensus and must
			// not keep blocking an advance everyone else already agreed to.
			Self::advance_if_agreed(&mut state);
		}
	}

	pub fn record_advance_vote(&self, client_id: ClientId) {
		let mut state = self.inner.lock();
		state.votes.record(client_id);
		Self::advance_if_agreed(&mut state);
	}

	/// Insert resolved entries. For insertion behind the current item the
	/// batch is reversed first, so that repeated single-item splices leave the
	/// batch in its original relative order.
	pub fn add_entries(&self, entries: Vec<MediaEntry>, position: AddPosition) {
		if entries.is_empty() {
			return;
		}
		let mut state = self.inner.lock();
		match position {
			AddPosition::AppendToEnd => {
				for entry in entries {
					state.playlist.add(entry, position);
				}
			}
			AddPosition::InsertAfterCurrent => {
				for entry in entries.into_iter().rev() {
					state.playlist.add(entry, position);
				}
			}
		}
		Self::after_playlist_change(&mut state);
	}

	/// Manually step the selection. Returns whether it changed.
	pub fn advance(&self, delta: isize) -> bool {
		let mut state = self.inner.lock();
		Self::change_selection(&mut state, |index| index + delta)
	}

	pub fn jump_to(&self, id: MediaId) -> bool {
		let mut state = self.inner.lock();
		let Some(position) = state.playlist.position_of(id) else {
			return false;
		};
		Self::change_selection(&mut state, |_index| position)
	}

	pub fn move_items(&self, ids: &BTreeSet<MediaId>, direction: MoveDirection) -> bool {
		let mut state = self.inner.lock();
		if !state.playlist.move_items(ids, direction) {
			return false;
		}
		Self::after_playlist_change(&mut state);
		true
	}

	pub fn remove_items(&self, ids: &BTreeSet<MediaId>) -> bool {
		let mut state = self.inner.lock();
		let removing_current = match state.playlist.current_item() {
			Ok(Some(item)) => ids.contains(&item.id),
			Ok(None) => false,
			Err(corrupt_state) => {
				error!("{corrupt_state}");
				false
			}
		};
		if removing_current {
			Self::change_selection(&mut state, |_index| NO_SELECTION);
		}

		if !state.playlist.remove_items(ids) {
			return false;
		}
		Self::after_playlist_change(&mut state);
		true
	}

	pub fn current_item(&self) -> Option<PlaylistItem> {
		match self.inner.lock().playlist.current_item() {
			Ok(item) => item,
			Err(corrupt_state) => {
				error!("{corrupt_state}");
				None
			}
		}
	}

	pub fn items(&self) -> Vec<PlaylistItem> {
		self.inner.lock().playlist.items()
	}

	pub fn with_playlist_state<ReturnValue>(&self, reader: impl FnOnce(&Playlist) -> ReturnValue) -> ReturnValue {
		reader(&self.inner.lock().playlist)
	}

	/// The single choke point for selection changes: votes reset and the
	/// change is announced if, and only if, the selection actually moved.
	fn change_selection(state: &mut State, transform: impl FnOnce(isize) -> isize) -> bool {
		if !state.playlist.update_index(transform) {
			return false;
		}
		state.votes.clear();
		state.clients.broadcast(BroadcastMessage::MediaChanged);
		true
	}

	fn after_playlist_change(state: &mut State) {
		state.clients.broadcast(BroadcastMessage::PlaylistChanged);
		Self::advance_if_agreed(state);
	}

	fn advance_if_agreed(state: &mut State) {
		if Self::should_auto_advance(state) {
			Self::change_selection(state, |index| index + 1);
		}
	}

	fn should_auto_advance(state: &State) -> bool {
		// Auto-start: content is queued but nothing is selected yet.
		if !state.playlist.has_selection() && !state.playlist.is_empty() {
			return true;
		}
		state.votes.everyone_voted(&state.clients.ids())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::message::broadcast::BroadcastMessage::*;
	use crate::playlist::media::{MediaDisplay, MediaSource, UNKNOWN_LENGTH_IN_SECONDS};
	use crate::utils::fake_message_sender::FakeMessageSender;

	fn entry(title: &str) -> MediaEntry {
		MediaEntry {
			display: MediaDisplay {
				title: Some(title.to_string()),
				author: None,
				added_on: None,
			},
			length_in_seconds: UNKNOWN_LENGTH_IN_SECONDS,
			link: format!("https://youtu.be/{title}"),
			source: MediaSource::External {
				video_id: title.to_string(),
				aspect_ratio: "16/9".to_string(),
			},
		}
	}

	fn connected_client(room: &Room) -> (ClientId, Arc<FakeMessageSender>) {
		let fake_sender = Arc::new(FakeMessageSender::default());
		let client_id = room.connect(fake_sender.clone());
		(client_id, fake_sender)
	}

	fn current_title(room: &Room) -> Option<String> {
		room.current_item().and_then(|item| item.entry.display.title)
	}

	#[test]
	fn adding_to_an_idle_room_should_auto_start_the_first_item() {
		let room = Room::default();
		let (_client, fake_sender) = connected_client(&room);

		room.add_entries(vec![entry("a"), entry("b")], AddPosition::AppendToEnd);

		assert_eq!(Some("a".to_string()), current_title(&room));
		assert_eq!(vec![PlaylistChanged, MediaChanged], fake_sender.received());
	}

	#[test]
	fn inserting_after_current_should_keep_the_batch_order() {
		let room = Room::default();
		room.add_entries(vec![entry("x"), entry("a")], AddPosition::AppendToEnd);
		assert_eq!(Some("x".to_string()), current_title(&room));

		room.add_entries(vec![entry("v1"), entry("v2"), entry("v3")], AddPosition::InsertAfterCurrent);

		let titles: Vec<_> = room
			.items()
			.into_iter()
			.map(|item| item.entry.display.title.unwrap())
			.collect();
		assert_eq!(vec!["x", "v1", "v2", "v3", "a"], titles);
	}

	#[test]
	fn every_live_client_must_vote_before_the_room_advances() {
		let room = Room::default();
		let (alice, _) = connected_client(&room);
		let (bob, _) = connected_client(&room);
		let (carol, _) = connected_client(&room);
		room.add_entries(vec![entry("a"), entry("b")], AddPosition::AppendToEnd);
		assert_eq!(Some("a".to_string()), current_title(&room));

		room.record_advance_vote(alice);
		room.record_advance_vote(bob);
		assert_eq!(Some("a".to_string()), current_title(&room));

		room.record_advance_vote(carol);
		assert_eq!(Some("b".to_string()), current_title(&room));
	}

	#[test]
	fn a_client_joining_mid_item_should_be_included_in_the_consensus() {
		let room = Room::default();
		let (alice, _) = connected_client(&room);
		let (bob, _) = connected_client(&room);
		room.add_entries(vec![entry("a"), entry("b")], AddPosition::AppendToEnd);

		room.record_advance_vote(alice);
		let (_dave, _) = connected_client(&room);
		room.record_advance_vote(bob);

		// Dave hasn't voted, so the room must still be on the first item.
		assert_eq!(Some("a".to_string()), current_title(&room));
	}

	#[test]
	fn a_departing_non_voter_should_not_block_the_advance() {
		let room = Room::default();
		let (alice, _) = connected_client(&room);
		let (bob, _) = connected_client(&room);
		let (carol, _) = connected_client(&room);
		room.add_entries(vec![entry("a"), entry("b")], AddPosition::AppendToEnd);

		room.record_advance_vote(alice);
		room.record_advance_vote(bob);
		assert_eq!(Some("a".to_string()), current_title(&room));

		room.disconnect(carol);
		assert_eq!(Some("b".to_string()), current_title(&room));
	}

	#[test]
	fn a_manual_advance_should_reset_the_votes() {
		let room = Room::default();
		let (alice, _) = connected_client(&room);
		let (bob, _) = connected_client(&room);
		room.add_entries(vec![entry("a"), entry("b"), entry("c")], AddPosition::AppendToEnd);

		room.record_advance_vote(alice);
		assert!(room.advance(1));
		assert_eq!(Some("b".to_string()), current_title(&room));

		// Alice's stale vote must not count towards the new item.
		room.record_advance_vote(bob);
		assert_eq!(Some("b".to_string()), current_title(&room));
		room.record_advance_vote(alice);
		assert_eq!(Some("c".to_string()), current_title(&room));
	}

	#[test]
	fn an_empty_room_should_not_auto_advance_past_the_current_item() {
		let room = Room::default();
		room.add_entries(vec![entry("a"), entry("b")], AddPosition::AppendToEnd);
		// Auto-start still selects the first item, but with nobody connected
		// there is no consensus to move past it.
		assert_eq!(Some("a".to_string()), current_title(&room));
		assert_eq!(Some("a".to_string()), current_title(&room));
	}

	#[test]
	fn advancing_past_the_end_should_deselect() {
		let room = Room::default();
		room.add_entries(vec![entry("a")], AddPosition::AppendToEnd);
		assert!(room.advance(1));
		assert_eq!(None, room.current_item());
	}

	#[test]
	fn advance_should_report_when_nothing_changed() {
		let room = Room::default();
		assert!(!room.advance(1));
		assert!(!room.advance(-1));
	}

	#[test]
	fn jump_to_should_select_the_item_and_announce_it() {
		let room = Room::default();
		room.add_entries(vec![entry("a"), entry("b")], AddPosition::AppendToEnd);
		let (_client, fake_sender) = connected_client(&room);
		let second_id = room.items()[1].id;

		assert!(room.jump_to(second_id));

		assert_eq!(Some("b".to_string()), current_title(&room));
		assert_eq!(vec![MediaChanged], fake_sender.received());
	}

	#[test]
	fn jump_to_an_unknown_id_should_do_nothing() {
		let room = Room::default();
		room.add_entries(vec![entry("a")], AddPosition::AppendToEnd);
		assert!(!room.jump_to(MediaId::from(999)));
	}

	#[test]
	fn moving_items_should_announce_a_playlist_change_only() {
		let room = Room::default();
		room.add_entries(vec![entry("a"), entry("b")], AddPosition::AppendToEnd);
		let (_client, fake_sender) = connected_client(&room);
		let first_id = room.items()[0].id;

		assert!(room.move_items(&[first_id].into_iter().collect(), MoveDirection::Forward));

		assert_eq!(vec![PlaylistChanged], fake_sender.received());
		assert_eq!(Some("a".to_string()), current_title(&room));
	}

	#[test]
	fn removing_the_current_item_should_announce_the_selection_change_first() {
		let room = Room::default();
		room.add_entries(vec![entry("a")], AddPosition::AppendToEnd);
		let (_client, fake_sender) = connected_client(&room);
		let current_id = room.current_item().unwrap().id;

		assert!(room.remove_items(&[current_id].into_iter().collect()));

		assert_eq!(None, room.current_item());
		assert!(room.items().is_empty());
		assert_eq!(vec![MediaChanged, PlaylistChanged], fake_sender.received());
	}

	#[test]
	fn removing_another_item_should_keep_the_selection() {
		let room = Room::default();
		room.add_entries(vec![entry("a"), entry("b")], AddPosition::AppendToEnd);
		let other_id = room.items()[1].id;

		assert!(room.remove_items(&[other_id].into_iter().collect()));

		assert_eq!(Some("a".to_string()), current_title(&room));
	}

	#[test]
	fn removing_nothing_should_report_no_change() {
		let room = Room::default();
		room.add_entries(vec![entry("a")], AddPosition::AppendToEnd);
		assert!(!room.remove_items(&[MediaId::from(999)].into_iter().collect()));
	}
}
