use crate::connection::sender::MessageSender;
use crate::message::broadcast::BroadcastMessage;
use crate::room::client_id::ClientId;
use crate::room::client_id_sequence::ClientIdSequence;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// The set of currently live connections. Membership here is what "live"
/// means everywhere else; a removed client is gone for voting purposes too.
#[derive(Default)]
pub struct Clients {
	client_id_sequence: ClientIdSequence,
	clients_by_id: BTreeMap<ClientId, MessageSender>,
}

impl Clients {
	/// Register a connection, passing in a sender for pushing messages to it.
	pub fn add(&mut self, message_sender: MessageSender) -> ClientId {
		let client_id = self.client_id_sequence.next();
		if self.clients_by_id.insert(client_id, message_sender).is_some() {
			unreachable!("There must never be two clients with the same id!");
		}
		client_id
	}

	pub fn remove(&mut self, client_id: ClientId) -> bool {
		self.clients_by_id.remove(&client_id).is_some()
	}

	pub fn ids(&self) -> BTreeSet<ClientId> {
		self.clients_by_id.keys().copied().collect()
	}

	pub fn is_empty(&self) -> bool {
		self.clients_by_id.is_empty()
	}

	/// Fire-and-forget fan-out. A connection that can't take the message any
	/// more is skipped; it gets cleaned up by its own lifecycle.
	pub fn broadcast(&self, message: BroadcastMessage) {
		for (client_id, message_sender) in &self.clients_by_id {
			if !message_sender.send_broadcast_message(message) {
				debug!("Dropped broadcast to {client_id}, its connection is gone.");
			}
		}
	}
}
