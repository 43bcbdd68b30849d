use crate::connection::sender::{MessageSender, MessageSenderTrait};
use crate::message::broadcast::BroadcastMessage;
use parking_lot::Mutex;
use std::sync::Arc;

/// Records broadcasts instead of delivering them anywhere.
#[derive(Debug, Default)]
pub struct FakeMessageSender {
	messages: Mutex<Vec<BroadcastMessage>>,
	broken: bool,
}

impl FakeMessageSender {
	/// A sender that behaves like a connection that has already gone away.
	pub fn broken() -> Self {
		Self {
			messages: Mutex::default(),
			broken: true,
		}
	}

	pub fn received(&self) -> Vec<BroadcastMessage> {
		self.messages.lock().clone()
	}
}

impl MessageSenderTrait for FakeMessageSender {
	fn send_broadcast_message(&self, message: BroadcastMessage) -> bool {
		if self.broken {
			return false;
		}
		self.messages.lock().push(message);
		true
	}
}

impl From<FakeMessageSender> for MessageSender {
	fn from(fake_message_sender: FakeMessageSender) -> Self {
		Arc::new(fake_message_sender)
	}
}
