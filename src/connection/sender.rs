use crate::message::broadcast::BroadcastMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

pub type MessageSender = Arc<dyn MessageSenderTrait + Send + Sync>;

/// Outbound half of a client connection. Sending is a fire-and-forget
/// enqueue; `false` means the connection is gone and the message was dropped.
pub trait MessageSenderTrait {
	fn send_broadcast_message(&self, message: BroadcastMessage) -> bool;
}

/// Production sender backed by an unbounded channel that the connection's
/// socket task drains.
pub struct ChannelMessageSender {
	sender: mpsc::UnboundedSender<BroadcastMessage>,
}

impl ChannelMessageSender {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<BroadcastMessage>) {
		let (sender, receiver) = mpsc::unbounded_channel();
		(Self { sender }, receiver)
	}
}

impl MessageSenderTrait for ChannelMessageSender {
	fn send_broadcast_message(&self, message: BroadcastMessage) -> bool {
		self.sender.send(message).is_ok()
	}
}

impl From<ChannelMessageSender> for MessageSender {
	fn from(channel_message_sender: ChannelMessageSender) -> Self {
		Arc::new(channel_message_sender)
	}
}
