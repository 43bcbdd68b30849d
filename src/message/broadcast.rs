use crate::message::{
	MessageError, WebSocketMessage, deserialize_message_from_str, serialize_message_to_websocket_message,
};
use serde::{Deserialize, Serialize};

/// Push notifications fanned out to every live connection after a state
/// change has been applied. Delivery is best-effort; nobody waits for it.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum BroadcastMessage {
	/// Queue contents or order changed; the selected item did not.
	PlaylistChanged,
	/// The selected item changed.
	MediaChanged,
}

impl From<&BroadcastMessage> for WebSocketMessage {
	fn from(message: &BroadcastMessage) -> Self {
		serialize_message_to_websocket_message(message)
	}
}

impl TryFrom<&WebSocketMessage> for BroadcastMessage {
	type Error = MessageError;

	fn try_from(websocket_message: &WebSocketMessage) -> Result<Self, Self::Error> {
		match websocket_message {
			WebSocketMessage::Text(json) => deserialize_message_from_str(json.as_str()),
			_ => Err(MessageError::WrongMessageType(websocket_message.clone())),
		}
	}
}
