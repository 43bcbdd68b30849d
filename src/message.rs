use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod broadcast;
pub mod client_request;

pub use axum::extract::ws::Message as WebSocketMessage;

#[derive(Error, Debug, Clone)]
pub enum MessageError {
	#[error("Failed to deserialize message with error: {error}, message was: {json}")]
	DeserializationFailed { error: String, json: String },
	#[error("Message has the wrong websocket message type: {0:?}")]
	WrongMessageType(WebSocketMessage),
}

pub fn serialize_message_to_websocket_message(message: &impl Serialize) -> WebSocketMessage {
	let json = serde_json::to_string(message).expect("Failed to serialize message to JSON.");
	WebSocketMessage::Text(json.into())
}

pub fn deserialize_message_from_str<MessageType: DeserializeOwned>(json: &str) -> Result<MessageType, MessageError> {
	serde_json::from_str(json).map_err(|error| MessageError::DeserializationFailed {
		error: error.to_string(),
		json: json.to_string(),
	})
}
