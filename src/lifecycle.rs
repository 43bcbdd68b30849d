use crate::connection::sender::{ChannelMessageSender, MessageSender};
use crate::message::WebSocketMessage;
use crate::message::client_request::ClientRequest;
use crate::room::Room;
use axum::extract::ws::WebSocket;
use futures_util::{SinkExt, StreamExt};
use tracing::debug;

/// Drive one websocket connection: register it with the room, forward
/// broadcasts out, feed votes in, and unregister once either direction ends.
pub async fn run_client(room: Room, websocket: WebSocket) {
	let (mut sink, mut stream) = websocket.split();
	let (message_sender, mut broadcast_receiver) = ChannelMessageSender::new();
	let client_id = room.connect(MessageSender::from(message_sender));

	let forward_broadcasts = async move {
		while let Some(broadcast) = broadcast_receiver.recv().await {
			if sink.send(WebSocketMessage::from(&broadcast)).await.is_err() {
				break;
			}
		}
	};

	let receive_requests = async {
		while let Some(message) = stream.next().await {
			let Ok(websocket_message) = message else {
				break;
			};
			if matches!(websocket_message, WebSocketMessage::Close(_)) {
				break;
			}
			// Ping/pong bookkeeping happens below us in axum.
			if !matches!(websocket_message, WebSocketMessage::Text(_)) {
				continue;
			}

			match ClientRequest::try_from(&websocket_message) {
				Ok(ClientRequest::AdvanceVote) => room.record_advance_vote(client_id),
				Err(message_error) => {
					debug!("Ignoring unusable message from {client_id}: {message_error}");
				}
			}
		}
	};

	tokio::select! {
		() = forward_broadcasts => {}
		() = receive_requests => {}
	}

	room.disconnect(client_id);
}
