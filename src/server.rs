use crate::context::{AddMediaError, ApplicationContext};
use crate::lifecycle::run_client;
use crate::playlist::media_id::MediaId;
use crate::playlist::{MoveDirection, PlaylistItem};
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::future::Future;
use tokio::net::TcpListener;

pub async fn run_server(
	context: ApplicationContext,
	shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
	let listener = TcpListener::bind(context.configuration.address).await?;
	axum::serve(listener, create_router(context))
		.with_graceful_shutdown(shutdown)
		.await
}

pub fn create_router(context: ApplicationContext) -> Router {
	Router::new()
		.route("/api/playlist", get(list_items).delete(remove_items))
		.route("/api/playlist/current", get(current_item))
		.route("/api/playlist/add", post(add_media))
		.route("/api/playlist/next", patch(advance_to_next))
		.route("/api/playlist/prev", patch(advance_to_previous))
		.route("/api/playlist/jump/{id}", patch(jump_to_item))
		.route("/api/playlist/move/forward", patch(move_items_forward))
		.route("/api/playlist/move/backward", patch(move_items_backward))
		.route("/watch", get(watch))
		.with_state(context)
}

#[derive(Debug, Deserialize)]
struct AddRequest {
	url: String,
	position: String,
}

#[derive(Debug, Deserialize)]
struct ItemSelection {
	ids: Vec<u64>,
}

impl ItemSelection {
	fn media_ids(&self) -> BTreeSet<MediaId> {
		self.ids.iter().copied().map(MediaId::from).collect()
	}
}

async fn add_media(State(context): State<ApplicationContext>, Json(request): Json<AddRequest>) -> Response {
	match context.add_media(&request.url, &request.position).await {
		Ok(()) => StatusCode::OK.into_response(),
		Err(AddMediaError::InvalidPosition(invalid_position)) => {
			(StatusCode::BAD_REQUEST, invalid_position.to_string()).into_response()
		}
		Err(AddMediaError::Resolver(resolver_error)) => (
			StatusCode::UNPROCESSABLE_ENTITY,
			format!("Unable to add '{}' to the playlist: {resolver_error}", request.url),
		)
			.into_response(),
	}
}

async fn advance_to_next(State(context): State<ApplicationContext>) -> StatusCode {
	changed_status(context.room.advance(1))
}

async fn advance_to_previous(State(context): State<ApplicationContext>) -> StatusCode {
	changed_status(context.room.advance(-1))
}

async fn jump_to_item(State(context): State<ApplicationContext>, Path(id): Path<u64>) -> StatusCode {
	changed_status(context.room.jump_to(MediaId::from(id)))
}

async fn move_items_forward(
	State(context): State<ApplicationContext>,
	Json(selection): Json<ItemSelection>,
) -> StatusCode {
	changed_status(context.room.move_items(&selection.media_ids(), MoveDirection::Forward))
}

async fn move_items_backward(
	State(context): State<ApplicationContext>,
	Json(selection): Json<ItemSelection>,
) -> StatusCode {
	changed_status(context.room.move_items(&selection.media_ids(), MoveDirection::Backward))
}

async fn remove_items(State(context): State<ApplicationContext>, Json(selection): Json<ItemSelection>) -> StatusCode {
	changed_status(context.room.remove_items(&selection.media_ids()))
}

async fn current_item(State(context): State<ApplicationContext>) -> Json<Option<PlaylistItem>> {
	Json(context.room.current_item())
}

async fn list_items(State(context): State<ApplicationContext>) -> Json<Vec<PlaylistItem>> {
	Json(context.room.items())
}

async fn watch(State(context): State<ApplicationContext>, websocket_upgrade: WebSocketUpgrade) -> Response {
	websocket_upgrade.on_upgrade(move |websocket| run_client(context.room.clone(), websocket))
}

fn changed_status(changed: bool) -> StatusCode {
	if changed { StatusCode::OK } else { StatusCode::NOT_MODIFIED }
}
