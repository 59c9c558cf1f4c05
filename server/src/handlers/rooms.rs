use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::models::NewRoom;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::{JsonBody, ResourceId};
use crate::utils::response::{accepted, created, empty_success, success};

pub async fn list_rooms(State(state): State<AppState>) -> AppResult<Response> {
    let rooms = state.store().list_rooms().await?;
    Ok(success(rooms, "Rooms retrieved successfully"))
}

pub async fn show_room(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Response> {
    let room = state.store().find_room(&id).await?;
    Ok(success(room, "Room retrieved successfully"))
}

pub async fn create_room(
    State(state): State<AppState>,
    JsonBody(room): JsonBody<NewRoom>,
) -> AppResult<Response> {
    let room = state.store().insert_room(room).await?;
    tracing::info!(room_id = %room.id, venue_id = %room.venue_id, "Room created");
    Ok(created(room, "Room has been created successfully"))
}

pub async fn update_room(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    JsonBody(room): JsonBody<NewRoom>,
) -> AppResult<Response> {
    let room = state.store().replace_room(&id, room).await?;
    Ok(accepted(room, "Room has been updated successfully"))
}

pub async fn delete_room(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Response> {
    state.store().delete_room(&id).await?;
    tracing::info!(room_id = %id, "Room deleted");
    Ok(empty_success(
        StatusCode::ACCEPTED,
        "Room has been deleted successfully",
    ))
}
