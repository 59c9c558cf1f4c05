use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::models::{NewVenue, VenueWithRooms};
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::{JsonBody, ResourceId};
use crate::utils::response::{accepted, created, empty_success, success};

/// Every venue with its rooms attached.
pub async fn list_venues(State(state): State<AppState>) -> AppResult<Response> {
    let store = state.store();
    let venues = store.list_venues().await?;

    let mut data = Vec::with_capacity(venues.len());
    for venue in venues {
        let rooms = store.list_rooms_by_venue(venue.id.as_str()).await?;
        data.push(VenueWithRooms { venue, rooms });
    }

    Ok(success(data, "Venues retrieved successfully"))
}

pub async fn show_venue(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Response> {
    let venue = state.store().find_venue(&id).await?;
    Ok(success(venue, "Venue retrieved successfully"))
}

pub async fn create_venue(
    State(state): State<AppState>,
    JsonBody(venue): JsonBody<NewVenue>,
) -> AppResult<Response> {
    let venue = state.store().insert_venue(venue).await?;
    tracing::info!(venue_id = %venue.id, "Venue created");
    Ok(created(venue, "Venue has been created successfully"))
}

pub async fn update_venue(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    JsonBody(venue): JsonBody<NewVenue>,
) -> AppResult<Response> {
    let venue = state.store().replace_venue(&id, venue).await?;
    Ok(accepted(venue, "Venue has been updated successfully"))
}

pub async fn delete_venue(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Response> {
    state.store().delete_venue(&id).await?;
    tracing::info!(venue_id = %id, "Venue deleted");
    Ok(empty_success(
        StatusCode::ACCEPTED,
        "Venue has been deleted successfully",
    ))
}

pub async fn list_venue_rooms(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Response> {
    let rooms = state.store().list_rooms_by_venue(id.as_str()).await?;
    Ok(success(rooms, "Rooms retrieved successfully"))
}
