use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use chrono::Utc;
use serde::Deserialize;

use crate::models::{Event, EventPayload, EventResponse};
use crate::services::mapper;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::extract::{JsonBody, QueryParams, ResourceId};
use crate::utils::response::{accepted, created, empty_success, success};

/// Optional client bounds; missing ones default to the current period.
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// `/search-events` query string. `room_ids[]` repeats, so it is collected
/// from raw pairs rather than a struct.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub room_ids: Vec<String>,
    pub owner: String,
    pub guest_id: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl SearchParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "room_ids[]" | "room_ids" => params.room_ids.push(value),
                "owner" => params.owner = value,
                "guest_id" => params.guest_id = value,
                "start_time" => params.start_time = Some(value),
                "end_time" => params.end_time = Some(value),
                _ => {}
            }
        }
        params
    }
}

fn present(events: Vec<Event>) -> Vec<EventResponse> {
    events.into_iter().map(mapper::to_response).collect()
}

/// Every event starting in the requested or default window.
pub async fn list_events(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<WindowParams>,
) -> AppResult<Response> {
    let window = state.resolver().resolve(
        params.start_time.as_deref(),
        params.end_time.as_deref(),
        Utc::now(),
    )?;

    let events = state.event_query().list_all(window).await?;
    Ok(success(present(events), "Events retrieved successfully"))
}

pub async fn search_events(
    State(state): State<AppState>,
    QueryParams(pairs): QueryParams<Vec<(String, String)>>,
) -> AppResult<Response> {
    let params = SearchParams::from_pairs(pairs);
    let window = state.resolver().resolve(
        params.start_time.as_deref(),
        params.end_time.as_deref(),
        Utc::now(),
    )?;

    tracing::debug!(
        rooms = params.room_ids.len(),
        owner = %params.owner,
        guest_id = %params.guest_id,
        start = %window.start,
        end = %window.end,
        "Searching events"
    );

    let events = state
        .event_query()
        .query(params.room_ids, params.owner, params.guest_id, window)
        .await?;
    Ok(success(present(events), "Events retrieved successfully"))
}

pub async fn show_event(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Response> {
    let event = state.store().find_event(&id).await?;
    Ok(success(mapper::to_response(event), "Event retrieved successfully"))
}

pub async fn create_event(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EventPayload>,
) -> AppResult<Response> {
    let event = state.store().insert_event(payload.into_new_event()?).await?;
    tracing::info!(event_id = %event.id, location_id = %event.location_id, "Event created");
    Ok(created(
        mapper::to_response(event),
        "Event has been created successfully",
    ))
}

pub async fn update_event(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    JsonBody(payload): JsonBody<EventPayload>,
) -> AppResult<Response> {
    let event = state
        .store()
        .replace_event(&id, payload.into_new_event()?)
        .await?;
    Ok(accepted(
        mapper::to_response(event),
        "Event has been updated successfully",
    ))
}

pub async fn delete_event(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> AppResult<Response> {
    state.store().delete_event(&id).await?;
    tracing::info!(event_id = %id, "Event deleted");
    Ok(empty_success(
        StatusCode::ACCEPTED,
        "Event has been deleted successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_search_params_collect_repeated_rooms() {
        let params = SearchParams::from_pairs(pairs(&[
            ("room_ids[]", "R1"),
            ("owner", "u1"),
            ("room_ids[]", "R2"),
            ("guest_id", "u2"),
            ("start_time", "2024-03-04T00:00:00+07:00"),
            ("page", "3"),
        ]));

        assert_eq!(params.room_ids, vec!["R1", "R2"]);
        assert_eq!(params.owner, "u1");
        assert_eq!(params.guest_id, "u2");
        assert_eq!(params.start_time.as_deref(), Some("2024-03-04T00:00:00+07:00"));
        assert_eq!(params.end_time, None);
    }

    #[test]
    fn test_search_params_default_to_empty() {
        let params = SearchParams::from_pairs(Vec::new());
        assert_eq!(params, SearchParams::default());
    }
}
