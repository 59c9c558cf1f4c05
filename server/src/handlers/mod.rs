use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::state::AppState;
use crate::utils::response::success;

pub mod events;
pub mod rooms;
pub mod venues;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    store: String,
}

pub async fn health_check(State(state): State<AppState>) -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "ivana-api",
        store: state.store().backend().to_string(),
    };

    success(payload, "Health check successful")
}
