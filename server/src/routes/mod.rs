use std::any::Any;

use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

use crate::config::{create_cors_layer, create_media_type_layer, Config};
use crate::handlers::events::{
    create_event, delete_event, list_events, search_events, show_event, update_event,
};
use crate::handlers::health_check;
use crate::handlers::rooms::{create_room, delete_room, list_rooms, show_room, update_room};
use crate::handlers::venues::{
    create_venue, delete_venue, list_venue_rooms, list_venues, show_venue, update_venue,
};
use crate::state::AppState;
use crate::utils::error::AppError;

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::InternalServerError(format!("handler panicked: {detail}")).into_response()
}

pub fn create_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/venues", get(list_venues).post(create_venue))
        .route(
            "/venues/:id",
            get(show_venue)
                .patch(update_venue)
                .put(update_venue)
                .delete(delete_venue),
        )
        .route("/venues/:id/rooms", get(list_venue_rooms))
        .route("/rooms", get(list_rooms).post(create_room))
        .route(
            "/rooms/:id",
            get(show_room)
                .patch(update_room)
                .put(update_room)
                .delete(delete_room),
        )
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:id",
            get(show_event)
                .patch(update_event)
                .put(update_event)
                .delete(delete_event),
        )
        .route("/search-events", get(search_events))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(create_media_type_layer())
        .layer(create_cors_layer(&config.cors_allowed_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::utils::response::API_MEDIA_TYPE;

    async fn error_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_panic_with_str_payload() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            API_MEDIA_TYPE
        );

        let body = error_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
        assert_eq!(body["error"]["message"], "Something went wrong.");
    }

    #[tokio::test]
    async fn test_panic_with_string_payload() {
        let response = handle_panic(Box::new(String::from("index out of bounds")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = error_body(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_SERVER_ERROR");
        assert!(!body.to_string().contains("index out of bounds"));
    }

    async fn explode() -> &'static str {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_panicking_handler_is_recovered() {
        let app: Router = Router::new()
            .route("/boom", get(explode))
            .route("/ok", get(|| async { "ok" }))
            .layer(CatchPanicLayer::custom(handle_panic));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = app
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
