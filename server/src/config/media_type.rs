use axum::extract::Request;
use axum::http::{header, HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::utils::error::AppError;
use crate::utils::response::API_MEDIA_TYPE;

/// Media types a client may ask for or send.
const JSON_MEDIA_TYPES: [&str; 2] = [API_MEDIA_TYPE, "application/json"];
const WILDCARDS: [&str; 2] = ["*/*", "application/*"];

/// Lowercased media type without parameters.
fn essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn has_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Rejects requests whose Accept header excludes JSON, and bodies that are
/// not declared as JSON. A missing Accept header is fine.
pub fn negotiate(method: &Method, headers: &HeaderMap) -> Result<(), AppError> {
    if let Some(accept) = headers.get(header::ACCEPT) {
        let accept = accept.to_str().unwrap_or_default();
        let acceptable = accept
            .split(',')
            .map(essence)
            .any(|range| {
                JSON_MEDIA_TYPES.contains(&range.as_str()) || WILDCARDS.contains(&range.as_str())
            });

        if !acceptable {
            return Err(AppError::NotAcceptable(format!(
                "Accept header must allow '{API_MEDIA_TYPE}'."
            )));
        }
    }

    if has_body(method) {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(essence)
            .unwrap_or_default();

        if !JSON_MEDIA_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::UnsupportedMediaType(format!(
                "Content-Type header must be set to '{API_MEDIA_TYPE}'."
            )));
        }
    }

    Ok(())
}

#[derive(Clone, Default)]
pub struct MediaTypeLayer;

impl MediaTypeLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for MediaTypeLayer {
    type Service = MediaTypeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MediaTypeService { inner }
    }
}

#[derive(Clone)]
pub struct MediaTypeService<S> {
    inner: S,
}

impl<S> Service<Request> for MediaTypeService<S>
where
    S: Service<Request, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = MediaTypeFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        match negotiate(request.method(), request.headers()) {
            Ok(()) => MediaTypeFuture::Forward {
                future: self.inner.call(request),
            },
            Err(rejection) => MediaTypeFuture::Reject {
                response: Some(rejection.into_response()),
            },
        }
    }
}

#[pin_project::pin_project(project = MediaTypeFutureProj)]
pub enum MediaTypeFuture<F> {
    Forward {
        #[pin]
        future: F,
    },
    Reject {
        response: Option<Response>,
    },
}

impl<F, E> Future for MediaTypeFuture<F>
where
    F: Future<Output = Result<Response, E>>,
{
    type Output = Result<Response, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            MediaTypeFutureProj::Forward { future } => future.poll(cx),
            MediaTypeFutureProj::Reject { response } => match response.take() {
                Some(response) => Poll::Ready(Ok(response)),
                None => panic!("MediaTypeFuture polled after completion"),
            },
        }
    }
}

pub fn create_media_type_layer() -> MediaTypeLayer {
    MediaTypeLayer::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_missing_accept_is_allowed() {
        assert!(negotiate(&Method::GET, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_json_accept_variants() {
        for accept in [
            "application/vnd.api+json",
            "application/json",
            "text/html, application/json;q=0.9",
            "*/*",
            "application/*",
        ] {
            let map = headers(&[(header::ACCEPT, accept)]);
            assert!(negotiate(&Method::GET, &map).is_ok(), "{accept} should pass");
        }
    }

    #[test]
    fn test_non_json_accept_is_rejected() {
        let map = headers(&[(header::ACCEPT, "text/html")]);
        assert!(matches!(
            negotiate(&Method::GET, &map),
            Err(AppError::NotAcceptable(_))
        ));
    }

    #[test]
    fn test_body_requires_json_content_type() {
        let missing = HeaderMap::new();
        assert!(matches!(
            negotiate(&Method::POST, &missing),
            Err(AppError::UnsupportedMediaType(_))
        ));

        let form = headers(&[(header::CONTENT_TYPE, "application/x-www-form-urlencoded")]);
        assert!(matches!(
            negotiate(&Method::PATCH, &form),
            Err(AppError::UnsupportedMediaType(_))
        ));

        let json = headers(&[(header::CONTENT_TYPE, "application/vnd.api+json; charset=utf-8")]);
        assert!(negotiate(&Method::PUT, &json).is_ok());
    }

    #[test]
    fn test_bodiless_methods_skip_content_type() {
        assert!(negotiate(&Method::DELETE, &HeaderMap::new()).is_ok());
    }
}
