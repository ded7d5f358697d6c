use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use regex::Regex;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::ServerConfig;

/// Request timing middleware
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        duration_ms = elapsed.as_millis(),
        status = response.status().as_u16(),
        "Request processed"
    );

    response
}

/// CORS for the browser front end.
///
/// Listed origins (plus any matching `cors_allow_origin_regex`) may send
/// credentials; a `*` entry opens the API to every origin without credentials.
pub fn create_cors_layer(config: &ServerConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.cors_allow_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any);
    }

    let exact: Vec<HeaderValue> = config
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let pattern = config
        .cors_allow_origin_regex
        .as_deref()
        .and_then(|raw| match Regex::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(pattern = %raw, error = %e, "Ignoring invalid CORS origin pattern");
                None
            }
        });

    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        exact.iter().any(|allowed| allowed == origin)
            || match (&pattern, origin.to_str()) {
                (Some(pattern), Ok(origin)) => pattern.is_match(origin),
                _ => false,
            }
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(methods)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
