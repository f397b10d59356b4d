use crate::server::{
    config::ServerConfig,
    service::{
        handler::{get_cars, health, sse_cars, stream_cars},
        state::AppState,
    },
};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/cars", get(get_cars))
        .route("/cars/stream", get(stream_cars))
        .route("/cars/sse", get(sse_cars))
        .route("/health", get(health))
        .layer(cors_layer(config.allowed_origin.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin without credentials, or exactly `origin` with credentials.
pub fn cors_layer(origin: Option<HeaderValue>) -> CorsLayer {
    match origin {
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
                Method::HEAD,
            ])
            .allow_headers([
                header::ORIGIN,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::AUTHORIZATION,
            ]),
    }
}
