use crate::server::{
    config::ServerConfig,
    service::{router::build_router, state::AppState},
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderValue, Method, Request, StatusCode, header},
};
use carstream::{Car, CarFactory, Producer};
use core::time::Duration;
use tower::ServiceExt;

fn config(max_records: Option<usize>, allowed_origin: Option<HeaderValue>) -> ServerConfig {
    ServerConfig {
        server_addr: "127.0.0.1:0".into(),
        stream_timeout: Duration::from_secs(5),
        emit_interval: Duration::from_millis(1),
        max_records,
        allowed_origin,
        shutdown_timeout: Duration::from_secs(1),
    }
}

fn state(config: &ServerConfig) -> AppState {
    let producer =
        Producer::from_current(CarFactory::new(config.emit_interval, config.max_records)).unwrap();
    AppState::new(producer, config.stream_timeout)
}

fn app() -> Router {
    let config = config(Some(3), None);
    build_router(state(&config), &config)
}

fn get(uri: &str, accept: Option<&'static str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(accept) = accept {
        builder = builder.header(header::ACCEPT, accept);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn ids(cars: &[Car]) -> Vec<u64> {
    cars.iter().map(|car| car.id).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn json_accept_returns_the_whole_batch() {
    let response = app()
        .oneshot(get("/cars", Some("application/json")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cars: Vec<Car> = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(ids(&cars), vec![1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_accept_defaults_to_batch() {
    let response = app().oneshot(get("/cars", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cars: Vec<Car> = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(cars.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stream_accept_returns_json_lines() {
    let response = app()
        .oneshot(get("/cars", Some("application/x-ndjson")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-ndjson"
    );

    let text = body_text(response).await;
    let cars: Vec<Car> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(ids(&cars), vec![1, 2, 3]);
    assert!(text.ends_with('\n'));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stream_route_is_always_chunked() {
    let response = app().oneshot(get("/cars/stream", None)).await.unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/stream+json"
    );
    assert_eq!(body_text(response).await.lines().count(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sse_route_ends_with_done() {
    let response = app().oneshot(get("/cars/sse", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let text = body_text(response).await;
    assert_eq!(text.matches("data: {").count(), 3);
    assert!(text.contains("id: 1"));
    assert!(text.trim_end().ends_with("data: done"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unsupported_accept_is_406() {
    let response = app()
        .oneshot(get("/cars", Some("text/html")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("text/html"));
}

#[tokio::test]
async fn health_is_ok() {
    let response = app().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shut_down_producer_is_503() {
    let config = config(Some(3), None);
    let state = state(&config);
    state.producer.shutdown_token().cancel();
    let app = build_router(state, &config);

    for uri in ["/cars", "/cars/stream", "/cars/sse"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tracker_is_empty_after_batch() {
    let config = config(Some(2), None);
    let state = state(&config);
    let tracker = state.tracker.clone();
    let app = build_router(state, &config);

    let response = app.oneshot(get("/cars", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(tracker.inflight(), 0);
}

fn preflight(origin: &'static str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/cars")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let response = app()
        .oneshot(preflight("http://localhost:8081"))
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn cors_pins_configured_origin() {
    let origin = "http://localhost:8081";
    let config = config(Some(3), Some(HeaderValue::from_static(origin)));
    let app = build_router(state(&config), &config);

    let response = app.oneshot(preflight(origin)).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], origin);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}
