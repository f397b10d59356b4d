use crate::server::{
    service::{error::ApiError, state::AppState},
    streaming::{chunked::chunked_body, events::event_stream},
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use carstream::collect_async;

const JSON: &str = "application/json";
const STREAM_JSON: &str = "application/stream+json";
const NDJSON: &str = "application/x-ndjson";
const OCTET_STREAM: &str = "application/octet-stream";
const EVENT_STREAM: &str = "text/event-stream";

/// How a `GET /cars` request wants its cars delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// One JSON array once the stream has ended.
    Batch,
    /// One JSON line per car, sent as it is produced, with the given
    /// content type.
    Chunked(&'static str),
    /// Server-sent events.
    Events,
}

impl DeliveryMode {
    /// Picks a mode from the `Accept` header. Media ranges are tried in the
    /// order the client listed them; quality parameters are ignored.
    ///
    /// A missing or empty header selects [`DeliveryMode::Batch`].
    pub fn negotiate(headers: &HeaderMap) -> Result<Self, ApiError> {
        let Some(accept) = headers.get(header::ACCEPT) else {
            return Ok(Self::Batch);
        };
        let accept = accept.to_str().unwrap_or_default();
        if accept.trim().is_empty() {
            return Ok(Self::Batch);
        }

        accept
            .split(',')
            .filter_map(|range| range.split(';').next())
            .map(|media| media.trim().to_ascii_lowercase())
            .find_map(|media| Self::from_media_type(&media))
            .ok_or_else(|| ApiError::NotAcceptable {
                accept: accept.to_string(),
            })
    }

    fn from_media_type(media: &str) -> Option<Self> {
        match media {
            JSON | "application/*" | "*/*" => Some(Self::Batch),
            STREAM_JSON => Some(Self::Chunked(STREAM_JSON)),
            NDJSON => Some(Self::Chunked(NDJSON)),
            OCTET_STREAM => Some(Self::Chunked(OCTET_STREAM)),
            EVENT_STREAM => Some(Self::Events),
            _ => None,
        }
    }
}

/// `GET /cars`: batch or chunked, depending on `Accept`.
pub async fn get_cars(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    match DeliveryMode::negotiate(&headers)? {
        DeliveryMode::Batch => batch(&state).await,
        DeliveryMode::Chunked(content_type) => chunked(&state, content_type),
        DeliveryMode::Events => events(&state),
    }
}

/// `GET /cars/stream`: always chunked.
pub async fn stream_cars(State(state): State<AppState>) -> Result<Response, ApiError> {
    chunked(&state, STREAM_JSON)
}

/// `GET /cars/sse`
pub async fn sse_cars(State(state): State<AppState>) -> Result<Response, ApiError> {
    events(&state)
}

pub async fn health() -> &'static str {
    "ok"
}

async fn batch(state: &AppState) -> Result<Response, ApiError> {
    let guard = state.tracker.start("batch");
    match collect_async(&state.producer, state.timeout).await {
        Ok(cars) => {
            guard.finish(cars.len(), false);
            Ok(Json(cars).into_response())
        }
        Err(e) => {
            guard.finish(0, true);
            Err(e.into())
        }
    }
}

fn chunked(state: &AppState, content_type: &'static str) -> Result<Response, ApiError> {
    // Once the body starts the status is fixed, so refuse up front.
    if state.producer.shutdown_token().is_cancelled() {
        return Err(carstream::Error::Runtime {
            context: "producer is shut down".into(),
        }
        .into());
    }

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
    ];
    Ok((headers, chunked_body(state)).into_response())
}

fn events(state: &AppState) -> Result<Response, ApiError> {
    Ok(event_stream(state)?.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn missing_accept_means_batch() {
        assert_eq!(
            DeliveryMode::negotiate(&HeaderMap::new()).unwrap(),
            DeliveryMode::Batch
        );
        assert_eq!(
            DeliveryMode::negotiate(&accept("*/*")).unwrap(),
            DeliveryMode::Batch
        );
    }

    #[test]
    fn streaming_media_types_select_chunked() {
        for media in [STREAM_JSON, NDJSON, OCTET_STREAM] {
            assert_eq!(
                DeliveryMode::negotiate(&accept(media)).unwrap(),
                DeliveryMode::Chunked(media)
            );
        }
    }

    #[test]
    fn first_supported_range_wins() {
        assert_eq!(
            DeliveryMode::negotiate(&accept("text/html, application/stream+json;q=0.9, */*"))
                .unwrap(),
            DeliveryMode::Chunked(STREAM_JSON)
        );
        assert_eq!(
            DeliveryMode::negotiate(&accept("Application/JSON; charset=utf-8")).unwrap(),
            DeliveryMode::Batch
        );
        assert_eq!(
            DeliveryMode::negotiate(&accept("text/event-stream")).unwrap(),
            DeliveryMode::Events
        );
    }

    #[test]
    fn unsupported_accept_is_rejected() {
        assert!(matches!(
            DeliveryMode::negotiate(&accept("text/html")),
            Err(ApiError::NotAcceptable { .. })
        ));
    }
}
