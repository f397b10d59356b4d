use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Error returned by handlers before a response body has started.
///
/// Once a chunked or event stream is running, failures can no longer be
/// reported through a status code; they only show up as a truncated stream.
#[derive(Debug)]
pub enum ApiError {
    /// A failure from the streaming bridge.
    Stream(carstream::Error),
    /// No supported representation matches the `Accept` header.
    NotAcceptable { accept: String },
}

impl From<carstream::Error> for ApiError {
    fn from(err: carstream::Error) -> Self {
        Self::Stream(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Stream(err) => {
                let status = match &err {
                    carstream::Error::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
                    carstream::Error::Runtime { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    carstream::Error::Source { .. } | carstream::Error::SubscriptionDropped => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
            Self::NotAcceptable { accept } => (
                StatusCode::NOT_ACCEPTABLE,
                format!("Unsupported Accept header: {accept}"),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {message}");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
