//! Exact-path dispatcher.

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{message, sse, TransportOptions, VaneState};
use crate::ToolHandler;

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    OpenStream,
    SubmitMessage,
    NotFound,
}

/// Classify a request by method and raw path.
///
/// The comparison is exact: case, trailing slashes and percent-encoding all
/// count. A known path with the wrong method is `NotFound`.
pub fn route(options: &TransportOptions, method: &Method, path: &str) -> Route {
    if *method == Method::GET && path == options.stream_path {
        Route::OpenStream
    } else if *method == Method::POST && options.is_message_path(path) {
        Route::SubmitMessage
    } else {
        Route::NotFound
    }
}

/// Fallback handler that owns every request.
pub async fn dispatch<H: ToolHandler>(
    State(state): State<Arc<VaneState<H>>>,
    request: Request,
) -> Response {
    let target = route(&state.options, request.method(), request.uri().path());

    match target {
        Route::OpenStream => sse::open_stream(state).await.into_response(),
        Route::SubmitMessage => {
            let limit = state.options.max_body_bytes;
            match axum::body::to_bytes(request.into_body(), limit).await {
                Ok(body) => message::submit_message(&state, &body),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read message body");
                    (StatusCode::BAD_REQUEST, "Unreadable request body").into_response()
                }
            }
        }
        Route::NotFound => {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                "No endpoint at path"
            );
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}
